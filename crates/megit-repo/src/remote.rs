//! Fetch and push against another repository on the local filesystem.

use std::path::Path;

use megit_refs::branch_ref;
use megit_sync::{fetch, push, FetchResult, PushResult};

use crate::error::RepoResult;
use crate::repository::Repository;

impl Repository {
    /// Copy every branch of the repository at `remote_root` into this one,
    /// recording each under `refs/remote/<remote_name>/<branch>`.
    pub fn fetch(&self, remote_root: impl AsRef<Path>, remote_name: &str) -> RepoResult<FetchResult> {
        let remote = Repository::open(remote_root)?;
        Ok(fetch(self.endpoint(), remote.endpoint(), remote_name)?)
    }

    /// Publish a local ref to the repository at `remote_root`.
    ///
    /// `name` is a full ref name or a branch name. The remote ref may only
    /// move forward.
    pub fn push(&self, remote_root: impl AsRef<Path>, name: &str) -> RepoResult<PushResult> {
        let remote = Repository::open(remote_root)?;
        let refname = if name.starts_with("refs/") {
            name.to_string()
        } else {
            branch_ref(name)
        };
        Ok(push(self.endpoint(), remote.endpoint(), &refname)?)
    }
}
