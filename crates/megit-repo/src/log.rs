//! History listing decorated with ref names.

use std::collections::HashMap;

use megit_dag::CommitWalk;
use megit_store::Commit;
use megit_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

/// One commit in a [`Log`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub oid: ObjectId,
    pub commit: Commit,
    /// Names of the refs pointing at this commit, after dereferencing.
    pub refs: Vec<String>,
}

/// Lazy history walk returned by [`Repository::log`].
pub struct Log<'a> {
    walk: CommitWalk<'a>,
    refs: HashMap<ObjectId, Vec<String>>,
}

impl Iterator for Log<'_> {
    type Item = RepoResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.walk.next()?;
        Some(step.map_err(RepoError::from).map(|(oid, commit)| LogEntry {
            oid,
            commit,
            refs: self.refs.get(&oid).cloned().unwrap_or_default(),
        }))
    }
}

impl Repository {
    /// Walk history from `seeds` in first-parent-first order.
    ///
    /// Ref names are captured when the walk starts.
    pub fn log<I>(&self, seeds: I) -> RepoResult<Log<'_>>
    where
        I: IntoIterator,
        I::Item: Into<Option<ObjectId>>,
    {
        let mut refs: HashMap<ObjectId, Vec<String>> = HashMap::new();
        for item in self.iter_refs("", true)? {
            let (name, value) = item?;
            if let Some(id) = value.oid() {
                refs.entry(id).or_default().push(name);
            }
        }
        Ok(Log {
            walk: CommitWalk::new(self.objects(), seeds),
            refs,
        })
    }
}
