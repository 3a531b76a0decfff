//! The [`RefStore`] trait defining the reference storage interface.

use crate::error::RefResult;
use crate::types::RefValue;

/// Storage backend for named references.
///
/// Backends only store and fetch single values; symbolic resolution lives in
/// [`crate::resolve`]. The namespace follows git's layout:
///
/// - `HEAD` and `MERGE_HEAD` at the top level
/// - `refs/heads/*` for branches
/// - `refs/tags/*` for tags
/// - `refs/remote/{remote}/*` for fetched remote branches
pub trait RefStore: Send + Sync {
    /// Read one ref without following symbolic values.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<RefValue>>;

    /// Write (create or overwrite) a single ref.
    fn write_ref(&self, name: &str, value: &RefValue) -> RefResult<()>;

    /// Remove a single ref. Returns `Ok(true)` if it existed.
    fn remove_ref(&self, name: &str) -> RefResult<bool>;

    /// Names of every ref stored under `refs/`, sorted.
    fn ref_names(&self) -> RefResult<Vec<String>>;
}
