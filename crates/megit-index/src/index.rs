//! The staging index and its scoped persistence guard.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use megit_store::ObjectStore;
use megit_types::ObjectId;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};

/// The staging area: normalized relative path -> blob id.
///
/// Paths always use `/` as separator and never start with `/` or contain
/// empty, `.` or `..` components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    entries: BTreeMap<String, ObjectId>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> &BTreeMap<String, ObjectId> {
        &self.entries
    }

    /// Stage `id` at `path`, replacing any earlier entry.
    pub fn insert(&mut self, path: &str, id: ObjectId) -> IndexResult<()> {
        if !is_normalized(path) {
            return Err(IndexError::InvalidPath(path.to_string()));
        }
        self.entries.insert(path.to_string(), id);
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<ObjectId> {
        self.entries.remove(path)
    }

    /// Replace the whole mapping, e.g. with a checked-out tree.
    pub fn replace(&mut self, entries: BTreeMap<String, ObjectId>) {
        self.entries = entries;
    }

    /// Build nested tree objects from the staged paths and return the root.
    pub fn write_tree(&self, store: &dyn ObjectStore) -> IndexResult<ObjectId> {
        Ok(megit_store::write_tree(store, &self.entries)?)
    }

    /// Load an index file. A missing file is an empty index.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let index: Self = serde_json::from_slice(&raw)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        if let Some(bad) = index.entries.keys().find(|p| !is_normalized(p)) {
            return Err(IndexError::InvalidPath(bad.clone()));
        }
        Ok(index)
    }

    /// Write the index file through a temp file and rename.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        debug!(entries = self.len(), path = %path.display(), "index saved");
        Ok(())
    }
}

/// Returns `true` if `path` is a relative, `/`-separated path with no empty,
/// `.` or `..` components.
fn is_normalized(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('/')
            .all(|c| !c.is_empty() && c != "." && c != "..")
}

/// A loaded index that is written back when the scope ends.
///
/// Call [`IndexGuard::release`] to persist and observe the result. If the
/// guard is dropped without being released (early return, panic) it still
/// persists, logging any failure.
pub struct IndexGuard {
    path: PathBuf,
    index: Index,
    persisted: bool,
}

impl IndexGuard {
    /// Load the index at `path` (empty if absent) for mutation.
    pub fn acquire(path: &Path) -> IndexResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            index: Index::load(path)?,
            persisted: false,
        })
    }

    /// Persist the index and consume the guard.
    pub fn release(mut self) -> IndexResult<()> {
        self.persisted = true;
        self.index.save(&self.path)
    }
}

impl Deref for IndexGuard {
    type Target = Index;

    fn deref(&self) -> &Index {
        &self.index
    }
}

impl DerefMut for IndexGuard {
    fn deref_mut(&mut self) -> &mut Index {
        &mut self.index
    }
}

impl Drop for IndexGuard {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = self.index.save(&self.path) {
            warn!(error = %e, path = %self.path.display(), "failed to persist index");
        }
    }
}

/// Run `mutate` against the index at `path` and persist it exactly once.
///
/// The index is written even when `mutate` fails, so mutations made before
/// the failure are kept. The mutation's error takes precedence over a
/// persistence error.
pub fn with_index<T, E, F>(path: &Path, mutate: F) -> Result<T, E>
where
    F: FnOnce(&mut Index) -> Result<T, E>,
    E: From<IndexError>,
{
    let mut guard = IndexGuard::acquire(path)?;
    let outcome = mutate(&mut *guard);
    let saved = guard.release();
    let value = outcome?;
    saved?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use megit_store::{get_tree, InMemoryObjectStore, ObjectKind};
    use tempfile::TempDir;

    fn oid(seed: &str) -> ObjectId {
        ObjectId::from_bytes(seed.as_bytes())
    }

    #[test]
    fn insert_rejects_unnormalized_paths() {
        let mut index = Index::new();
        for bad in ["", "/abs", "a//b", "./a", "a/../b", "trailing/"] {
            assert!(
                matches!(index.insert(bad, oid("x")), Err(IndexError::InvalidPath(_))),
                "{bad:?}"
            );
        }
        index.insert("dir/file.txt", oid("x")).unwrap();
        assert_eq!(index.get("dir/file.txt"), Some(&oid("x")));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(Index::load(&dir.path().join("index")).unwrap().is_empty());
    }

    #[test]
    fn save_writes_json_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::new();
        index.insert("a.txt", oid("a")).unwrap();
        index.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["a.txt"], oid("a").to_hex());
        assert_eq!(Index::load(&path).unwrap(), index);
    }

    #[test]
    fn corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Index::load(&path),
            Err(IndexError::Serialization(_))
        ));
    }

    #[test]
    fn with_index_persists_mutations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        with_index(&path, |index| -> IndexResult<()> {
            index.insert("one", oid("1"))?;
            index.insert("two", oid("2"))
        })
        .unwrap();
        assert_eq!(Index::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn with_index_persists_partial_work_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        let result = with_index(&path, |index| -> IndexResult<()> {
            index.insert("kept", oid("1"))?;
            index.insert("../bad", oid("2"))
        });
        assert!(matches!(result, Err(IndexError::InvalidPath(_))));
        let reloaded = Index::load(&path).unwrap();
        assert_eq!(reloaded.get("kept"), Some(&oid("1")));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn dropped_guard_still_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index");
        {
            let mut guard = IndexGuard::acquire(&path).unwrap();
            guard.insert("f", oid("f")).unwrap();
        }
        assert_eq!(Index::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn write_tree_round_trips_through_get_tree() {
        let store = InMemoryObjectStore::new();
        let mut index = Index::new();
        for path in ["a", "b/c", "b/d/e"] {
            let id = store.hash_object(path.as_bytes(), ObjectKind::Blob).unwrap();
            index.insert(path, id).unwrap();
        }
        let root = index.write_tree(&store).unwrap();
        assert_eq!(&get_tree(&store, &root, "").unwrap(), index.entries());
    }
}
