use megit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, ObjectKind, StoredObject, Tree};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; an existing id is never rewritten.
/// - The id returned by `write` is the SHA-1 of the object's envelope.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Store `data` as an object of `kind` and return its id.
    fn hash_object(&self, data: &[u8], kind: ObjectKind) -> StoreResult<ObjectId> {
        self.write(&StoredObject::new(kind, data.to_vec()))
    }

    /// Read an object's payload, optionally checking its kind.
    fn get_object(&self, id: &ObjectId, expected: Option<ObjectKind>) -> StoreResult<Vec<u8>> {
        let obj = self.require(id)?;
        if let Some(kind) = expected {
            obj.expect_kind(kind)?;
        }
        Ok(obj.data)
    }

    /// Like `exists`, but a backend failure reads as absent.
    fn object_exists(&self, id: &ObjectId) -> bool {
        self.exists(id).unwrap_or(false)
    }

    /// Read an object, failing with `NotFound` when it is absent.
    fn require(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        Tree::from_stored_object(&self.require(id)?)
    }

    fn read_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        Commit::from_stored_object(&self.require(id)?)
    }

    fn write_tree_object(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    fn write_commit(&self, commit: &Commit) -> StoreResult<ObjectId> {
        self.write(&commit.to_stored_object())
    }
}
