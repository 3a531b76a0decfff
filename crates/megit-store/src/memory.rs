use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use megit_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are cloned on read and write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::{Blob, Commit, EntryKind, ObjectKind, Tree, TreeEntry};
    use proptest::prelude::*;

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = Blob::new(b"hello world".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn read_nonexistent_returns_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_bytes(b"nope")).unwrap().is_none());
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let a = store.hash_object(b"same", ObjectKind::Blob).unwrap();
        let b = store.hash_object(b"same", ObjectKind::Blob).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_object_checks_kind() {
        let store = InMemoryObjectStore::new();
        let id = store.hash_object(b"data", ObjectKind::Blob).unwrap();
        assert_eq!(store.get_object(&id, None).unwrap(), b"data");
        assert_eq!(store.get_object(&id, Some(ObjectKind::Blob)).unwrap(), b"data");
        assert!(matches!(
            store.get_object(&id, Some(ObjectKind::Tree)),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn get_object_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"ghost");
        assert!(matches!(
            store.get_object(&id, None),
            Err(StoreError::NotFound(missing)) if missing == id
        ));
        assert!(!store.object_exists(&id));
    }

    #[test]
    fn typed_helpers_roundtrip() {
        let store = InMemoryObjectStore::new();
        let blob = store.hash_object(b"x", ObjectKind::Blob).unwrap();
        let tree = Tree::new(vec![TreeEntry::new(EntryKind::Blob, "x", blob)]);
        let tree_id = store.write_tree_object(&tree).unwrap();
        let commit = Commit::new(tree_id, vec![], "init");
        let commit_id = store.write_commit(&commit).unwrap();

        assert_eq!(store.read_tree(&tree_id).unwrap(), tree);
        assert_eq!(store.read_commit(&commit_id).unwrap(), commit);
        assert_eq!(store.all_ids().len(), 3);
    }

    proptest! {
        #[test]
        fn ids_depend_only_on_kind_and_payload(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            kind in prop_oneof![
                Just(ObjectKind::Blob),
                Just(ObjectKind::Tree),
                Just(ObjectKind::Commit),
            ],
        ) {
            let (first, second) = (InMemoryObjectStore::new(), InMemoryObjectStore::new());
            let id = first.hash_object(&data, kind).unwrap();
            prop_assert_eq!(first.hash_object(&data, kind).unwrap(), id);
            prop_assert_eq!(second.hash_object(&data, kind).unwrap(), id);
            prop_assert_eq!(first.len(), 1);

            let envelope = [kind.as_str().as_bytes(), b"\0".as_slice(), data.as_slice()].concat();
            prop_assert_eq!(id, ObjectId::from_bytes(&envelope));

            prop_assert_eq!(first.get_object(&id, None).unwrap(), data.clone());
            prop_assert_eq!(first.get_object(&id, Some(kind)).unwrap(), data);
            prop_assert_eq!(first.read(&id).unwrap().map(|obj| obj.kind), Some(kind));
        }
    }
}
