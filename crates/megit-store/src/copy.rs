use megit_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Copy one object from `source` into `dest`.
///
/// Returns `false` without touching `dest` when it already holds the id.
pub fn copy_object(
    id: &ObjectId,
    source: &dyn ObjectStore,
    dest: &dyn ObjectStore,
) -> StoreResult<bool> {
    if dest.exists(id)? {
        return Ok(false);
    }
    let obj = source.read(id)?.ok_or(StoreError::NotFound(*id))?;
    dest.write(&obj)?;
    debug!(%id, kind = %obj.kind, "object copied");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;
    use crate::object::ObjectKind;

    #[test]
    fn copies_missing_object() {
        let src = InMemoryObjectStore::new();
        let dst = InMemoryObjectStore::new();
        let id = src.hash_object(b"x", ObjectKind::Blob).unwrap();

        assert!(copy_object(&id, &src, &dst).unwrap());
        assert_eq!(dst.read(&id).unwrap(), src.read(&id).unwrap());
    }

    #[test]
    fn skips_existing_object() {
        let src = InMemoryObjectStore::new();
        let dst = InMemoryObjectStore::new();
        let id = src.hash_object(b"x", ObjectKind::Blob).unwrap();
        dst.hash_object(b"x", ObjectKind::Blob).unwrap();

        assert!(!copy_object(&id, &src, &dst).unwrap());
        assert_eq!(dst.len(), 1);
    }

    #[test]
    fn missing_in_source_is_not_found() {
        let src = InMemoryObjectStore::new();
        let dst = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"nowhere");
        assert!(matches!(
            copy_object(&id, &src, &dst),
            Err(StoreError::NotFound(_))
        ));
    }
}
