//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{RefError, RefResult};
use crate::names::is_safe_ref_name;
use crate::traits::RefStore;
use crate::types::RefValue;

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, RefValue>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<RefValue>> {
        let refs = self.refs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(refs.get(name).cloned())
    }

    fn write_ref(&self, name: &str, value: &RefValue) -> RefResult<()> {
        if !is_safe_ref_name(name) {
            return Err(RefError::InvalidName {
                name: name.to_string(),
            });
        }
        let mut refs = self.refs.write().unwrap_or_else(PoisonError::into_inner);
        refs.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove_ref(&self, name: &str) -> RefResult<bool> {
        let mut refs = self.refs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(refs.remove(name).is_some())
    }

    fn ref_names(&self) -> RefResult<Vec<String>> {
        let refs = self.refs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(refs
            .keys()
            .filter(|name| name.starts_with("refs/"))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use megit_types::ObjectId;

    #[test]
    fn write_read_remove() {
        let store = InMemoryRefStore::new();
        let value = RefValue::Direct(ObjectId::from_bytes(b"c"));
        store.write_ref("refs/heads/main", &value).unwrap();
        assert_eq!(store.read_ref("refs/heads/main").unwrap(), Some(value));
        assert!(store.remove_ref("refs/heads/main").unwrap());
        assert!(!store.remove_ref("refs/heads/main").unwrap());
        assert_eq!(store.read_ref("refs/heads/main").unwrap(), None);
    }

    #[test]
    fn ref_names_exclude_top_level() {
        let store = InMemoryRefStore::new();
        let value = RefValue::Direct(ObjectId::from_bytes(b"c"));
        store.write_ref("HEAD", &value).unwrap();
        store.write_ref("refs/tags/v1", &value).unwrap();
        store.write_ref("refs/heads/main", &value).unwrap();
        assert_eq!(
            store.ref_names().unwrap(),
            ["refs/heads/main", "refs/tags/v1"]
        );
    }

    #[test]
    fn rejects_unsafe_names() {
        let store = InMemoryRefStore::new();
        let value = RefValue::Symbolic("x".into());
        assert!(matches!(
            store.write_ref("../x", &value),
            Err(RefError::InvalidName { .. })
        ));
    }
}
