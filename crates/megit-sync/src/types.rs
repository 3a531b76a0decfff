use megit_refs::RefStore;
use megit_store::ObjectStore;
use megit_types::ObjectId;
use serde::{Deserialize, Serialize};

/// One side of a transfer: an object store and the refs that name into it.
#[derive(Clone, Copy)]
pub struct Endpoint<'a> {
    pub objects: &'a dyn ObjectStore,
    pub refs: &'a dyn RefStore,
}

impl<'a> Endpoint<'a> {
    pub fn new(objects: &'a dyn ObjectStore, refs: &'a dyn RefStore) -> Self {
        Self { objects, refs }
    }
}

/// A ref moved by a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    pub name: String,
    pub old: Option<ObjectId>,
    pub new: ObjectId,
}

impl RefUpdate {
    /// Returns `true` if the ref already pointed at `new`.
    pub fn is_noop(&self) -> bool {
        self.old == Some(self.new)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Objects copied into the local store.
    pub objects_received: usize,
    /// Tracking refs written, one per remote branch.
    pub refs_updated: Vec<RefUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushResult {
    /// Objects copied into the remote store.
    pub objects_sent: usize,
    pub ref_update: RefUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_result_defaults() {
        let f = FetchResult::default();
        assert_eq!(f.objects_received, 0);
        assert!(f.refs_updated.is_empty());
    }

    #[test]
    fn ref_update_noop() {
        let id = ObjectId::from_bytes(b"tip");
        let update = RefUpdate {
            name: "refs/heads/main".into(),
            old: Some(id),
            new: id,
        };
        assert!(update.is_noop());
        assert!(!RefUpdate { old: None, ..update }.is_noop());
    }
}
