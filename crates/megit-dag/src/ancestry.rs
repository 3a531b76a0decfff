//! Ancestry queries over the commit graph.

use std::collections::HashSet;

use megit_store::ObjectStore;
use megit_types::ObjectId;
use tracing::debug;

use crate::error::DagResult;
use crate::walk::iter_commits_and_parents;

/// Every commit reachable from `id`, including `id` itself.
pub fn ancestors(store: &dyn ObjectStore, id: ObjectId) -> DagResult<HashSet<ObjectId>> {
    iter_commits_and_parents(store, [id]).collect()
}

/// A common ancestor of `a` and `b`, or `None` if the histories are disjoint.
///
/// Collects all ancestors of `a`, then returns the first commit in `b`'s
/// walk order that is among them. With criss-cross merges this is *a*
/// common ancestor, not necessarily the unique lowest one.
pub fn merge_base(
    store: &dyn ObjectStore,
    a: ObjectId,
    b: ObjectId,
) -> DagResult<Option<ObjectId>> {
    let of_a = ancestors(store, a)?;
    for id in iter_commits_and_parents(store, [b]) {
        let id = id?;
        if of_a.contains(&id) {
            debug!(%a, %b, base = %id, "merge base found");
            return Ok(Some(id));
        }
    }
    debug!(%a, %b, "no common history");
    Ok(None)
}

/// Returns `true` if `maybe_ancestor` is reachable from `commit`. A commit
/// counts as its own ancestor.
pub fn is_ancestor_of(
    store: &dyn ObjectStore,
    commit: ObjectId,
    maybe_ancestor: ObjectId,
) -> DagResult<bool> {
    for id in iter_commits_and_parents(store, [commit]) {
        if id? == maybe_ancestor {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::tests::commit;
    use megit_store::InMemoryObjectStore;

    #[test]
    fn ancestors_include_self() {
        let store = InMemoryObjectStore::new();
        let a = commit(&store, "a", &[]);
        let b = commit(&store, "b", &[a]);
        let set = ancestors(&store, b).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a) && set.contains(&b));
    }

    #[test]
    fn base_of_diverged_branches() {
        let store = InMemoryObjectStore::new();
        let a = commit(&store, "a", &[]);
        let b = commit(&store, "b", &[a]);
        let c = commit(&store, "c", &[a]);
        assert_eq!(merge_base(&store, b, c).unwrap(), Some(a));
        assert_eq!(merge_base(&store, c, b).unwrap(), Some(a));
    }

    #[test]
    fn base_with_ancestor_is_the_ancestor() {
        let store = InMemoryObjectStore::new();
        let a = commit(&store, "a", &[]);
        let b = commit(&store, "b", &[a]);
        assert_eq!(merge_base(&store, b, a).unwrap(), Some(a));
        assert_eq!(merge_base(&store, a, b).unwrap(), Some(a));
        assert_eq!(merge_base(&store, b, b).unwrap(), Some(b));
    }

    #[test]
    fn disjoint_histories_have_no_base() {
        let store = InMemoryObjectStore::new();
        let a = commit(&store, "a", &[]);
        let z = commit(&store, "z", &[]);
        assert_eq!(merge_base(&store, a, z).unwrap(), None);
    }

    #[test]
    fn ancestry_direction() {
        let store = InMemoryObjectStore::new();
        let a = commit(&store, "a", &[]);
        let b = commit(&store, "b", &[a]);
        assert!(is_ancestor_of(&store, b, a).unwrap());
        assert!(!is_ancestor_of(&store, a, b).unwrap());
        assert!(is_ancestor_of(&store, a, a).unwrap());
    }
}
