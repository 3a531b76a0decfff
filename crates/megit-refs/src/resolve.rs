//! Symbolic resolution, updates, iteration and name lookup over any
//! [`RefStore`].

use megit_types::{is_full_hex_oid, ObjectId};
use tracing::debug;

use crate::error::{RefError, RefResult};
use crate::names::{HEAD, MERGE_HEAD};
use crate::traits::RefStore;
use crate::types::RefValue;

/// Maximum number of symbolic hops followed before giving up.
pub const MAX_SYMREF_DEPTH: usize = 16;

/// Follow `name` to the location a read or write should act on.
///
/// With `deref`, symbolic values are followed until a direct value or an
/// absent ref is reached. Without it, only `name` itself is read. Returns
/// the final ref name together with its value.
pub fn resolve_ref(
    store: &dyn RefStore,
    name: &str,
    deref: bool,
) -> RefResult<(String, Option<RefValue>)> {
    let mut current = name.to_string();
    for _ in 0..=MAX_SYMREF_DEPTH {
        match store.read_ref(&current)? {
            Some(RefValue::Symbolic(target)) if deref => current = target,
            value => return Ok((current, value)),
        }
    }
    Err(RefError::SymrefLoop {
        name: name.to_string(),
    })
}

/// Read a ref's value, following symbolic chains when `deref` is set.
pub fn get_ref(store: &dyn RefStore, name: &str, deref: bool) -> RefResult<Option<RefValue>> {
    Ok(resolve_ref(store, name, deref)?.1)
}

/// Write `value` at `name`, or at the end of its symbolic chain with `deref`.
///
/// Pointing `HEAD` at a branch must use `deref = false`, otherwise the write
/// lands on the branch HEAD currently names.
pub fn update_ref(
    store: &dyn RefStore,
    name: &str,
    value: &RefValue,
    deref: bool,
) -> RefResult<()> {
    if let RefValue::Symbolic(target) = value {
        if target.trim().is_empty() {
            return Err(RefError::EmptyValue {
                name: name.to_string(),
            });
        }
    }
    let (target, _) = resolve_ref(store, name, deref)?;
    debug!(name, target = %target, %value, "updating ref");
    store.write_ref(&target, value)
}

/// Remove `name`, or the end of its symbolic chain with `deref`.
pub fn delete_ref(store: &dyn RefStore, name: &str, deref: bool) -> RefResult<bool> {
    let (target, _) = resolve_ref(store, name, deref)?;
    store.remove_ref(&target)
}

/// Lazy iterator over `(name, value)` pairs produced by [`iter_refs`].
///
/// Candidates are `HEAD`, `MERGE_HEAD` and every ref under `refs/`. Each is
/// resolved only when reached, and candidates without a value are skipped.
pub struct RefIter<'a> {
    store: &'a dyn RefStore,
    candidates: std::vec::IntoIter<String>,
    deref: bool,
}

impl Iterator for RefIter<'_> {
    type Item = RefResult<(String, RefValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        for name in self.candidates.by_ref() {
            match get_ref(self.store, &name, self.deref) {
                Ok(Some(value)) => return Some(Ok((name, value))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Iterate refs whose name starts with `prefix`.
pub fn iter_refs<'a>(store: &'a dyn RefStore, prefix: &str, deref: bool) -> RefResult<RefIter<'a>> {
    let mut candidates = vec![HEAD.to_string(), MERGE_HEAD.to_string()];
    candidates.extend(store.ref_names()?);
    candidates.retain(|name| name.starts_with(prefix));
    Ok(RefIter {
        store,
        candidates: candidates.into_iter(),
        deref,
    })
}

/// Resolve a user-supplied name to an object id.
///
/// `@` is an alias for `HEAD`. The name is tried literally, then under
/// `refs/`, `refs/tags/` and `refs/heads/`; the first that resolves to an id
/// wins. Failing that, a 40-character hex string is taken as a raw id.
pub fn get_oid(store: &dyn RefStore, name: &str) -> RefResult<ObjectId> {
    let name = if name == "@" { HEAD } else { name };
    let candidates = [
        name.to_string(),
        format!("refs/{name}"),
        format!("refs/tags/{name}"),
        format!("refs/heads/{name}"),
    ];
    for candidate in &candidates {
        if let Some(RefValue::Direct(id)) = get_ref(store, candidate, true)? {
            return Ok(id);
        }
    }
    if is_full_hex_oid(name) {
        if let Ok(id) = ObjectId::from_hex(name) {
            return Ok(id);
        }
    }
    Err(RefError::InvalidReference {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRefStore;

    fn oid(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    fn sym(name: &str) -> RefValue {
        RefValue::Symbolic(name.to_string())
    }

    /// HEAD -> refs/heads/main -> X
    fn repo_with_main(x: ObjectId) -> InMemoryRefStore {
        let store = InMemoryRefStore::new();
        store.write_ref("HEAD", &sym("refs/heads/main")).unwrap();
        store
            .write_ref("refs/heads/main", &RefValue::Direct(x))
            .unwrap();
        store
    }

    // -----------------------------------------------------------------------
    // get_ref / update_ref / delete_ref
    // -----------------------------------------------------------------------

    #[test]
    fn deref_follows_symbolic_chain() {
        let x = oid(b"x");
        let store = repo_with_main(x);
        assert_eq!(get_ref(&store, "HEAD", true).unwrap(), Some(RefValue::Direct(x)));
        assert_eq!(
            get_ref(&store, "HEAD", false).unwrap(),
            Some(sym("refs/heads/main"))
        );
    }

    #[test]
    fn dangling_symbolic_resolves_to_absent_target() {
        let store = InMemoryRefStore::new();
        store.write_ref("HEAD", &sym("refs/heads/main")).unwrap();
        let (name, value) = resolve_ref(&store, "HEAD", true).unwrap();
        assert_eq!(name, "refs/heads/main");
        assert_eq!(value, None);
    }

    #[test]
    fn update_through_head_moves_branch() {
        let store = repo_with_main(oid(b"x"));
        let y = oid(b"y");
        update_ref(&store, "HEAD", &RefValue::Direct(y), true).unwrap();
        assert_eq!(store.read_ref("refs/heads/main").unwrap(), Some(RefValue::Direct(y)));
        assert_eq!(store.read_ref("HEAD").unwrap(), Some(sym("refs/heads/main")));
    }

    #[test]
    fn update_without_deref_rewrites_head() {
        let store = repo_with_main(oid(b"x"));
        update_ref(&store, "HEAD", &sym("refs/heads/dev"), false).unwrap();
        assert_eq!(store.read_ref("HEAD").unwrap(), Some(sym("refs/heads/dev")));
        assert!(store.read_ref("refs/heads/main").unwrap().is_some());
    }

    #[test]
    fn update_rejects_empty_symbolic_target() {
        let store = InMemoryRefStore::new();
        assert!(matches!(
            update_ref(&store, "HEAD", &sym(" "), false),
            Err(RefError::EmptyValue { .. })
        ));
    }

    #[test]
    fn delete_follows_chain_when_asked() {
        let store = repo_with_main(oid(b"x"));
        assert!(delete_ref(&store, "HEAD", true).unwrap());
        assert!(store.read_ref("refs/heads/main").unwrap().is_none());
        assert!(store.read_ref("HEAD").unwrap().is_some());
        assert!(!delete_ref(&store, "MERGE_HEAD", true).unwrap());
    }

    #[test]
    fn symbolic_cycle_is_detected() {
        let store = InMemoryRefStore::new();
        store.write_ref("refs/heads/a", &sym("refs/heads/b")).unwrap();
        store.write_ref("refs/heads/b", &sym("refs/heads/a")).unwrap();
        assert!(matches!(
            get_ref(&store, "refs/heads/a", true),
            Err(RefError::SymrefLoop { .. })
        ));
        // One level still works.
        assert_eq!(
            get_ref(&store, "refs/heads/a", false).unwrap(),
            Some(sym("refs/heads/b"))
        );
    }

    // -----------------------------------------------------------------------
    // iter_refs
    // -----------------------------------------------------------------------

    fn collect(store: &InMemoryRefStore, prefix: &str, deref: bool) -> Vec<(String, RefValue)> {
        iter_refs(store, prefix, deref)
            .unwrap()
            .collect::<RefResult<_>>()
            .unwrap()
    }

    #[test]
    fn merge_head_only_listed_while_set() {
        let x = oid(b"x");
        let store = repo_with_main(x);
        let names: Vec<String> = collect(&store, "", true).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["HEAD", "refs/heads/main"]);

        store.write_ref("MERGE_HEAD", &RefValue::Direct(oid(b"m"))).unwrap();
        let names: Vec<String> = collect(&store, "", true).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["HEAD", "MERGE_HEAD", "refs/heads/main"]);
    }

    #[test]
    fn unborn_head_is_skipped_with_deref() {
        let store = InMemoryRefStore::new();
        store.write_ref("HEAD", &sym("refs/heads/main")).unwrap();
        assert!(collect(&store, "", true).is_empty());
        assert_eq!(collect(&store, "", false), [("HEAD".to_string(), sym("refs/heads/main"))]);
    }

    #[test]
    fn prefix_filters_names() {
        let x = oid(b"x");
        let store = repo_with_main(x);
        store.write_ref("refs/tags/v1", &RefValue::Direct(x)).unwrap();
        let refs = collect(&store, "refs/tags/", true);
        assert_eq!(refs, [("refs/tags/v1".to_string(), RefValue::Direct(x))]);
    }

    // -----------------------------------------------------------------------
    // get_oid
    // -----------------------------------------------------------------------

    #[test]
    fn get_oid_search_order() {
        let store = InMemoryRefStore::new();
        let tag = oid(b"tag");
        let branch = oid(b"branch");
        store.write_ref("refs/tags/v1", &RefValue::Direct(tag)).unwrap();
        store.write_ref("refs/heads/v1", &RefValue::Direct(branch)).unwrap();
        store.write_ref("refs/heads/dev", &RefValue::Direct(branch)).unwrap();

        assert_eq!(get_oid(&store, "v1").unwrap(), tag);
        assert_eq!(get_oid(&store, "dev").unwrap(), branch);
        assert_eq!(get_oid(&store, "heads/dev").unwrap(), branch);
        assert_eq!(get_oid(&store, "refs/heads/v1").unwrap(), branch);
    }

    #[test]
    fn at_sign_is_head() {
        let x = oid(b"x");
        let store = repo_with_main(x);
        assert_eq!(get_oid(&store, "@").unwrap(), x);
        assert_eq!(get_oid(&store, "HEAD").unwrap(), x);
    }

    #[test]
    fn raw_hex_fallback() {
        let store = InMemoryRefStore::new();
        let x = oid(b"anything");
        assert_eq!(get_oid(&store, &x.to_hex()).unwrap(), x);
    }

    #[test]
    fn unknown_names_are_invalid_references() {
        let store = InMemoryRefStore::new();
        let not_hex = "g".repeat(40);
        for name in ["nope", not_hex.as_str(), "abc123"] {
            assert!(
                matches!(get_oid(&store, name), Err(RefError::InvalidReference { .. })),
                "{name}"
            );
        }
    }
}
