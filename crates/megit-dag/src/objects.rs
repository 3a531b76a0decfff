//! Enumeration of every object reachable from a set of commits.

use std::collections::HashSet;

use megit_store::{EntryKind, ObjectStore};
use megit_types::ObjectId;

use crate::error::DagResult;
use crate::walk::CommitWalk;

/// Lazy walk over commits and everything their trees reference.
///
/// For each commit in [`CommitWalk`] order, yields the commit id, then its
/// root tree and, depth first, every subtree and blob below it. Each id is
/// yielded at most once across the whole walk, and a tree that was already
/// seen is not descended into again.
///
/// Blobs are never read, so a walk over a partially copied store only needs
/// commits and trees to be present.
pub struct ObjectWalk<'a> {
    store: &'a dyn ObjectStore,
    commits: CommitWalk<'a>,
    pending: Vec<(ObjectId, EntryKind)>,
    seen: HashSet<ObjectId>,
    failed: bool,
}

impl<'a> ObjectWalk<'a> {
    pub fn new<I>(store: &'a dyn ObjectStore, seeds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<ObjectId>>,
    {
        Self {
            store,
            commits: CommitWalk::new(store, seeds),
            pending: Vec::new(),
            seen: HashSet::new(),
            failed: false,
        }
    }
}

impl Iterator for ObjectWalk<'_> {
    type Item = DagResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((id, kind)) = self.pending.pop() {
                if !self.seen.insert(id) {
                    continue;
                }
                if kind == EntryKind::Tree {
                    match self.store.read_tree(&id) {
                        Ok(tree) => self
                            .pending
                            .extend(tree.entries.iter().rev().map(|e| (e.object_id, e.kind))),
                        Err(e) => {
                            self.failed = true;
                            return Some(Err(e.into()));
                        }
                    }
                }
                return Some(Ok(id));
            }

            match self.commits.next()? {
                Ok((id, commit)) => {
                    self.pending.push((commit.tree, EntryKind::Tree));
                    if self.seen.insert(id) {
                        return Some(Ok(id));
                    }
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Ids of every object reachable from `seeds`, in [`ObjectWalk`] order.
pub fn iter_objects_in_commits<'a, I>(store: &'a dyn ObjectStore, seeds: I) -> ObjectWalk<'a>
where
    I: IntoIterator,
    I::Item: Into<Option<ObjectId>>,
{
    ObjectWalk::new(store, seeds)
}
