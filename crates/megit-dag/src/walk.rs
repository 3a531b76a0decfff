//! History walk in first-parent-first order.

use std::collections::{HashSet, VecDeque};

use megit_store::{Commit, ObjectStore};
use megit_types::ObjectId;
use tracing::trace;

use crate::error::DagResult;

/// Lazy walk over commits reachable from a set of seeds.
///
/// Each visited commit's first parent is scheduled ahead of all queued
/// work and its other parents go to the back of the queue. The result reads
/// like a log: mainline first, merged branches later. It is not a strict
/// topological order.
///
/// Absent seeds (`None`) and already-visited ids are skipped. The walk stops
/// after the first error.
pub struct CommitWalk<'a> {
    store: &'a dyn ObjectStore,
    queue: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
    failed: bool,
}

impl<'a> CommitWalk<'a> {
    pub fn new<I>(store: &'a dyn ObjectStore, seeds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<ObjectId>>,
    {
        Self {
            store,
            queue: seeds.into_iter().filter_map(Into::into).collect(),
            visited: HashSet::new(),
            failed: false,
        }
    }

    /// Ids seen so far.
    pub fn visited(&self) -> &HashSet<ObjectId> {
        &self.visited
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = DagResult<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(id) = self.queue.pop_front() {
            if !self.visited.insert(id) {
                continue;
            }
            let commit = match self.store.read_commit(&id) {
                Ok(commit) => commit,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            };
            if let Some((first, rest)) = commit.parents.split_first() {
                self.queue.push_front(*first);
                self.queue.extend(rest.iter().copied());
            }
            trace!(%id, parents = commit.parents.len(), "walked commit");
            return Some(Ok((id, commit)));
        }
        None
    }
}

/// Commit ids reachable from `seeds`, in [`CommitWalk`] order.
pub fn iter_commits_and_parents<'a, I>(
    store: &'a dyn ObjectStore,
    seeds: I,
) -> impl Iterator<Item = DagResult<ObjectId>> + 'a
where
    I: IntoIterator,
    I::Item: Into<Option<ObjectId>>,
{
    CommitWalk::new(store, seeds).map(|step| step.map(|(id, _)| id))
}
