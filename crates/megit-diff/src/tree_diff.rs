//! Path-level diff between two snapshots.
//!
//! Snapshots are compared in their flattened `path -> blob id` form, so a
//! change deep inside a subtree shows up as one change to one path.

use std::collections::BTreeMap;

use megit_store::{get_tree, ObjectStore};
use megit_types::ObjectId;

use crate::error::DiffResult;

/// The result of comparing two snapshots. Changes are sorted by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDiff {
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Changed paths, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(TreeChange::path)
    }
}

/// A single changed path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeChange {
    Added {
        path: String,
        new_id: ObjectId,
    },
    Deleted {
        path: String,
        old_id: ObjectId,
    },
    Modified {
        path: String,
        old_id: ObjectId,
        new_id: ObjectId,
    },
}

impl TreeChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Deleted { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }

    /// Blob id before the change, if the path existed.
    pub fn old_id(&self) -> Option<ObjectId> {
        match self {
            Self::Added { .. } => None,
            Self::Deleted { old_id, .. } | Self::Modified { old_id, .. } => Some(*old_id),
        }
    }

    /// Blob id after the change, if the path still exists.
    pub fn new_id(&self) -> Option<ObjectId> {
        match self {
            Self::Deleted { .. } => None,
            Self::Added { new_id, .. } | Self::Modified { new_id, .. } => Some(*new_id),
        }
    }

    /// One-letter status code, as shown by `status` and `diff --stat` style output.
    pub fn code(&self) -> char {
        match self {
            Self::Added { .. } => 'A',
            Self::Deleted { .. } => 'D',
            Self::Modified { .. } => 'M',
        }
    }
}

/// Compare two flat path maps.
pub fn diff_path_maps(
    old: &BTreeMap<String, ObjectId>,
    new: &BTreeMap<String, ObjectId>,
) -> TreeDiff {
    let mut changes = Vec::new();
    for (path, old_id) in old {
        match new.get(path) {
            Some(new_id) if new_id != old_id => changes.push(TreeChange::Modified {
                path: path.clone(),
                old_id: *old_id,
                new_id: *new_id,
            }),
            Some(_) => {}
            None => changes.push(TreeChange::Deleted {
                path: path.clone(),
                old_id: *old_id,
            }),
        }
    }
    for (path, new_id) in new {
        if !old.contains_key(path) {
            changes.push(TreeChange::Added {
                path: path.clone(),
                new_id: *new_id,
            });
        }
    }
    changes.sort_by(|a, b| a.path().cmp(b.path()));
    TreeDiff { changes }
}

/// Compare two trees read from `store`. `None` stands for the empty tree.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
) -> DiffResult<TreeDiff> {
    let flatten = |tree: Option<&ObjectId>| -> DiffResult<BTreeMap<String, ObjectId>> {
        match tree {
            Some(id) => Ok(get_tree(store, id, "")?),
            None => Ok(BTreeMap::new()),
        }
    };
    Ok(diff_path_maps(&flatten(old_tree)?, &flatten(new_tree)?))
}
