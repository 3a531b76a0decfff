//! Working directory status: HEAD vs index vs working tree.

use std::collections::BTreeMap;

use megit_diff::{diff_path_maps, TreeChange};
use megit_types::ObjectId;
use serde::{Deserialize, Serialize};

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    New,
    Modified,
    Deleted,
}

impl From<&TreeChange> for FileStatus {
    fn from(change: &TreeChange) -> Self {
        match change {
            TreeChange::Added { .. } => Self::New,
            TreeChange::Modified { .. } => Self::Modified,
            TreeChange::Deleted { .. } => Self::Deleted,
        }
    }
}

/// A single changed path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Complete status of the working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Index differs from the HEAD snapshot.
    pub staged: Vec<StatusEntry>,
    /// Working tree differs from the index for a tracked path.
    pub unstaged: Vec<StatusEntry>,
    /// Files present in the working tree but not in the index.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// Compare the three snapshots. All paths come out sorted.
pub fn compute_status(
    head: &BTreeMap<String, ObjectId>,
    index: &BTreeMap<String, ObjectId>,
    working: &BTreeMap<String, ObjectId>,
) -> WorkdirStatus {
    let staged = diff_path_maps(head, index)
        .changes
        .iter()
        .map(|c| StatusEntry::new(c.path(), c.into()))
        .collect();

    let mut unstaged = Vec::new();
    let mut untracked = Vec::new();
    for change in diff_path_maps(index, working).changes {
        match change {
            TreeChange::Added { path, .. } => untracked.push(path),
            other => unstaged.push(StatusEntry::new(other.path(), (&other).into())),
        }
    }

    WorkdirStatus {
        staged,
        unstaged,
        untracked,
    }
}
