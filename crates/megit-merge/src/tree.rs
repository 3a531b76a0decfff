//! Per-path three-way merge of snapshots.

use std::collections::{BTreeMap, BTreeSet};

use megit_store::{get_tree, ObjectKind, ObjectStore};
use megit_types::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MergeResult;
use crate::text::{merge_text, ConflictLabels};

/// Why a path needs manual attention after a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Both sides edited overlapping lines. The file holds conflict markers.
    Content,
    /// One side deleted the file, the other modified it. The modified
    /// version is kept.
    ModifyDelete,
    /// Both sides changed a non-UTF-8 file differently. Ours is kept.
    Binary,
    /// One side has a file where the other has a directory. Our side is
    /// kept and the other side's path is dropped.
    FileDirectory,
}

/// A path that merged with a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub path: String,
    pub kind: ConflictKind,
}

/// The outcome of a tree merge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedTree {
    /// Every surviving file, `path -> blob id`. Content produced by a text
    /// merge has been written to the store as a new blob.
    pub files: BTreeMap<String, ObjectId>,
    /// Conflicted paths, sorted.
    pub conflicts: Vec<MergeConflict>,
}

impl MergedTree {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Merge the snapshots `ours` and `theirs` against `base`.
///
/// A missing `base` (unrelated histories) merges against an empty tree.
pub fn merge_trees(
    store: &dyn ObjectStore,
    base: Option<&ObjectId>,
    ours: &ObjectId,
    theirs: &ObjectId,
    labels: &ConflictLabels,
) -> MergeResult<MergedTree> {
    let base = match base {
        Some(id) => get_tree(store, id, "")?,
        None => BTreeMap::new(),
    };
    let ours = get_tree(store, ours, "")?;
    let theirs = get_tree(store, theirs, "")?;
    merge_path_maps(store, &base, &ours, &theirs, labels)
}

/// Merge three flattened snapshots path by path.
///
/// For each path in any of the three maps:
/// - both sides agree: take it (this covers deletion on both sides)
/// - one side still matches the base: take the other side
/// - both changed it differently: merge contents, see [`ConflictKind`]
///
/// The result never holds both a file `p` and a path under `p/`.
pub fn merge_path_maps(
    store: &dyn ObjectStore,
    base: &BTreeMap<String, ObjectId>,
    ours: &BTreeMap<String, ObjectId>,
    theirs: &BTreeMap<String, ObjectId>,
    labels: &ConflictLabels,
) -> MergeResult<MergedTree> {
    let paths: BTreeSet<&String> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();
    let mut merged = MergedTree::default();

    for path in paths {
        let (b, o, t) = (base.get(path), ours.get(path), theirs.get(path));
        let (resolved, conflict) = match (o, t) {
            _ if o == t || t == b => (o.copied(), None),
            _ if o == b => (t.copied(), None),
            (Some(o), Some(t)) => {
                let (id, conflict) = merge_blobs(store, b, o, t, labels)?;
                (Some(id), conflict)
            }
            (Some(kept), None) | (None, Some(kept)) => {
                (Some(*kept), Some(ConflictKind::ModifyDelete))
            }
            (None, None) => (None, None),
        };
        if let Some(kind) = conflict {
            warn!(%path, ?kind, "merge conflict");
            merged.conflicts.push(MergeConflict {
                path: path.clone(),
                kind,
            });
        }
        if let Some(id) = resolved {
            merged.files.insert(path.clone(), id);
        }
    }
    drop_file_directory_collisions(ours, &mut merged);

    debug!(
        files = merged.files.len(),
        conflicts = merged.conflicts.len(),
        "trees merged"
    );
    Ok(merged)
}

/// Whether `path` shares a file/directory prefix with another file in
/// `files`.
fn collides(files: &BTreeMap<String, ObjectId>, path: &str) -> bool {
    let under = format!("{path}/");
    let has_children = files
        .range(under.clone()..)
        .next()
        .is_some_and(|(other, _)| other.starts_with(&under));
    has_children
        || path
            .match_indices('/')
            .any(|(i, _)| files.contains_key(&path[..i]))
}

// Ours is a valid tree, so of any two colliding paths at most one is absent
// from it. That one is dropped.
fn drop_file_directory_collisions(ours: &BTreeMap<String, ObjectId>, merged: &mut MergedTree) {
    let dropped: Vec<String> = merged
        .files
        .keys()
        .filter(|path| !ours.contains_key(*path) && collides(&merged.files, path))
        .cloned()
        .collect();
    if dropped.is_empty() {
        return;
    }
    for path in dropped {
        merged.files.remove(&path);
        merged.conflicts.retain(|c| c.path != path);
        warn!(%path, "file/directory conflict, keeping ours");
        merged.conflicts.push(MergeConflict {
            path,
            kind: ConflictKind::FileDirectory,
        });
    }
    merged.conflicts.sort_by(|a, b| a.path.cmp(&b.path));
}

fn merge_blobs(
    store: &dyn ObjectStore,
    base: Option<&ObjectId>,
    ours: &ObjectId,
    theirs: &ObjectId,
    labels: &ConflictLabels,
) -> MergeResult<(ObjectId, Option<ConflictKind>)> {
    let base_data = match base {
        Some(id) => store.get_object(id, Some(ObjectKind::Blob))?,
        None => Vec::new(),
    };
    let ours_data = store.get_object(ours, Some(ObjectKind::Blob))?;
    let theirs_data = store.get_object(theirs, Some(ObjectKind::Blob))?;

    match (
        std::str::from_utf8(&base_data),
        std::str::from_utf8(&ours_data),
        std::str::from_utf8(&theirs_data),
    ) {
        (Ok(b), Ok(o), Ok(t)) => {
            let text = merge_text(b, o, t, labels);
            let id = store.hash_object(text.content.as_bytes(), ObjectKind::Blob)?;
            Ok((id, (!text.is_clean()).then_some(ConflictKind::Content)))
        }
        _ => Ok((*ours, Some(ConflictKind::Binary))),
    }
}
