//! Conversions between flat path maps and nested tree objects.

use std::collections::BTreeMap;

use megit_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{EntryKind, Tree, TreeEntry};
use crate::traits::ObjectStore;

enum Node {
    File(ObjectId),
    Dir(BTreeMap<String, Node>),
}

/// Write the nested trees for a flat `path -> blob id` map and return the
/// root tree id.
///
/// Paths use `/` as separator. A path that is both a file and a directory
/// prefix of another path is an integrity error. An empty map yields the
/// empty tree.
pub fn write_tree<'a, I>(store: &dyn ObjectStore, files: I) -> StoreResult<ObjectId>
where
    I: IntoIterator<Item = (&'a String, &'a ObjectId)>,
{
    let mut root = BTreeMap::new();
    for (path, id) in files {
        insert_path(&mut root, path, *id)?;
    }
    write_dir(store, &root)
}

fn insert_path(root: &mut BTreeMap<String, Node>, path: &str, id: ObjectId) -> StoreResult<()> {
    let components: Vec<&str> = path.split('/').collect();
    let Some((file_name, dirs)) = components.split_last() else {
        return Err(StoreError::Integrity("empty path".into()));
    };

    let mut dir = root;
    for component in dirs {
        TreeEntry::validate_name(component)?;
        let node = dir
            .entry((*component).to_string())
            .or_insert_with(|| Node::Dir(BTreeMap::new()));
        dir = match node {
            Node::Dir(children) => children,
            Node::File(_) => {
                return Err(StoreError::Integrity(format!(
                    "path {path:?} runs through file {component:?}"
                )))
            }
        };
    }

    TreeEntry::validate_name(file_name)?;
    if let Some(Node::Dir(_)) = dir.get(*file_name) {
        return Err(StoreError::Integrity(format!(
            "path {path:?} is also a directory"
        )));
    }
    dir.insert((*file_name).to_string(), Node::File(id));
    Ok(())
}

fn write_dir(store: &dyn ObjectStore, dir: &BTreeMap<String, Node>) -> StoreResult<ObjectId> {
    let mut entries = Vec::with_capacity(dir.len());
    for (name, node) in dir {
        let entry = match node {
            Node::File(id) => TreeEntry::new(EntryKind::Blob, name.clone(), *id),
            Node::Dir(children) => {
                TreeEntry::new(EntryKind::Tree, name.clone(), write_dir(store, children)?)
            }
        };
        entries.push(entry);
    }
    let id = store.write_tree_object(&Tree::new(entries))?;
    debug!(%id, entries = dir.len(), "tree written");
    Ok(id)
}

/// One entry produced by [`TreeWalk`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeWalkEntry {
    /// Slash-joined path relative to the walk's base.
    pub path: String,
    pub kind: EntryKind,
    pub object_id: ObjectId,
}

/// Lazy depth-first walk over a tree and all its subtrees.
///
/// Subtree entries are yielded before their contents. Each tree is read
/// from the store only when the walk reaches it. The walk stops after the
/// first error.
pub struct TreeWalk<'a> {
    store: &'a dyn ObjectStore,
    root: Option<(ObjectId, String)>,
    stack: Vec<(String, std::vec::IntoIter<TreeEntry>)>,
    failed: bool,
}

impl<'a> TreeWalk<'a> {
    /// Walk the tree `root`, prefixing every path with `base`.
    ///
    /// A non-empty `base` is joined to entry names with `/`.
    pub fn new(store: &'a dyn ObjectStore, root: ObjectId, base: &str) -> Self {
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("{}/", base.trim_end_matches('/'))
        };
        Self {
            store,
            root: Some((root, prefix)),
            stack: Vec::new(),
            failed: false,
        }
    }
}

impl Iterator for TreeWalk<'_> {
    type Item = StoreResult<TreeWalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some((id, prefix)) = self.root.take() {
            match self.store.read_tree(&id) {
                Ok(tree) => self.stack.push((prefix, tree.entries.into_iter())),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        loop {
            let (prefix, entry) = {
                let (prefix, entries) = self.stack.last_mut()?;
                match entries.next() {
                    Some(entry) => (prefix.clone(), entry),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            };

            let path = format!("{prefix}{}", entry.name);
            if entry.kind == EntryKind::Tree {
                match self.store.read_tree(&entry.object_id) {
                    Ok(tree) => self
                        .stack
                        .push((format!("{path}/"), tree.entries.into_iter())),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            }
            return Some(Ok(TreeWalkEntry {
                path,
                kind: entry.kind,
                object_id: entry.object_id,
            }));
        }
    }
}

/// Flatten a tree into `path -> blob id`, with every path under `base`.
pub fn get_tree(
    store: &dyn ObjectStore,
    root: &ObjectId,
    base: &str,
) -> StoreResult<BTreeMap<String, ObjectId>> {
    let mut files = BTreeMap::new();
    for entry in TreeWalk::new(store, *root, base) {
        let entry = entry?;
        if entry.kind == EntryKind::Blob {
            files.insert(entry.path, entry.object_id);
        }
    }
    Ok(files)
}
