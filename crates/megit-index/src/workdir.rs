//! Working-tree access: the ignore predicate, hashing walks, and clearing
//! and repopulating the directory from a snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use megit_store::{get_tree, ObjectKind, ObjectStore, StoreError, StoredObject};
use megit_types::ObjectId;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{IndexError, IndexResult};
use crate::index::Index;

/// Name of the private metadata directory at the working-tree root.
pub const METADATA_DIR: &str = ".megit";

/// A working directory rooted at `root`.
#[derive(Debug, Clone)]
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A path is ignored iff it lives under the metadata directory.
    pub fn is_ignored(rel_path: &str) -> bool {
        rel_path.split('/').next() == Some(METADATA_DIR)
    }

    /// Normalize `path` to a `/`-separated path relative to the root.
    ///
    /// Relative inputs are taken relative to the root. Returns `None` for the
    /// root itself and for paths that escape it.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };
        let mut parts: Vec<String> = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop()?;
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn entry_rel(&self, entry: &DirEntry) -> Option<String> {
        self.relative(entry.path())
    }

    fn not_ignored(&self, entry: &DirEntry) -> bool {
        self.entry_rel(entry)
            .map_or(true, |rel| !Self::is_ignored(&rel))
    }

    /// Every non-ignored regular file below `dir`, as `(relative path, absolute path)`.
    fn files_under(&self, dir: &Path) -> IndexResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.not_ignored(e));
        for entry in walker {
            let entry = entry.map_err(|e| IndexError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = self.entry_rel(&entry) {
                files.push((rel, entry.into_path()));
            }
        }
        Ok(files)
    }

    /// Hash every non-ignored regular file without storing anything.
    pub fn working_tree(&self) -> IndexResult<BTreeMap<String, ObjectId>> {
        let mut tree = BTreeMap::new();
        for (rel, abs) in self.files_under(&self.root)? {
            let data = fs::read(&abs)?;
            tree.insert(rel, StoredObject::new(ObjectKind::Blob, data).compute_id());
        }
        Ok(tree)
    }

    /// Stage files and directories into `index`, storing their blobs.
    ///
    /// Directories are walked recursively. Ignored paths and paths that are
    /// not regular files are skipped. Returns the number of files staged.
    pub fn add(
        &self,
        store: &dyn ObjectStore,
        index: &mut Index,
        paths: &[PathBuf],
    ) -> IndexResult<usize> {
        let mut staged = 0;
        for path in paths {
            let abs = if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            };
            if abs.is_file() {
                let rel = self
                    .relative(&abs)
                    .ok_or_else(|| IndexError::OutsideWorkdir(path.clone()))?;
                if Self::is_ignored(&rel) {
                    continue;
                }
                staged += self.stage_file(store, index, &rel, &abs)?;
            } else if abs.is_dir() {
                if let Some(rel) = self.relative(&abs) {
                    if Self::is_ignored(&rel) {
                        continue;
                    }
                } else if !abs.starts_with(&self.root) {
                    return Err(IndexError::OutsideWorkdir(path.clone()));
                }
                for (rel, file) in self.files_under(&abs)? {
                    staged += self.stage_file(store, index, &rel, &file)?;
                }
            } else {
                debug!(path = %path.display(), "skipping non-file path");
            }
        }
        Ok(staged)
    }

    fn stage_file(
        &self,
        store: &dyn ObjectStore,
        index: &mut Index,
        rel: &str,
        abs: &Path,
    ) -> IndexResult<usize> {
        let data = fs::read(abs)?;
        let id = store.hash_object(&data, ObjectKind::Blob)?;
        index.insert(rel, id)?;
        debug!(path = rel, %id, "staged");
        Ok(1)
    }

    /// Remove every non-ignored file, then every directory left empty.
    ///
    /// Directory removal failures are tolerated: a directory may still hold
    /// ignored content or may have been removed concurrently.
    pub fn empty(&self) -> IndexResult<()> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.not_ignored(e));
        let mut dirs = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| IndexError::Io(e.into()))?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        // Parents precede children in walk order, so reverse is bottom-up.
        for dir in dirs.iter().rev() {
            if let Err(e) = fs::remove_dir(dir) {
                debug!(path = %dir.display(), error = %e, "keeping directory");
            }
        }
        Ok(())
    }

    /// Write each blob in `files` to its path, creating parent directories.
    pub fn write_files(
        &self,
        store: &dyn ObjectStore,
        files: &BTreeMap<String, ObjectId>,
    ) -> IndexResult<()> {
        for (rel, id) in files {
            let data = store.get_object(id, Some(ObjectKind::Blob))?;
            self.write_file(rel, &data)?;
        }
        Ok(())
    }

    /// Write raw contents to a relative path, creating parent directories.
    pub fn write_file(&self, rel: &str, data: &[u8]) -> IndexResult<()> {
        if Self::is_ignored(rel) || self.relative(Path::new(rel)).as_deref() != Some(rel) {
            return Err(IndexError::InvalidPath(rel.to_string()));
        }
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    /// Replace the working tree with the snapshot `tree_id`.
    ///
    /// The tree is fully decoded and every blob checked for presence before
    /// anything on disk is touched. Returns the flattened snapshot.
    pub fn read_tree(
        &self,
        store: &dyn ObjectStore,
        tree_id: &ObjectId,
    ) -> IndexResult<BTreeMap<String, ObjectId>> {
        let files = get_tree(store, tree_id, "")?;
        if let Some((_, missing)) = files.iter().find(|(_, id)| !store.object_exists(id)) {
            return Err(StoreError::NotFound(*missing).into());
        }
        self.empty()?;
        self.write_files(store, &files)?;
        info!(tree = %tree_id, files = files.len(), "working tree replaced");
        Ok(files)
    }
}
