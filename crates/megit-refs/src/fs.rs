//! Filesystem reference store: one small text file per ref.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RefError, RefResult};
use crate::names::{is_safe_ref_name, HEAD, MERGE_HEAD};
use crate::traits::RefStore;
use crate::types::RefValue;

/// Refs stored as files below a metadata directory, e.g.
/// `<metadata>/HEAD` and `<metadata>/refs/heads/main`.
///
/// Only `HEAD`, `MERGE_HEAD` and names under `refs/` map to files. Other
/// names, including ones that would escape the metadata directory, read as
/// absent and are rejected on write, so the index or config never parse as
/// refs.
#[derive(Debug, Clone)]
pub struct FileRefStore {
    root: PathBuf,
}

impl FileRefStore {
    pub fn open(metadata_dir: &Path) -> Self {
        Self {
            root: metadata_dir.to_path_buf(),
        }
    }

    /// Open the store, creating the `refs/heads` and `refs/tags` directories.
    pub fn init(metadata_dir: &Path) -> RefResult<Self> {
        let store = Self::open(metadata_dir);
        fs::create_dir_all(store.root.join("refs").join("heads"))?;
        fs::create_dir_all(store.root.join("refs").join("tags"))?;
        Ok(store)
    }

    fn ref_path(&self, name: &str) -> Option<PathBuf> {
        let in_namespace = name == HEAD || name == MERGE_HEAD || name.starts_with("refs/");
        (in_namespace && is_safe_ref_name(name)).then(|| self.root.join(name))
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<RefValue>> {
        let Some(path) = self.ref_path(name) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        RefValue::parse(&content).map_err(|content| RefError::Malformed {
            name: name.to_string(),
            content,
        })
    }

    fn write_ref(&self, name: &str, value: &RefValue) -> RefResult<()> {
        let path = self.ref_path(name).ok_or_else(|| RefError::InvalidName {
            name: name.to_string(),
        })?;
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(value.encode().as_bytes())?;
        tmp.persist(&path).map_err(|e| RefError::Io(e.error))?;
        debug!(name, %value, "ref written");
        Ok(())
    }

    fn remove_ref(&self, name: &str) -> RefResult<bool> {
        let Some(path) = self.ref_path(name) else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(name, "ref removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ref_names(&self) -> RefResult<Vec<String>> {
        let refs_dir = self.root.join("refs");
        if !refs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&refs_dir).follow_links(false) {
            let entry = entry.map_err(|e| RefError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Leftover temp files from an interrupted write.
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            names.push(name.join("/"));
        }
        names.sort();
        Ok(names)
    }
}
