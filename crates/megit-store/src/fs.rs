use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use megit_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Filesystem object store: one file per object at `<metadata>/objects/<oid>`.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so a reader never sees a half-written object.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    objects_dir: PathBuf,
}

impl FileObjectStore {
    /// Open the store under an existing metadata directory.
    pub fn open(metadata_dir: &Path) -> Self {
        Self {
            objects_dir: metadata_dir.join("objects"),
        }
    }

    /// Open the store, creating `objects/` if needed.
    pub fn init(metadata_dir: &Path) -> StoreResult<Self> {
        let store = Self::open(metadata_dir);
        fs::create_dir_all(&store.objects_dir)?;
        Ok(store)
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir.join(id.to_hex())
    }
}

impl ObjectStore for FileObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let raw = match fs::read(self.object_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let obj = StoredObject::decode(id, &raw)?;
        if obj.compute_id() != *id {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: "content does not hash to its id".into(),
            });
        }
        Ok(Some(obj))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.is_file() {
            debug!(%id, "object already stored");
            return Ok(id);
        }
        fs::create_dir_all(&self.objects_dir)?;
        let mut tmp = NamedTempFile::new_in(&self.objects_dir)?;
        tmp.write_all(&object.encode())?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(%id, kind = %object.kind, size = object.size, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}
