use std::fmt;

use megit_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing of `(kind, oid, name)` entries.
    Tree,
    /// Snapshot pointer: tree id, parents and a message.
    Commit,
}

impl ObjectKind {
    /// The ASCII tag written at the front of the object envelope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse an envelope tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. Its id is the SHA-1 of the envelope
/// `kind ++ NUL ++ data`, so the same payload under two kinds yields two ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectId::from_chunks(&[self.kind.as_str().as_bytes(), b"\0", &self.data])
    }

    /// Serialize into the on-disk envelope.
    pub fn encode(&self) -> Vec<u8> {
        let tag = self.kind.as_str().as_bytes();
        let mut out = Vec::with_capacity(tag.len() + 1 + self.data.len());
        out.extend_from_slice(tag);
        out.push(0);
        out.extend_from_slice(&self.data);
        out
    }

    /// Split an envelope at its first NUL byte.
    ///
    /// `id` is only used to label errors.
    pub fn decode(id: &ObjectId, raw: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id: *id,
            reason: reason.to_string(),
        };
        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing kind separator"))?;
        let tag = std::str::from_utf8(&raw[..nul]).map_err(|_| corrupt("kind tag is not utf-8"))?;
        let kind = ObjectKind::parse(tag).ok_or_else(|| corrupt(&format!("unknown kind {tag:?}")))?;
        Ok(Self::new(kind, raw[nul + 1..].to_vec()))
    }

    /// Fail with `TypeMismatch` unless this object has the `expected` kind.
    pub fn expect_kind(&self, expected: ObjectKind) -> StoreResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(StoreError::TypeMismatch {
                id: self.compute_id(),
                expected,
                actual: self.kind,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw file content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// What a tree entry points at.
///
/// Variant order matches the textual order of the tags, so derived `Ord`
/// sorts entries the same way the encoded lines do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }

    /// The object kind the entry's id is expected to resolve to.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Blob => ObjectKind::Blob,
            Self::Tree => ObjectKind::Tree,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a tree (directory listing).
///
/// Field order gives the derived ordering: name, then id, then kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeEntry {
    pub name: String,
    pub object_id: ObjectId,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn new(kind: EntryKind, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind,
        }
    }

    /// Check that `name` is a single, non-special path component.
    pub fn validate_name(name: &str) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::Integrity("empty tree entry name".into()));
        }
        if name == "." || name == ".." {
            return Err(StoreError::Integrity(format!(
                "reserved tree entry name {name:?}"
            )));
        }
        if name.contains('/') {
            return Err(StoreError::Integrity(format!(
                "tree entry name {name:?} contains a path separator"
            )));
        }
        if name.contains('\n') || name.contains('\0') {
            return Err(StoreError::Integrity(format!(
                "tree entry name {name:?} contains a control byte"
            )));
        }
        Ok(())
    }
}

/// Directory listing. Entries are kept sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree, sorting entries into canonical order.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Render the payload: one `"<kind> <oid> <name>\n"` line per entry.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut out = String::new();
        for entry in &self.entries {
            TreeEntry::validate_name(&entry.name)?;
            out.push_str(entry.kind.as_str());
            out.push(' ');
            out.push_str(&entry.object_id.to_hex());
            out.push(' ');
            out.push_str(&entry.name);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Tree, self.encode()?))
    }

    /// Parse a tree payload. Entries keep their stored order.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let text = std::str::from_utf8(&obj.data)
            .map_err(|_| StoreError::Integrity("tree payload is not utf-8".into()))?;

        let mut entries = Vec::new();
        for line in text.split_terminator('\n') {
            let mut parts = line.splitn(3, ' ');
            let (Some(tag), Some(hex), Some(name)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(StoreError::Integrity(format!(
                    "malformed tree entry {line:?}"
                )));
            };
            let kind = EntryKind::parse(tag).ok_or_else(|| {
                StoreError::Integrity(format!("unknown tree entry type {tag:?}"))
            })?;
            let object_id = ObjectId::from_hex(hex).map_err(|e| {
                StoreError::Integrity(format!("bad object id in tree entry {line:?}: {e}"))
            })?;
            TreeEntry::validate_name(name)?;
            entries.push(TreeEntry::new(kind, name, object_id));
        }
        Ok(Self { entries })
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit: root tree, ordered parents and a free-form message.
///
/// There are no author, committer or timestamp headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
}

impl Commit {
    pub fn new(tree: ObjectId, parents: Vec<ObjectId>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parents,
            message: message.into(),
        }
    }

    /// The first parent, if any.
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    /// Render the payload: headers, a blank line, then the message.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Commit, self.encode())
    }

    /// Parse a commit payload.
    ///
    /// Headers run up to the first blank line. Every remaining line belongs
    /// to the message.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        let text = std::str::from_utf8(&obj.data)
            .map_err(|_| StoreError::Integrity("commit payload is not utf-8".into()))?;

        let mut lines = text.lines();
        let mut tree = None;
        let mut parents = Vec::new();
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            let (key, value) = line.split_once(' ').ok_or_else(|| {
                StoreError::Integrity(format!("malformed commit header {line:?}"))
            })?;
            let id = || {
                ObjectId::from_hex(value).map_err(|e| {
                    StoreError::Integrity(format!("bad object id in commit header {line:?}: {e}"))
                })
            };
            match key {
                "tree" => tree = Some(id()?),
                "parent" => parents.push(id()?),
                other => {
                    return Err(StoreError::Integrity(format!(
                        "unknown commit field {other:?}"
                    )))
                }
            }
        }
        let tree =
            tree.ok_or_else(|| StoreError::Integrity("commit has no tree header".into()))?;
        let message = lines.collect::<Vec<_>>().join("\n");
        Ok(Self {
            tree,
            parents,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    // -----------------------------------------------------------------------
    // Envelope
    // -----------------------------------------------------------------------

    #[test]
    fn id_covers_kind_and_payload() {
        let blob = StoredObject::new(ObjectKind::Blob, b"same".to_vec());
        let tree = StoredObject::new(ObjectKind::Tree, b"same".to_vec());
        assert_ne!(blob.compute_id(), tree.compute_id());
        assert_eq!(blob.compute_id(), ObjectId::from_bytes(b"blob\0same"));
    }

    #[test]
    fn empty_blob_id_is_hash_of_bare_tag() {
        let obj = StoredObject::new(ObjectKind::Blob, Vec::new());
        assert_eq!(obj.compute_id(), ObjectId::from_bytes(b"blob\0"));
    }

    #[test]
    fn envelope_decode_splits_at_first_nul() {
        let obj = StoredObject::new(ObjectKind::Blob, b"a\0b".to_vec());
        let raw = obj.encode();
        assert_eq!(raw, b"blob\0a\0b");
        let decoded = StoredObject::decode(&obj.compute_id(), &raw).unwrap();
        assert_eq!(decoded, obj);
    }

    #[test]
    fn envelope_decode_rejects_unknown_kind() {
        let id = oid(b"x");
        let err = StoredObject::decode(&id, b"tag\0data").unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
        let err = StoredObject::decode(&id, b"no separator").unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn size_is_cached() {
        let obj = StoredObject::new(ObjectKind::Blob, vec![0; 42]);
        assert_eq!(obj.size, 42);
    }

    #[test]
    fn blob_rejects_other_kinds() {
        let tree = Tree::default().to_stored_object().unwrap();
        let err = Blob::from_stored_object(&tree).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TypeMismatch {
                expected: ObjectKind::Blob,
                actual: ObjectKind::Tree,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Tree
    // -----------------------------------------------------------------------

    #[test]
    fn tree_entries_sorted_by_name() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryKind::Blob, "z.txt", oid(b"z")),
            TreeEntry::new(EntryKind::Tree, "a", oid(b"a")),
            TreeEntry::new(EntryKind::Blob, "m.txt", oid(b"m")),
        ]);
        let names: Vec<&str> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "m.txt", "z.txt"]);
    }

    #[test]
    fn tree_payload_format() {
        let id = oid(b"content");
        let tree = Tree::new(vec![TreeEntry::new(EntryKind::Blob, "hello world.txt", id)]);
        let payload = String::from_utf8(tree.encode().unwrap()).unwrap();
        assert_eq!(payload, format!("blob {id} hello world.txt\n"));
    }

    #[test]
    fn tree_decode_keeps_spaces_in_names() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryKind::Blob, "with space", oid(b"1")),
            TreeEntry::new(EntryKind::Tree, "dir", oid(b"2")),
        ]);
        let decoded = Tree::from_stored_object(&tree.to_stored_object().unwrap()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn empty_tree_has_empty_payload() {
        let obj = Tree::default().to_stored_object().unwrap();
        assert!(obj.data.is_empty());
        assert!(Tree::from_stored_object(&obj).unwrap().is_empty());
    }

    #[test]
    fn tree_rejects_bad_names() {
        for name in ["", ".", "..", "a/b"] {
            let tree = Tree {
                entries: vec![TreeEntry::new(EntryKind::Blob, name, oid(b"x"))],
            };
            assert!(matches!(tree.encode(), Err(StoreError::Integrity(_))), "{name:?}");
        }
    }

    #[test]
    fn tree_decode_rejects_malformed_lines() {
        let id = oid(b"x");
        let cases = [
            "blob onlytwo\n".to_string(),
            format!("link {id} name\n"),
            "blob nothex name\n".to_string(),
            format!("blob {id} ..\n"),
        ];
        for payload in cases {
            let obj = StoredObject::new(ObjectKind::Tree, payload.clone().into_bytes());
            assert!(
                matches!(Tree::from_stored_object(&obj), Err(StoreError::Integrity(_))),
                "{payload:?}"
            );
        }
    }

    #[test]
    fn tree_lookup_by_name() {
        let tree = Tree::new(vec![TreeEntry::new(EntryKind::Blob, "a", oid(b"a"))]);
        assert!(tree.get("a").is_some());
        assert!(tree.get("b").is_none());
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    #[test]
    fn commit_payload_format() {
        let tree = oid(b"tree");
        let p1 = oid(b"p1");
        let p2 = oid(b"p2");
        let commit = Commit::new(tree, vec![p1, p2], "merge things");
        let payload = String::from_utf8(commit.encode()).unwrap();
        assert_eq!(
            payload,
            format!("tree {tree}\nparent {p1}\nparent {p2}\n\nmerge things\n")
        );
    }

    #[test]
    fn commit_roundtrip_preserves_parent_order() {
        let commit = Commit::new(oid(b"t"), vec![oid(b"b"), oid(b"a")], "two\nlines");
        let decoded = Commit::from_stored_object(&commit.to_stored_object()).unwrap();
        assert_eq!(decoded, commit);
        assert_eq!(decoded.first_parent(), Some(&oid(b"b")));
    }

    #[test]
    fn commit_empty_message_roundtrip() {
        let commit = Commit::new(oid(b"t"), vec![], "");
        let decoded = Commit::from_stored_object(&commit.to_stored_object()).unwrap();
        assert_eq!(decoded.message, "");
        assert!(decoded.parents.is_empty());
    }

    #[test]
    fn commit_unknown_header_is_integrity_error() {
        let payload = format!("tree {}\nauthor someone\n\nmsg\n", oid(b"t"));
        let obj = StoredObject::new(ObjectKind::Commit, payload.into_bytes());
        assert!(matches!(
            Commit::from_stored_object(&obj),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn commit_without_tree_is_integrity_error() {
        let payload = format!("parent {}\n\nmsg\n", oid(b"p"));
        let obj = StoredObject::new(ObjectKind::Commit, payload.into_bytes());
        assert!(matches!(
            Commit::from_stored_object(&obj),
            Err(StoreError::Integrity(_))
        ));
    }
}
