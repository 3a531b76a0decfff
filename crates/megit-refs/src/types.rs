use std::fmt;

use megit_types::{is_full_hex_oid, ObjectId};

/// The value held by a ref: another ref's name, or an object id.
///
/// An absent ref is represented by `Option::None` wherever a `RefValue` is
/// returned.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RefValue {
    /// Indirection to another ref, e.g. `HEAD -> refs/heads/main`.
    Symbolic(String),
    /// Raw object id.
    Direct(ObjectId),
}

impl RefValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    /// The object id, if this is a direct ref.
    pub fn oid(&self) -> Option<ObjectId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Symbolic(_) => None,
        }
    }

    /// The target name, if this is a symbolic ref.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Symbolic(name) => Some(name),
            Self::Direct(_) => None,
        }
    }

    /// Render as ref file content.
    pub fn encode(&self) -> String {
        match self {
            Self::Symbolic(name) => format!("ref: {name}\n"),
            Self::Direct(id) => format!("{id}\n"),
        }
    }

    /// Parse ref file content. Surrounding whitespace is ignored.
    ///
    /// Blank content reads as absent. Anything else that is neither
    /// `ref: <name>` nor a 40-hex id yields `Err` with the trimmed content.
    pub fn parse(content: &str) -> Result<Option<Self>, String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if let Some(target) = trimmed.strip_prefix("ref:") {
            let target = target.trim();
            if target.is_empty() {
                return Err(trimmed.to_string());
            }
            return Ok(Some(Self::Symbolic(target.to_string())));
        }
        if is_full_hex_oid(trimmed) {
            return ObjectId::from_hex(trimmed)
                .map(|id| Some(Self::Direct(id)))
                .map_err(|_| trimmed.to_string());
        }
        Err(trimmed.to_string())
    }
}

impl fmt::Display for RefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbolic(name) => write!(f, "ref: {name}"),
            Self::Direct(id) => write!(f, "{id}"),
        }
    }
}

impl From<ObjectId> for RefValue {
    fn from(id: ObjectId) -> Self {
        Self::Direct(id)
    }
}
