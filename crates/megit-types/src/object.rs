use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Number of hex characters in a rendered [`ObjectId`].
pub const OID_HEX_LEN: usize = 40;

const OID_LEN: usize = 20;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectId` is the SHA-1 digest of an object's envelope. Identical
/// content always produces the same `ObjectId`, so objects deduplicate and
/// can be verified on read.
///
/// The hex form is always 40 lowercase characters; name resolution relies on
/// that width to tell a raw id apart from a ref name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    /// Compute an `ObjectId` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_chunks(&[data])
    }

    /// Compute an `ObjectId` over several byte slices as if concatenated.
    pub fn from_chunks(chunks: &[&[u8]]) -> Self {
        let mut hasher = Sha1::new();
        for chunk in chunks {
            hasher.update(chunk);
        }
        let digest = hasher.finalize();
        let mut arr = [0u8; OID_LEN];
        arr.copy_from_slice(&digest);
        Self(arr)
    }

    /// Create an `ObjectId` from a pre-computed digest.
    pub fn from_hash(hash: [u8; OID_LEN]) -> Self {
        Self(hash)
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Hex-encoded string representation (40 lowercase characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 10 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..5])
    }

    /// Parse from a 40-character hex string. Upper-case digits are accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != OID_LEN {
            return Err(TypeError::InvalidLength {
                expected: OID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// Returns `true` if `s` has the exact shape of a rendered object id.
pub fn is_full_hex_oid(s: &str) -> bool {
    s.len() == OID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; OID_LEN]> for ObjectId {
    fn from(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }
}

// Serialized as the hex string so persisted maps stay human-readable.
impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
