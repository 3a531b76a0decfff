//! Foundation types for megit.
//!
//! Every other megit crate depends on `megit-types`. It owns the one type the
//! whole engine agrees on: the content-derived [`ObjectId`].
//!
//! # Key Types
//!
//! - [`ObjectId`]: 160-bit SHA-1 digest rendered as 40 lowercase hex characters
//! - [`TypeError`]: parse failures for hex identifiers

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{is_full_hex_oid, ObjectId, OID_HEX_LEN};
