//! Synchronization between megit repositories.
//!
//! Both sides are reachable as local stores; there is no wire protocol.
//! Fetch and push enumerate the objects reachable from a commit and copy
//! the ones the destination lacks, then move a ref. Objects are immutable,
//! so an existing object is never overwritten.

pub mod error;
pub mod negotiation;
pub mod transfer;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use negotiation::known_objects;
pub use transfer::{fetch, push};
pub use types::{Endpoint, FetchResult, PushResult, RefUpdate};
