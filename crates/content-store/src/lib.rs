//! Content-addressed blob store
//!
//! Stores byte blobs in a directory under `<prefix>-<name>` file names, where
//! the name is usually an FNV-1a [`digest`] of the identifying key. Writes go
//! through a temporary file and a rename on the blocking pool, so readers
//! never observe a partially written blob and a dropped caller does not
//! abandon a write halfway.

mod digest;
mod error;
mod store;

pub use digest::{digest, digest_str};
pub use error::{Result, StoreError, StoreOp};
pub use store::ContentStore;
