//! Error types for the content store

use std::fmt;
use std::io;

/// The store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Create,
    Open,
    Read,
    Write,
    Close,
    Persist,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            StoreOp::Create => "failed to create file",
            StoreOp::Open => "failed to open file",
            StoreOp::Read => "failed to read file",
            StoreOp::Write => "failed to write to file",
            StoreOp::Close => "failed to close file",
            StoreOp::Persist => "failed to move file into place",
            StoreOp::Delete => "failed to delete file",
        };
        f.write_str(msg)
    }
}

#[derive(Debug)]
pub struct StoreError {
    pub op: StoreOp,
    pub name: String,
    pub source: io::Error,
}

impl StoreError {
    pub fn new(op: StoreOp, name: &str, source: io::Error) -> Self {
        Self {
            op,
            name: name.to_string(),
            source,
        }
    }

    /// True when the blob simply is not there, as opposed to an I/O failure
    pub fn is_not_found(&self) -> bool {
        matches!(self.op, StoreOp::Open | StoreOp::Delete)
            && self.source.kind() == io::ErrorKind::NotFound
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.op, self.name, self.source)
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
