//! Record store ("soup") module
//!
//! Persistence boundary of the server: a narrow trait over a path-addressed
//! record store, an in-memory implementation with optional JSON-file
//! persistence, and the catalog factory supplying its index definitions.

mod catalog;
mod memory;
pub mod persist;
mod record;

use std::fmt;
use std::io;

// Re-export public types
pub use catalog::{CatalogFactory, IndexKind, IndexSpec};
pub use memory::MemorySoup;
pub use record::{Record, FILE_ATTR, PATH_ATTR};

/// Store-level error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoupError {
    /// The record has no string `path` attribute to address it by
    MissingPath,
}

impl fmt::Display for SoupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPath => write!(f, "record has no 'path' attribute"),
        }
    }
}

impl std::error::Error for SoupError {}

/// The narrow interface the request dispatcher talks to.
///
/// Implementations guarantee that a path identifies zero or one record, and
/// that the last-modified metadata value survives as long as the records do.
///
/// Object-safe: handlers use `Box<dyn Soup>`.
pub trait Soup: Send + Sync {
    /// Insert or overwrite the record addressed by its `path` attribute.
    ///
    /// Returns the path the record was stored under.
    fn upsert(&mut self, record: Record) -> Result<String, SoupError>;

    /// Find the record at an exact path
    fn find(&self, path: &str) -> Option<Record>;

    /// Delete every record whose path equals `path`; returns the count removed
    fn delete(&mut self, path: &str) -> usize;

    /// Remove all records and rebuild the catalog indexes
    fn clear(&mut self);

    /// Number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store-wide last-modified metadata (ISO-8601), if any write happened yet
    fn last_modified(&self) -> Option<String>;

    /// Update the last-modified metadata
    fn touch(&mut self, stamp: String);

    /// Persist the store to its backing file, if it has one
    fn flush(&self) -> io::Result<()>;
}
