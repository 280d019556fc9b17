//! Catalog factory: index definitions consumed by the record store.
//!
//! The store builds one equality index per definition; lookups and deletes by
//! path go through the `path` index rather than scanning every record.

use super::record::PATH_ATTR;

/// Kind of index a definition requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Exact-match equality index over a single string attribute
    Field,
}

/// One index definition
#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub attribute: &'static str,
    pub kind: IndexKind,
}

/// Supplies the index definitions the store is built with.
///
/// At minimum there is a field index over the `path` attribute; that one is
/// what makes path-addressed lookups work at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogFactory;

impl CatalogFactory {
    pub fn definitions(&self) -> Vec<IndexSpec> {
        vec![IndexSpec {
            attribute: PATH_ATTR,
            kind: IndexKind::Field,
        }]
    }
}
