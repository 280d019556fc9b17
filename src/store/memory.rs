//! In-memory record store backed by catalog equality indexes.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::PathBuf;

use serde_json::Value;

use super::catalog::{CatalogFactory, IndexKind};
use super::persist::{self, SoupSnapshot};
use super::record::Record;
use super::{Soup, SoupError};

/// In-process soup implementation.
///
/// Records live in an id-keyed map; one equality index per catalog definition
/// maps attribute values back to record ids. With the default catalog that is
/// a single index over `path`, which is also the uniqueness key.
pub struct MemorySoup {
    catalog: CatalogFactory,
    records: BTreeMap<u64, Record>,
    indexes: HashMap<&'static str, HashMap<String, u64>>,
    next_id: u64,
    last_modified: Option<String>,
    data_file: Option<PathBuf>,
}

impl MemorySoup {
    /// Create an empty, memory-only store
    pub fn new(catalog: CatalogFactory) -> Self {
        let mut soup = Self {
            catalog,
            records: BTreeMap::new(),
            indexes: HashMap::new(),
            next_id: 0,
            last_modified: None,
            data_file: None,
        };
        soup.rebuild_indexes();
        soup
    }

    /// Create a store persisted to `data_file` after every mutation
    pub fn with_data_file(catalog: CatalogFactory, data_file: impl Into<PathBuf>) -> Self {
        let mut soup = Self::new(catalog);
        soup.data_file = Some(data_file.into());
        soup
    }

    /// Load records from the data file, replacing current contents.
    ///
    /// Returns the number of records loaded; a missing (or unset) data file
    /// loads nothing and is not an error.
    pub fn load(&mut self) -> io::Result<usize> {
        let Some(path) = self.data_file.clone() else {
            return Ok(0);
        };
        let Some(snapshot) = persist::load_snapshot(&path)? else {
            return Ok(0);
        };

        self.clear();
        self.last_modified = snapshot.last_modified;
        for record in snapshot.records {
            // Records without a path cannot be addressed; drop them here
            // rather than carrying unreachable entries forever.
            let _ = self.upsert(record);
        }
        Ok(self.records.len())
    }

    /// Drop all indexes and rebuild empty ones from the catalog definitions
    fn rebuild_indexes(&mut self) {
        self.indexes.clear();
        for spec in self.catalog.definitions() {
            match spec.kind {
                IndexKind::Field => {
                    self.indexes.insert(spec.attribute, HashMap::new());
                }
            }
        }
    }

    /// Remove a record's entries from every index
    fn unindex(&mut self, record: &Record) {
        for spec in self.catalog.definitions() {
            if let Some(Value::String(value)) = record.get(spec.attribute) {
                if let Some(index) = self.indexes.get_mut(spec.attribute) {
                    index.remove(value);
                }
            }
        }
    }

    /// Add a record's entries to every index
    fn index(&mut self, id: u64, record: &Record) {
        for spec in self.catalog.definitions() {
            if let Some(Value::String(value)) = record.get(spec.attribute) {
                if let Some(index) = self.indexes.get_mut(spec.attribute) {
                    index.insert(value.clone(), id);
                }
            }
        }
    }

    fn path_index(&self) -> Option<&HashMap<String, u64>> {
        self.indexes.get(super::PATH_ATTR)
    }
}

impl Soup for MemorySoup {
    fn upsert(&mut self, record: Record) -> Result<String, SoupError> {
        let path = record.path().ok_or(SoupError::MissingPath)?.to_string();

        let existing = self.path_index().and_then(|index| index.get(&path)).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };

        if let Some(old) = self.records.get(&id).cloned() {
            self.unindex(&old);
        }
        self.index(id, &record);
        self.records.insert(id, record);
        Ok(path)
    }

    fn find(&self, path: &str) -> Option<Record> {
        let id = *self.path_index()?.get(path)?;
        self.records.get(&id).cloned()
    }

    fn delete(&mut self, path: &str) -> usize {
        let Some(id) = self.path_index().and_then(|index| index.get(path)).copied() else {
            return 0;
        };
        if let Some(record) = self.records.remove(&id) {
            self.unindex(&record);
            1
        } else {
            0
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.next_id = 0;
        self.last_modified = None;
        self.rebuild_indexes();
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn last_modified(&self) -> Option<String> {
        self.last_modified.clone()
    }

    fn touch(&mut self, stamp: String) {
        self.last_modified = Some(stamp);
    }

    fn flush(&self) -> io::Result<()> {
        let Some(path) = self.data_file.as_deref() else {
            return Ok(());
        };
        let snapshot = SoupSnapshot {
            last_modified: self.last_modified.clone(),
            records: self.records.values().cloned().collect(),
        };
        persist::save_snapshot(path, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn soup() -> MemorySoup {
        MemorySoup::new(CatalogFactory)
    }

    #[test]
    fn test_upsert_and_find() {
        let mut soup = soup();
        let mut record = Record::with_path("/foo");
        record.set("title", json!("Hello"));

        let path = soup.upsert(record).expect("upsert");
        assert_eq!(path, "/foo");
        assert_eq!(soup.len(), 1);

        let found = soup.find("/foo").expect("record");
        assert_eq!(found.get("title"), Some(&json!("Hello")));
        assert!(soup.find("/bar").is_none());
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let mut soup = soup();
        let mut first = Record::with_path("/foo");
        first.set("title", json!("One"));
        soup.upsert(first).expect("upsert");

        let mut second = Record::with_path("/foo");
        second.set("title", json!("Two"));
        soup.upsert(second).expect("upsert");

        assert_eq!(soup.len(), 1);
        let found = soup.find("/foo").expect("record");
        assert_eq!(found.get("title"), Some(&json!("Two")));
    }

    #[test]
    fn test_upsert_without_path_fails() {
        let mut soup = soup();
        let err = soup.upsert(Record::new()).expect_err("must fail");
        assert_eq!(err, SoupError::MissingPath);
        assert!(soup.is_empty());
    }

    #[test]
    fn test_delete() {
        let mut soup = soup();
        soup.upsert(Record::with_path("/foo")).expect("upsert");

        assert_eq!(soup.delete("/foo"), 1);
        assert!(soup.find("/foo").is_none());
        assert!(soup.is_empty());

        // Deleting a missing path is a no-op
        assert_eq!(soup.delete("/foo"), 0);
        assert_eq!(soup.delete("/never-existed"), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut soup = soup();
        soup.upsert(Record::with_path("/a")).expect("upsert");
        soup.upsert(Record::with_path("/b")).expect("upsert");
        soup.touch("2026-01-01T00:00:00+00:00".to_string());

        soup.clear();
        assert!(soup.is_empty());
        assert!(soup.last_modified().is_none());
        assert!(soup.find("/a").is_none());
    }

    #[test]
    fn test_last_modified() {
        let mut soup = soup();
        assert!(soup.last_modified().is_none());
        soup.touch("2026-02-03T04:05:06+00:00".to_string());
        assert_eq!(
            soup.last_modified().as_deref(),
            Some("2026-02-03T04:05:06+00:00")
        );
    }

    #[test]
    fn test_flush_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("soup.json");

        let mut soup = MemorySoup::with_data_file(CatalogFactory, &file);
        let mut record = Record::with_path("/foo");
        record.set("title", json!("Hello"));
        soup.upsert(record).expect("upsert");
        soup.touch("2026-01-01T00:00:00+00:00".to_string());
        soup.flush().expect("flush");

        let mut reloaded = MemorySoup::with_data_file(CatalogFactory, &file);
        assert_eq!(reloaded.load().expect("load"), 1);
        let found = reloaded.find("/foo").expect("record");
        assert_eq!(found.get("title"), Some(&json!("Hello")));
        assert_eq!(
            reloaded.last_modified().as_deref(),
            Some("2026-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_flush_without_data_file_is_noop() {
        let mut soup = soup();
        soup.upsert(Record::with_path("/foo")).expect("upsert");
        soup.flush().expect("flush without file");
    }
}
