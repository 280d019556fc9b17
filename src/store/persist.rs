// Store persistence module
// Saves the record store to a JSON data file and loads it back on startup

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::record::Record;

/// On-disk shape of the whole store
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SoupSnapshot {
    /// Store-wide last-modified metadata (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Every record, in insertion order
    #[serde(default)]
    pub records: Vec<Record>,
}

/// Load a snapshot from `path`.
///
/// A missing file is not an error; it simply means an empty store.
pub fn load_snapshot(path: &Path) -> io::Result<Option<SoupSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(snapshot))
}

/// Write a snapshot to `path`, creating parent directories as needed
pub fn save_snapshot(path: &Path, snapshot: &SoupSnapshot) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(snapshot)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_snapshot(&dir.path().join("nope.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("abfab.json");

        let mut record = Record::with_path("/foo");
        record.set("title", json!("Hello"));
        let snapshot = SoupSnapshot {
            last_modified: Some("2026-01-01T00:00:00+00:00".to_string()),
            records: vec![record.clone()],
        };

        save_snapshot(&path, &snapshot).expect("save");
        let loaded = load_snapshot(&path).expect("load").expect("present");
        assert_eq!(loaded.last_modified, snapshot.last_modified);
        assert_eq!(loaded.records, vec![record]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(load_snapshot(&path).is_err());
    }
}
