// Application state module
// Owns the record store shared across request tasks

use std::sync::atomic::AtomicBool;
use tokio::sync::RwLock;

use super::types::Config;
use crate::logger;
use crate::store::{CatalogFactory, MemorySoup, Soup};

/// Application state
///
/// One instance per process, shared behind an `Arc`. Requests only ever hold
/// the soup lock for the duration of a single store operation.
pub struct AppState {
    pub config: Config,
    /// The record store, behind its narrow trait boundary
    pub soup: RwLock<Box<dyn Soup>>,
    /// Cached logging flag for lock-free access on the hot path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Create `AppState`, loading any persisted records from the data file
    pub fn new(config: Config) -> Self {
        let catalog = CatalogFactory::default();
        let mut soup = match config.storage.data_file.as_deref() {
            Some(path) => MemorySoup::with_data_file(catalog, path),
            None => MemorySoup::new(catalog),
        };

        match soup.load() {
            Ok(count) if count > 0 => logger::log_store_loaded(count),
            Ok(_) => {}
            Err(e) => logger::log_warning(&format!(
                "Failed to load record store, starting empty: {e}"
            )),
        }

        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            soup: RwLock::new(Box::new(soup)),
            cached_access_log,
        }
    }
}
