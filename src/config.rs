//! Library configuration.
//!
//! Hosts pass the configuration as JSON to
//! [`create_library_with_config`](crate::create_library_with_config). Every
//! field has a default, so `{}` and `{"db_name": "books"}` are both valid.

use serde::{Deserialize, Serialize};

/// Key under which the whole collection is stored.
pub const BOOKS_STORAGE_KEY: &str = "stored-books";

/// Search-suggest endpoint of the book catalog.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.douban.com/j/search_suggest";

const DEFAULT_DB_NAME: &str = "shelf";
const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Database name. The LMDB environment lives in `<db_name>.lmdb`.
    pub db_name: String,
    pub storage_key: String,
    /// LMDB map size in bytes.
    pub map_size: usize,
    pub search_endpoint: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            db_name: DEFAULT_DB_NAME.to_string(),
            storage_key: BOOKS_STORAGE_KEY.to_string(),
            map_size: DEFAULT_MAP_SIZE,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("shelf_core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LibraryConfig {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            db_name: name.into(),
            ..Self::default()
        }
    }

    /// Path of the LMDB environment directory.
    pub fn db_dir(&self) -> String {
        format!("{}.lmdb", self.db_name)
    }
}
