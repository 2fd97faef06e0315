//! Persistence of the saved book list.
//!
//! The collection is stored whole: one key, one JSON array. Reads and writes
//! never touch part of the list.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Error as LmdbError, Transaction, WriteFlags};
use log::{debug, info};

use crate::app_response::AppResponse;
use crate::book_model::SavedBook;
use crate::config::LibraryConfig;

const BOOKS_DB_NAME: &str = "books";

/// Load/save pair the library is built on.
pub trait BookPersistence {
    /// Current list. A store that was never written yields an empty list.
    fn load(&self) -> Result<Vec<SavedBook>, AppResponse>;

    /// Replaces the stored list with `books`.
    fn save(&self, books: &[SavedBook]) -> Result<(), AppResponse>;
}

pub struct LmdbPersistence {
    env: Environment,
    db: Database,
    storage_key: String,
    path: PathBuf,
}

impl LmdbPersistence {
    pub fn init(config: &LibraryConfig) -> Result<Self, AppResponse> {
        let dir = config.db_dir();
        let path = Path::new(&dir);
        fs::create_dir_all(path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(config.map_size)
            .open(path)?;
        let db = env.create_db(Some(BOOKS_DB_NAME), DatabaseFlags::empty())?;

        info!("Opened book store at {}", dir);
        Ok(Self {
            env,
            db,
            storage_key: config.storage_key.clone(),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops the stored list. Returns whether anything was stored.
    pub fn clear(&self) -> Result<bool, AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        let existed = match txn.del(self.db, &self.storage_key, None) {
            Ok(()) => true,
            Err(LmdbError::NotFound) => false,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(existed)
    }
}

impl BookPersistence for LmdbPersistence {
    fn load(&self) -> Result<Vec<SavedBook>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let books: Vec<SavedBook> = match txn.get(self.db, &self.storage_key) {
            Ok(bytes) => serde_json::from_slice(bytes)?,
            Err(LmdbError::NotFound) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} books from '{}'", books.len(), self.storage_key);
        Ok(books)
    }

    fn save(&self, books: &[SavedBook]) -> Result<(), AppResponse> {
        let json = serde_json::to_vec(books)?;
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &self.storage_key, &json, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Saved {} books to '{}'", books.len(), self.storage_key);
        Ok(())
    }
}

/// In-memory store. Holds the serialized blob so round trips go through the
/// same JSON as the on-disk store.
#[derive(Default)]
pub struct MemoryPersistence {
    blob: RefCell<Option<String>>,
    reject_saves: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose saves always fail, for exercising error paths.
    pub fn rejecting_saves() -> Self {
        Self {
            blob: RefCell::new(None),
            reject_saves: true,
        }
    }

    /// The stored JSON blob as `save` wrote it, for checking the persisted
    /// format.
    pub fn raw(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl BookPersistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<SavedBook>, AppResponse> {
        match self.blob.borrow().as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, books: &[SavedBook]) -> Result<(), AppResponse> {
        if self.reject_saves {
            return Err(AppResponse::DatabaseError("store is read-only".to_string()));
        }
        let json = serde_json::to_string(books)?;
        *self.blob.borrow_mut() = Some(json);
        Ok(())
    }
}
