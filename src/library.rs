//! Read-modify-write service over the book collection.
//!
//! Each mutating call loads the whole list from the injected
//! [`BookPersistence`], applies one [`book_store`] operation and writes the
//! whole list back. Calls are expected to be serialized by the host; there
//! is no locking here.

use log::{debug, info};
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::book_model::{CatalogEntry, SavedBook};
use crate::book_status::BookStatus;
use crate::book_store::{self, StatusSection};
use crate::catalog::{CatalogClient, CatalogResult, CatalogTransport, UreqTransport};
use crate::config::LibraryConfig;
use crate::library_state::{BookPersistence, LmdbPersistence};

/// Result of [`Library::lookup`]. `remote` is only filled when nothing in
/// the collection matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lookup {
    pub local: Vec<SavedBook>,
    pub remote: Vec<CatalogEntry>,
}

pub struct Library<P: BookPersistence, T: CatalogTransport = UreqTransport> {
    persistence: P,
    catalog: CatalogClient<T>,
}

impl Library<LmdbPersistence, UreqTransport> {
    /// Opens the on-disk collection described by `config`.
    pub fn open(config: &LibraryConfig) -> Result<Self, AppResponse> {
        let persistence = LmdbPersistence::init(config)?;
        Ok(Self::new(persistence, CatalogClient::from_config(config)))
    }
}

impl<P: BookPersistence, T: CatalogTransport> Library<P, T> {
    pub fn new(persistence: P, catalog: CatalogClient<T>) -> Self {
        Self {
            persistence,
            catalog,
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// The whole collection in insertion order.
    pub fn books(&self) -> Result<Vec<SavedBook>, AppResponse> {
        self.persistence.load()
    }

    pub fn get(&self, id: &str) -> Result<Option<SavedBook>, AppResponse> {
        let books = self.persistence.load()?;
        Ok(book_store::find_book(&books, id).cloned())
    }

    /// Adds a catalog entry, merging into an existing record with the same
    /// URL. Returns the stored record.
    pub fn add(&self, candidate: &CatalogEntry, status: BookStatus) -> Result<SavedBook, AppResponse> {
        let books = self.persistence.load()?;
        let (books, book) = book_store::add_book(&books, candidate, status);
        self.persistence.save(&books)?;

        if book.updated_at.is_some() {
            info!("Re-added book {} ({}) as {}", book.id, book.url(), status);
        } else {
            info!("Added book {} ({}) as {}", book.id, book.url(), status);
        }
        Ok(book)
    }

    pub fn set_status(&self, id: &str, status: BookStatus) -> Result<Vec<SavedBook>, AppResponse> {
        self.mutate(id, "status change", |books| book_store::set_status(books, id, status))
    }

    pub fn set_rating(
        &self,
        id: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Vec<SavedBook>, AppResponse> {
        self.mutate(id, "rating", |books| book_store::set_rating(books, id, rating, comment))
    }

    pub fn remove(&self, id: &str) -> Result<Vec<SavedBook>, AppResponse> {
        self.mutate(id, "removal", |books| book_store::remove_book(books, id))
    }

    pub fn by_status(&self, status: Option<BookStatus>) -> Result<Vec<SavedBook>, AppResponse> {
        let books = self.persistence.load()?;
        Ok(book_store::filter_by_status(&books, status))
    }

    pub fn search(&self, query: &str) -> Result<Vec<SavedBook>, AppResponse> {
        let books = self.persistence.load()?;
        Ok(book_store::search_books(&books, query))
    }

    pub fn groups(&self) -> Result<Vec<StatusSection>, AppResponse> {
        let books = self.persistence.load()?;
        Ok(book_store::group_by_status(&books))
    }

    pub fn search_catalog(&self, query: &str) -> CatalogResult<Vec<CatalogEntry>> {
        self.catalog.search(query)
    }

    /// Searches the collection first and falls back to the catalog when
    /// nothing local matches. A blank query looks nowhere.
    pub fn lookup(&self, query: &str) -> Result<Lookup, AppResponse> {
        if query.trim().is_empty() {
            return Ok(Lookup::default());
        }

        let local = self.search(query)?;
        if !local.is_empty() {
            debug!("Lookup '{}' matched {} saved books", query, local.len());
            return Ok(Lookup {
                local,
                remote: Vec::new(),
            });
        }

        let remote = self.catalog.search(query)?;
        info!("Lookup '{}' fell back to catalog: {} results", query, remote.len());
        Ok(Lookup { local, remote })
    }

    // Unknown ids leave the list as it was; the write still happens so every
    // call has the same load/save shape.
    fn mutate<F>(&self, id: &str, what: &str, op: F) -> Result<Vec<SavedBook>, AppResponse>
    where
        F: FnOnce(&[SavedBook]) -> Vec<SavedBook>,
    {
        let books = self.persistence.load()?;
        let found = book_store::find_book(&books, id).is_some();

        let updated = op(&books);
        self.persistence.save(&updated)?;

        if found {
            info!("Applied {} to book {}", what, id);
        } else {
            debug!("No book with id {} for {}", id, what);
        }
        Ok(updated)
    }
}
