//! # Shelf Core
//!
//! The reading-list core behind a personal bookshelf: search a remote book
//! catalog, keep a local collection of saved books, move each book through
//! its reading status, rate and annotate it, and filter or search the
//! collection.
//!
//! The collection is stored in LMDB as a single JSON array under a fixed key.
//! Every change reads the whole list, computes the new list and writes it
//! back, so the on-disk state is always one consistent snapshot.
//!
//! ## Layers
//!
//! - [`catalog`]: builds search requests and keeps only book cards from the
//!   response
//! - [`book_store`]: pure add/merge, status, rating, removal, filter and
//!   search over a list of [`book_model::SavedBook`]
//! - [`library_state`]: the load/save pair ([`library_state::BookPersistence`])
//!   with LMDB and in-memory implementations
//! - [`library`]: the read-modify-write service tying the two together
//!
//! ## Quick Start
//!
//! ```no_run
//! use shelf_core::{create_library, add_book, get_books};
//! use std::ffi::CString;
//!
//! let db_name = CString::new("my_shelf").unwrap();
//! let state = create_library(db_name.as_ptr());
//!
//! let book = CString::new(r#"{"title":"Dune","url":"https://book.douban.com/subject/1/",
//!     "abstract":"","cover_url":"","card_subtitle":"Frank Herbert / 1965","type":"book"}"#).unwrap();
//! let status = CString::new("plan_to_read").unwrap();
//! let result = add_book(state, book.as_ptr(), status.as_ptr());
//!
//! let all = get_books(state, std::ptr::null());
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON-encoded [`AppResponse`] as a C string. The
//! `Ok` payload is itself a JSON document. Returned strings must be released
//! with [`free_c_string`].
//!
//! - [`create_library`] / [`create_library_with_config`] - open a collection
//! - [`add_book`] - add or re-add a catalog entry
//! - [`set_book_status`] - move a book to another status
//! - [`set_book_rating`] - rate and comment a book
//! - [`remove_book`] - delete a book by id
//! - [`get_books`] - whole collection, optionally filtered by status
//! - [`search_books`] - local title/subtitle search
//! - [`get_book_groups`] - collection grouped by status
//! - [`build_search_url`] / [`parse_search_response`] - catalog helpers
//! - [`search_catalog`] - remote search through the configured endpoint
//! - [`lookup_books`] - local search with catalog fallback
//! - [`clear_library`] - drop every saved book
//! - [`close_library`] - release a collection handle

pub mod app_response;
pub mod book_model;
pub mod book_status;
pub mod book_store;
pub mod catalog;
pub mod config;
pub mod library;
pub mod library_state;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::book_model::{CatalogEntry, MAX_RATING};
use crate::book_status::BookStatus;
use crate::config::LibraryConfig;
use crate::library::Library;
use crate::library_state::LmdbPersistence;

/// Handle passed across the FFI boundary.
pub type LibraryState = Library<LmdbPersistence>;

/// Opens (or creates) the collection stored in `<name>.lmdb` with default
/// settings.
///
/// # Returns
///
/// A pointer to the [`LibraryState`] on success, or a null pointer on
/// failure. Release it with [`close_library`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shelf_core::create_library;
///
/// let name = CString::new("reading_list").unwrap();
/// let state = create_library(name.as_ptr());
/// assert!(!state.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_library(name: *const c_char) -> *mut LibraryState {
    if name.is_null() {
        warn!("Null name pointer passed to create_library");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_library(&LibraryConfig::with_name(name_str))
}

/// Opens a collection from a JSON [`LibraryConfig`].
///
/// Missing fields take their defaults:
///
/// ```json
/// {
///   "db_name": "shelf",
///   "storage_key": "stored-books",
///   "map_size": 10485760,
///   "search_endpoint": "https://www.douban.com/j/search_suggest",
///   "request_timeout_secs": 10
/// }
/// ```
///
/// Returns a null pointer on invalid input or when the database can't be
/// opened.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_library_with_config(config_json: *const c_char) -> *mut LibraryState {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_library_with_config");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match serde_json::from_str::<LibraryConfig>(json) {
        Ok(config) => open_library(&config),
        Err(e) => {
            warn!("Invalid library config: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_library(config: &LibraryConfig) -> *mut LibraryState {
    info!("Opening library at: {}", config.db_dir());

    match Library::open(config) {
        Ok(library) => {
            info!("✅ Library opened successfully");
            Box::into_raw(Box::new(library))
        }
        Err(e) => {
            warn!("❌ Failed to open library: {e}");
            warn!("Attempted path: {}", config.db_dir());
            std::ptr::null_mut()
        }
    }
}

/// Adds a catalog entry to the collection with the given status.
///
/// If a book with the same `url` is already saved, it is refreshed in place:
/// its `id` and `addedAt` are kept, metadata and status come from the new
/// entry, and its rating and comment are dropped.
///
/// # Parameters
///
/// * `state` - Pointer to the library handle
/// * `entry_json` - A catalog card (`title`, `url`, `abstract`, `cover_url`,
///   `card_subtitle`, `type`). Only `"book"` cards are accepted.
/// * `status` - `plan_to_read`, `reading`, `finished` or `abandoned`
///
/// # Returns
///
/// `Ok` with the stored book as JSON, `ValidationError` for a non-book card
/// or unknown status, `SerializationError` for malformed JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_book(
    state: *mut LibraryState,
    entry_json: *const c_char,
    status: *const c_char,
) -> *const c_char {
    let library = match state_ref(state, "add_book") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let json_str = match c_ptr_to_string(entry_json, "entry") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let status = match c_ptr_to_status(status) {
        Ok(status) => status,
        Err(err) => return err,
    };

    let entry: CatalogEntry = match serde_json::from_str(&json_str) {
        Ok(entry) => entry,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    if !entry.is_book() {
        let error = AppResponse::ValidationError(format!(
            "Only book entries can be saved, got type '{}'",
            entry.kind
        ));
        return response_to_c_string(&error);
    }

    match library.add(&entry, status) {
        Ok(book) => ok_json(&book),
        Err(e) => response_to_c_string(&e),
    }
}

/// Moves a book to another status.
///
/// An id with no matching book leaves the collection as it was and still
/// answers `Ok`. The payload is the whole collection after the call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_book_status(
    state: *mut LibraryState,
    id: *const c_char,
    status: *const c_char,
) -> *const c_char {
    let library = match state_ref(state, "set_book_status") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let status = match c_ptr_to_status(status) {
        Ok(status) => status,
        Err(err) => return err,
    };

    match library.set_status(&id_str, status) {
        Ok(books) => ok_json(&books),
        Err(e) => response_to_c_string(&e),
    }
}

/// Rates a book and sets its comment.
///
/// # Parameters
///
/// * `rating` - `0..=5`; `0` means unrated
/// * `comment` - Comment text, or null to clear the comment
///
/// Same not-found behaviour as [`set_book_status`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_book_rating(
    state: *mut LibraryState,
    id: *const c_char,
    rating: c_int,
    comment: *const c_char,
) -> *const c_char {
    let library = match state_ref(state, "set_book_rating") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let rating = match u8::try_from(rating) {
        Ok(r) if r <= MAX_RATING => r,
        _ => {
            let error = AppResponse::ValidationError(format!(
                "Rating must be between 0 and {MAX_RATING}, got {rating}"
            ));
            return response_to_c_string(&error);
        }
    };

    let comment = if comment.is_null() {
        None
    } else {
        match c_ptr_to_string(comment, "comment") {
            Ok(comment) => Some(comment),
            Err(err) => return err,
        }
    };

    match library.set_rating(&id_str, rating, comment.as_deref()) {
        Ok(books) => ok_json(&books),
        Err(e) => response_to_c_string(&e),
    }
}

/// Removes a book by id. Unknown ids are a no-op.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_book(state: *mut LibraryState, id: *const c_char) -> *const c_char {
    let library = match state_ref(state, "remove_book") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    match library.remove(&id_str) {
        Ok(books) => ok_json(&books),
        Err(e) => response_to_c_string(&e),
    }
}

/// Returns the collection, or only the books with `status` when it is not
/// null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_books(state: *mut LibraryState, status: *const c_char) -> *const c_char {
    let library = match state_ref(state, "get_books") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let status = if status.is_null() {
        None
    } else {
        match c_ptr_to_status(status) {
            Ok(status) => Some(status),
            Err(err) => return err,
        }
    };

    match library.by_status(status) {
        Ok(books) => ok_json(&books),
        Err(e) => response_to_c_string(&e),
    }
}

/// Case-insensitive search over saved titles and subtitles. A blank query
/// returns the whole collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_books(state: *mut LibraryState, query: *const c_char) -> *const c_char {
    let library = match state_ref(state, "search_books") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    match library.search(&query) {
        Ok(books) => ok_json(&books),
        Err(e) => response_to_c_string(&e),
    }
}

/// The collection in status sections (`status`, `title`, `books`), in
/// lifecycle order with empty sections left out.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_book_groups(state: *mut LibraryState) -> *const c_char {
    let library = match state_ref(state, "get_book_groups") {
        Ok(library) => library,
        Err(err) => return err,
    };

    match library.groups() {
        Ok(groups) => ok_json(&groups),
        Err(e) => response_to_c_string(&e),
    }
}

/// Builds the catalog search URL for `query` against the default endpoint,
/// for hosts that do their own networking.
///
/// Answers `InvalidQuery` for a blank query; the host must not send a
/// request in that case.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn build_search_url(query: *const c_char) -> *const c_char {
    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    match catalog::build_search_request(config::DEFAULT_SEARCH_ENDPOINT, &query) {
        Ok(request) => response_to_c_string(&AppResponse::success(request.url)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Normalizes a raw catalog response body into a list of book entries.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn parse_search_response(body: *const c_char) -> *const c_char {
    let body = match c_ptr_to_string(body, "body") {
        Ok(body) => body,
        Err(err) => return err,
    };

    match catalog::parse_search_response(&body) {
        Ok(entries) => ok_json(&entries),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Runs a remote catalog search through the library's configured endpoint.
///
/// Blocks for the duration of the request. Failures come back as
/// `InvalidQuery`, `RemoteSearchFailed` or `RemoteParseFailed`; nothing is
/// retried.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_catalog(state: *mut LibraryState, query: *const c_char) -> *const c_char {
    let library = match state_ref(state, "search_catalog") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    match library.search_catalog(&query) {
        Ok(entries) => ok_json(&entries),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Searches the collection and, when nothing matches, the catalog.
///
/// The `Ok` payload is `{"local": [...], "remote": [...]}`; `remote` stays
/// empty whenever `local` has matches.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn lookup_books(state: *mut LibraryState, query: *const c_char) -> *const c_char {
    let library = match state_ref(state, "lookup_books") {
        Ok(library) => library,
        Err(err) => return err,
    };

    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    match library.lookup(&query) {
        Ok(found) => ok_json(&found),
        Err(e) => response_to_c_string(&e),
    }
}

/// Removes every saved book from the collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_library(state: *mut LibraryState) -> *const c_char {
    let library = match state_ref(state, "clear_library") {
        Ok(library) => library,
        Err(err) => return err,
    };

    match library.persistence().clear() {
        Ok(existed) => {
            info!("Cleared library (had data: {existed})");
            response_to_c_string(&AppResponse::success("Library cleared successfully"))
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a library handle created by [`create_library`] or
/// [`create_library_with_config`].
///
/// The pointer must not be used afterwards. The LMDB environment is closed
/// when the handle is dropped.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_library(state: *mut LibraryState) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_library".to_string());
        return response_to_c_string(&error);
    }

    let library = unsafe { Box::from_raw(state) };
    info!("Closing library at {}", library.persistence().path().display());
    drop(library);

    response_to_c_string(&AppResponse::success("Library closed successfully"))
}

/// Frees a string returned by any function of this library. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn state_ref<'a>(state: *mut LibraryState, caller: &str) -> Result<&'a LibraryState, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(library) => Ok(library),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Serializes `value` as the payload of an `Ok` response.
fn ok_json<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - A `BadRequest` response for null pointers or
///   invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn c_ptr_to_status(ptr: *const c_char) -> Result<BookStatus, *const c_char> {
    let raw = c_ptr_to_string(ptr, "status")?;
    raw.parse::<BookStatus>().map_err(|e| {
        let error = AppResponse::ValidationError(e.to_string());
        response_to_c_string(&error)
    })
}
