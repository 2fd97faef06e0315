//! Collection operations over the saved book list.
//!
//! Every function here takes the current list by reference and hands back a
//! fresh list. Nothing reads or writes storage; [`crate::library::Library`]
//! owns the load/compute/save cycle.
//!
//! Operations addressed by `id` treat an unknown id as a no-op and return the
//! list unchanged. There is no signal telling a match from a miss; callers
//! that care look the record up with [`find_book`] first.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::book_model::{CatalogEntry, SavedBook, MAX_RATING};
use crate::book_status::BookStatus;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Adds `candidate` to the collection, or merges it into the record that
/// already has the same `url`.
///
/// A merge keeps the existing record's position, `id` and `added_at`, takes
/// the candidate's metadata and `status`, stamps `updated_at`, and drops any
/// previous rating and comment.
///
/// Returns the new list together with the record that was inserted or
/// merged.
pub fn add_book(
    books: &[SavedBook],
    candidate: &CatalogEntry,
    status: BookStatus,
) -> (Vec<SavedBook>, SavedBook) {
    let now = now_millis();
    let mut updated = books.to_vec();

    if let Some(index) = books.iter().position(|b| b.entry.url == candidate.url) {
        let existing = &books[index];
        let merged = SavedBook {
            entry: candidate.clone(),
            id: existing.id.clone(),
            status,
            added_at: existing.added_at,
            updated_at: Some(now),
            rating: None,
            comment: None,
        };
        updated[index] = merged.clone();
        return (updated, merged);
    }

    let book = SavedBook {
        entry: candidate.clone(),
        id: Uuid::new_v4().to_string(),
        status,
        added_at: now,
        updated_at: None,
        rating: None,
        comment: None,
    };
    updated.push(book.clone());
    (updated, book)
}

/// Moves the book with `id` to `status`. Same-status moves are applied too.
pub fn set_status(books: &[SavedBook], id: &str, status: BookStatus) -> Vec<SavedBook> {
    let now = now_millis();
    books
        .iter()
        .map(|book| {
            if book.id == id {
                SavedBook {
                    status,
                    updated_at: Some(now),
                    ..book.clone()
                }
            } else {
                book.clone()
            }
        })
        .collect()
}

/// Sets the rating and comment of the book with `id`.
///
/// `comment` replaces the old one outright, so `None` clears it. Ratings
/// above [`MAX_RATING`] are stored as [`MAX_RATING`].
pub fn set_rating(
    books: &[SavedBook],
    id: &str,
    rating: u8,
    comment: Option<&str>,
) -> Vec<SavedBook> {
    let now = now_millis();
    books
        .iter()
        .map(|book| {
            if book.id == id {
                SavedBook {
                    rating: Some(rating.min(MAX_RATING)),
                    comment: comment.map(str::to_string),
                    updated_at: Some(now),
                    ..book.clone()
                }
            } else {
                book.clone()
            }
        })
        .collect()
}

pub fn remove_book(books: &[SavedBook], id: &str) -> Vec<SavedBook> {
    books.iter().filter(|b| b.id != id).cloned().collect()
}

/// Books with the given status, in collection order. `None` returns the
/// whole collection.
pub fn filter_by_status(books: &[SavedBook], status: Option<BookStatus>) -> Vec<SavedBook> {
    match status {
        None => books.to_vec(),
        Some(wanted) => books.iter().filter(|b| b.status == wanted).cloned().collect(),
    }
}

/// Case-insensitive substring search over title and subtitle.
///
/// A query that is blank after trimming returns the whole collection. The
/// query itself is matched as given, not trimmed and not tokenized.
pub fn search_books(books: &[SavedBook], query: &str) -> Vec<SavedBook> {
    if query.trim().is_empty() {
        return books.to_vec();
    }

    let needle = query.to_lowercase();
    books
        .iter()
        .filter(|b| {
            b.entry.title.to_lowercase().contains(&needle)
                || b.entry.card_subtitle.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn find_book<'a>(books: &'a [SavedBook], id: &str) -> Option<&'a SavedBook> {
    books.iter().find(|b| b.id == id)
}

/// One status section of the grouped collection view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSection {
    pub status: BookStatus,
    pub title: &'static str,
    pub books: Vec<SavedBook>,
}

/// The collection split into status sections.
///
/// Sections follow [`BookStatus::ALL`]; empty ones are left out and each
/// keeps collection order.
pub fn group_by_status(books: &[SavedBook]) -> Vec<StatusSection> {
    BookStatus::ALL
        .into_iter()
        .map(|status| StatusSection {
            status,
            title: status.label(),
            books: filter_by_status(books, Some(status)),
        })
        .filter(|section| !section.books.is_empty())
        .collect()
}
