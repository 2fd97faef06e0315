//! Data model definitions for catalog results and saved books.
//!
//! Two shapes travel through the crate. [`CatalogEntry`] is a candidate book
//! returned by the remote search: it lives only as long as one result list.
//! [`SavedBook`] is the persisted record: the same catalog fields plus the
//! bookkeeping the collection needs (identifier, status, timestamps and the
//! reader's own rating and comment).
//!
//! Both keep the upstream JSON field names (`url`, `abstract`, `cover_url`,
//! `card_subtitle`, `type`) so a card from the search endpoint and a record
//! from the persisted blob read the same way.

use serde::{Deserialize, Serialize};

use crate::book_status::BookStatus;

/// The card type the catalog uses for books. Anything else is discarded.
pub const BOOK_KIND: &str = "book";

/// Highest rating a reader can give. Zero or an absent rating means unrated.
pub const MAX_RATING: u8 = 5;

/// A candidate book returned by the remote catalog, not yet saved.
///
/// `url` is the canonical external identifier and the de-duplication key of
/// the collection.
///
/// # Examples
///
/// ```rust
/// use shelf_core::book_model::CatalogEntry;
///
/// let card = r#"{
///     "title": "Dune",
///     "url": "https://book.douban.com/subject/1/",
///     "abstract": "Frank Herbert / 1965",
///     "cover_url": "https://img.example/dune.jpg",
///     "card_subtitle": "Frank Herbert / Chilton Books / 1965",
///     "type": "book"
/// }"#;
///
/// let entry: CatalogEntry = serde_json::from_str(card)?;
/// assert!(entry.is_book());
/// assert_eq!(entry.summary, "Frank Herbert / 1965");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,

    /// Source URL of the book page. Unique across the collection.
    pub url: String,

    /// Short description as the catalog phrases it.
    #[serde(rename = "abstract")]
    pub summary: String,

    pub cover_url: String,

    /// Slash-separated author / publisher / year line.
    pub card_subtitle: String,

    /// Card discriminator, `"book"` for eligible entries.
    #[serde(rename = "type")]
    pub kind: String,
}

impl CatalogEntry {
    pub fn is_book(&self) -> bool {
        self.kind == BOOK_KIND
    }

    /// Compact subtitle for list views.
    ///
    /// Catalog subtitles look like `author / publisher / year / ...`. When
    /// there are more than two segments the second and third are joined with
    /// `" - "`; shorter subtitles come back untouched.
    pub fn display_subtitle(&self) -> String {
        let parts: Vec<&str> = self.card_subtitle.split('/').collect();
        if parts.len() > 2 {
            format!("{} - {}", parts[1].trim(), parts[2].trim())
        } else {
            self.card_subtitle.clone()
        }
    }
}

/// A book the reader has added to the collection.
///
/// Catalog fields are flattened into the record so the persisted JSON is a
/// single flat object per book.
///
/// # Field Constraints
///
/// - **id**: assigned once on creation, never regenerated, never reused
/// - **added_at**: milliseconds since the Unix epoch, never changes, even
///   when the same URL is added again
/// - **updated_at**: set by every mutation after creation
/// - **rating**: `0..=5`, `None` and `Some(0)` both mean unrated
///
/// Records are only created, changed and removed through the functions in
/// [`crate::book_store`]. Values handed to callers are copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBook {
    #[serde(flatten)]
    pub entry: CatalogEntry,

    pub id: String,

    pub status: BookStatus,

    pub added_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SavedBook {
    pub fn title(&self) -> &str {
        &self.entry.title
    }

    pub fn url(&self) -> &str {
        &self.entry.url
    }

    pub fn display_subtitle(&self) -> String {
        self.entry.display_subtitle()
    }
}
