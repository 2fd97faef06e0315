//! Reading-status lifecycle.
//!
//! Four states with no enforced transition graph: any status may move to any
//! other, including itself. The table below is the single place that knows
//! the wire names, the human labels and the lifecycle order used when the
//! collection is shown grouped by status.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed enumeration of reading statuses.
///
/// Serialized as `plan_to_read`, `reading`, `finished` and `abandoned`.
/// Data files written by earlier versions of the extension stored the
/// display labels instead, so those are accepted on the way in.
///
/// ```rust
/// use shelf_core::book_status::BookStatus;
///
/// let status: BookStatus = serde_json::from_str("\"看完\"")?;
/// assert_eq!(status, BookStatus::Finished);
/// assert_eq!(serde_json::to_string(&status)?, "\"finished\"");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    #[serde(alias = "打算看")]
    PlanToRead,
    #[serde(alias = "正在看")]
    Reading,
    #[serde(alias = "看完")]
    Finished,
    #[serde(alias = "放弃")]
    Abandoned,
}

impl BookStatus {
    /// Every status in lifecycle order.
    pub const ALL: [BookStatus; 4] = [
        BookStatus::PlanToRead,
        BookStatus::Reading,
        BookStatus::Finished,
        BookStatus::Abandoned,
    ];

    /// Wire name, as stored and as accepted over FFI.
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::PlanToRead => "plan_to_read",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
            BookStatus::Abandoned => "abandoned",
        }
    }

    /// Section title for hosts that render the collection grouped.
    pub fn label(self) -> &'static str {
        match self {
            BookStatus::PlanToRead => "Plan to read",
            BookStatus::Reading => "Reading",
            BookStatus::Finished => "Finished",
            BookStatus::Abandoned => "Abandoned",
        }
    }

    fn legacy_label(self) -> &'static str {
        match self {
            BookStatus::PlanToRead => "打算看",
            BookStatus::Reading => "正在看",
            BookStatus::Finished => "看完",
            BookStatus::Abandoned => "放弃",
        }
    }
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl Display for UnknownStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown book status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted || status.legacy_label() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
