use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CycleState, Wisdom};
use crate::scheduler::RolloverOutcome;

/// Data transfer object for creating a new wisdom
///
/// This struct is used to deserialize JSON requests for creating wisdom.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateWisdomDto {
    /// The content of the wisdom
    pub text: String,

    /// Optional attribution
    #[serde(default)]
    pub source: Option<String>,

    /// Category to file the wisdom under; the configured default is used if absent
    #[serde(default)]
    pub category: Option<String>,
}

/// Data transfer object for editing a wisdom
///
/// Fields that are None are left unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UpdateWisdomDto {
    pub text: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
}

/// Data transfer object for marking or unmarking a favorite
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SetFavoriteDto {
    pub favorite: bool,
}

/// Ordering applied when listing wisdom
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// By category, then position in the category queue
    #[default]
    Queue,
    /// Newest first
    Created,
    /// Alphabetically by text
    Text,
}

/// Data transfer object for listing wisdom matching a query
///
/// All filters are optional and combined with AND.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WisdomQueryDto {
    /// Only wisdom in this cycle state
    pub state: Option<CycleState>,

    /// Only wisdom in this category
    pub category: Option<String>,

    /// Only favorites (true) or only non-favorites (false)
    pub favorite: Option<bool>,

    /// Case-insensitive substring matched against text and source
    pub search: Option<String>,

    /// Result ordering
    pub sort: SortOrder,
}

impl fmt::Display for WisdomQueryDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(state) = self.state {
            parts.push(format!("state={}", state));
        }
        if let Some(ref category) = self.category {
            parts.push(format!("category={}", category));
        }
        if let Some(favorite) = self.favorite {
            parts.push(format!("favorite={}", favorite));
        }
        if let Some(ref search) = self.search {
            parts.push(format!("search={}", search));
        }
        parts.push(format!("sort={:?}", self.sort));
        write!(f, "{}", parts.join("&"))
    }
}

/// Response for recording an exposure
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExposureResultDto {
    /// False if the wisdom is not active, in which case nothing changed
    pub recorded: bool,

    /// The wisdom as stored after the call
    pub wisdom: Wisdom,
}

/// Response for asking which wisdom to display next
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DisplayDto {
    /// The wisdom to show, None if nothing is active or today's quota is met
    pub wisdom: Option<Wisdom>,

    /// Whether an exposure was recorded for the returned wisdom
    pub recorded: bool,

    /// True if every active wisdom already reached today's target
    pub daily_target_met: bool,
}

/// Data transfer object for triggering a rollover
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
#[serde(default)]
pub struct RolloverRequestDto {
    /// The calendar day to roll over; today's local date if absent
    pub day: Option<NaiveDate>,
}

/// Response for a daily rollover
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RolloverResultDto {
    #[serde(flatten)]
    pub outcome: RolloverOutcome,

    /// Wisdom activated from the queue to replace completed ones
    #[serde(default)]
    pub activated: Vec<Wisdom>,
}

/// Query for activating the next queued wisdom
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ActivateNextQuery {
    pub category: Option<String>,
}

/// Data transfer object for renaming a category
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RenameCategoryDto {
    /// The new name of the category
    pub name: String,
}

/// Per-category counts, one entry per distinct category
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryCountDto {
    pub name: String,
    pub queued: i64,
    pub active: i64,
    pub completed: i64,
    pub total: i64,
}

/// Response for category operations that touch many rows
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedDto {
    pub affected: usize,
}
