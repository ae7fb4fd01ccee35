use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CycleState, CYCLE_DAYS, DAILY_TARGET};

/// A short piece of text the user wants to internalize
///
/// This struct maps directly to the `wisdom` table in the database. Besides the
/// content itself it carries the whole 21/21 cycle state: whether the wisdom is
/// active, which day of the cycle it is on and how often it was shown.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::wisdom)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Wisdom {
    /// Unique identifier for the wisdom (UUID v4 as string)
    id: String,

    /// The content to internalize
    text: String,

    /// Optional attribution (author, book, ...)
    source: Option<String>,

    /// Free-text category label
    category: String,

    /// When this wisdom was created
    date_created: NaiveDateTime,

    /// Whether the user marked this wisdom as a favorite
    is_favorite: bool,

    /// True exactly while the wisdom is in its 21-day cycle
    is_active: bool,

    /// When the current cycle started
    start_date: Option<NaiveDateTime>,

    /// Day of the cycle, 0 before a cycle and at most 21
    current_day: i32,

    /// Exposures recorded since the last daily rollover
    exposures_today: i32,

    /// Exposures recorded since the cycle started
    exposures_total: i32,

    /// When this wisdom was last shown
    last_exposure_time: Option<NaiveDateTime>,

    /// When the last cycle finished naturally
    date_completed: Option<NaiveDateTime>,

    /// Position within its category's queue, lower comes first
    queue_position: i32,
}

impl Wisdom {
    /// Creates a new, queued wisdom
    ///
    /// A UUID v4 is generated for the ID and the creation date is set to now.
    /// The wisdom starts outside of any cycle with all counters at zero.
    ///
    /// ### Arguments
    ///
    /// * `text` - The content of the wisdom
    /// * `source` - Optional attribution
    /// * `category` - The category the wisdom is filed under
    /// * `queue_position` - Where the wisdom sits in its category queue
    pub fn new(text: String, source: Option<String>, category: String, queue_position: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            source,
            category,
            date_created: Utc::now().naive_utc(),
            is_favorite: false,
            is_active: false,
            start_date: None,
            current_day: 0,
            exposures_today: 0,
            exposures_total: 0,
            last_exposure_time: None,
            date_completed: None,
            queue_position,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_text(&self) -> String {
        self.text.clone()
    }

    pub fn get_source(&self) -> Option<String> {
        self.source.clone()
    }

    pub fn get_category(&self) -> String {
        self.category.clone()
    }

    /// Gets the creation timestamp as a DateTime<Utc>
    pub fn get_date_created(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.date_created, Utc)
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    pub fn get_current_day(&self) -> i32 {
        self.current_day
    }

    pub fn get_exposures_today(&self) -> i32 {
        self.exposures_today
    }

    pub fn get_exposures_total(&self) -> i32 {
        self.exposures_total
    }

    pub fn get_last_exposure_time(&self) -> Option<DateTime<Utc>> {
        self.last_exposure_time.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    pub fn get_date_completed(&self) -> Option<DateTime<Utc>> {
        self.date_completed.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }

    pub fn get_queue_position(&self) -> i32 {
        self.queue_position
    }

    /// Gets the cycle state derived from `is_active` and `date_completed`
    pub fn get_state(&self) -> CycleState {
        CycleState::from_flags(self.is_active, self.date_completed.is_some())
    }

    /// Exposures still owed today, zero once the daily target is met
    pub fn remaining_today(&self) -> i32 {
        if !self.is_active {
            return 0;
        }
        (DAILY_TARGET - self.exposures_today).max(0)
    }

    /// Days left in the cycle including today, zero outside a cycle
    pub fn remaining_days(&self) -> i32 {
        if !self.is_active {
            return 0;
        }
        (CYCLE_DAYS - self.current_day + 1).max(0)
    }

    /// Overrides the cycle counters, for building fixtures in unit tests
    #[cfg(test)]
    pub(crate) fn with_progress(mut self, is_active: bool, current_day: i32, exposures_today: i32) -> Self {
        self.is_active = is_active;
        self.current_day = current_day;
        self.exposures_today = exposures_today;
        self
    }
}


#[cfg(test)]
mod prop_tests;
