//! Repetition scheduling decisions
//!
//! The 21/21 state machine itself is applied by the repository layer as atomic
//! SQL updates (see `repo::cycle_repo`). This module holds the parts of the
//! scheduler that need no database: picking which active wisdom to show next,
//! and the result types the scheduling operations report back.
use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::models::{Wisdom, DAILY_TARGET};

/// Result of one daily rollover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverOutcome {
    /// The calendar day the rollover was requested for
    pub day: NaiveDate,
    /// Active wisdoms that moved on to their next day
    pub advanced: usize,
    /// Wisdoms that finished their 21st day and are now completed
    pub completed: usize,
    /// True if this day had already been rolled over and nothing changed
    pub skipped: bool,
    /// IDs of the wisdoms completed by this rollover
    #[serde(default)]
    pub completed_ids: Vec<String>,
}

/// Counts across the whole collection, for dashboards and status bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleSummary {
    pub queued: i64,
    pub active: i64,
    pub completed: i64,
    /// Sum of today's exposures over all active wisdoms
    pub exposures_today: i64,
    /// Exposures still needed today to hit the daily target on every active wisdom
    pub remaining_today: i64,
}

/// Picks the active wisdom that should be shown next
///
/// The wisdom with the fewest exposures today wins. Ties are broken at random so
/// that wisdoms at the same count take turns. Inactive entries in the slice are
/// ignored.
///
/// ### Returns
///
/// The chosen wisdom, or None if there is nothing active
pub fn select_next_for_display(active: &[Wisdom]) -> Option<&Wisdom> {
    let min = active
        .iter()
        .filter(|w| w.is_active())
        .map(|w| w.get_exposures_today())
        .min()?;

    let candidates: Vec<&Wisdom> = active
        .iter()
        .filter(|w| w.is_active() && w.get_exposures_today() == min)
        .collect();

    candidates.choose(&mut rand::rng()).copied()
}

/// True once a wisdom has been shown the full daily target today
pub fn daily_target_met(wisdom: &Wisdom) -> bool {
    wisdom.get_exposures_today() >= DAILY_TARGET
}
