/// Data models module
///
/// This module defines the core data structures used throughout the application:
/// the `Wisdom` entity that maps to the `wisdom` table, the record of applied daily
/// rollovers, and the constants of the 21/21 repetition rule.

mod cycle_state;
pub use cycle_state::CycleState;

mod wisdom;
pub use wisdom::Wisdom;

mod rollover;
pub use rollover::Rollover;

/// Number of times an active wisdom should be shown per day
pub const DAILY_TARGET: i32 = 21;

/// Number of days in a full repetition cycle
pub const CYCLE_DAYS: i32 = 21;

/// Category assigned to wisdom created without one
///
/// This is only the default of the `default_category` configuration field; the
/// repository functions always receive the category to fall back to explicitly.
pub const DEFAULT_CATEGORY: &str = "General";
