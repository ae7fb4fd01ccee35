use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a wisdom currently is in its 21/21 cycle
///
/// The state is not stored directly. It is derived from `is_active` and
/// `date_completed`, see [`CycleState::from_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    /// Waiting in its category queue, never started or reset
    Queued,
    /// Mid-cycle, being shown every day
    Active,
    /// Finished all 21 days
    Completed,
}

impl CycleState {
    /// Derives the state from the stored flags
    ///
    /// An active row is always `Active`, even if a stale completion date were
    /// present; the schema forbids that combination anyway.
    pub fn from_flags(is_active: bool, completed: bool) -> Self {
        match (is_active, completed) {
            (true, _) => CycleState::Active,
            (false, true) => CycleState::Completed,
            (false, false) => CycleState::Queued,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Queued => "queued",
            CycleState::Active => "active",
            CycleState::Completed => "completed",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(CycleState::Queued),
            "active" => Ok(CycleState::Active),
            "completed" => Ok(CycleState::Completed),
            other => Err(format!("Unknown cycle state: {}", other)),
        }
    }
}
