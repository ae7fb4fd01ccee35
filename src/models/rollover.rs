use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Record of a daily rollover that has been applied
///
/// Maps to the `rollovers` table. There is at most one row per calendar day,
/// which is what makes running the rollover twice on the same day harmless.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::rollovers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Rollover {
    /// The calendar day this rollover belongs to
    pub day: NaiveDate,

    /// When the rollover actually ran
    pub performed_at: NaiveDateTime,

    /// How many active wisdoms moved on to their next day
    pub advanced: i32,

    /// How many wisdoms finished their cycle
    pub completed: i32,
}
