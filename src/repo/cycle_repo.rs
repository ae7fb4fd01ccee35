use crate::db::{retry_on_busy, DbPool};
use crate::dto::DisplayDto;
use crate::models::{Rollover, Wisdom, CYCLE_DAYS, DAILY_TARGET};
use crate::repo::wisdom_repo::{get_wisdom, next_queue_position};
use crate::scheduler::{daily_target_met, select_next_for_display, CycleSummary, RolloverOutcome};
use crate::schema::{rollovers, wisdom};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use anyhow::Result;
use tracing::{instrument, debug, info};

/// Puts a single row into a fresh cycle: day 1, all counters zeroed
fn start_cycle(conn: &mut SqliteConnection, wisdom_id: &str, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(wisdom::table.find(wisdom_id))
        .set((
            wisdom::is_active.eq(true),
            wisdom::start_date.eq(Some(now)),
            wisdom::current_day.eq(1),
            wisdom::exposures_today.eq(0),
            wisdom::exposures_total.eq(0),
            wisdom::date_completed.eq(None::<NaiveDateTime>),
        ))
        .execute(conn)
}

/// Starts a new 21-day cycle for a wisdom
///
/// Works from any state. Activating an active wisdom restarts its cycle, and
/// activating a completed one clears the completion date.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `wisdom_id` - The ID of the wisdom to activate
///
/// ### Returns
///
/// The number of updated rows, 0 if no wisdom has that ID
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database update fails
#[instrument(skip(pool))]
pub async fn activate_wisdom(pool: &DbPool, wisdom_id: &str) -> Result<usize> {
    debug!("Activating wisdom");

    let mut conn = pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = retry_on_busy(|| start_cycle(&mut conn, wisdom_id, now)).await?;

    if updated > 0 {
        info!("Activated wisdom {}", wisdom_id);
    }
    Ok(updated)
}

/// Records that an active wisdom has just been shown
///
/// Both counters are incremented inside SQL, so concurrent calls never lose an
/// exposure. Wisdom that is not active is left untouched.
///
/// ### Returns
///
/// The number of updated rows; 0 if the wisdom is missing or not active
#[instrument(skip(pool))]
pub async fn record_exposure(pool: &DbPool, wisdom_id: &str) -> Result<usize> {
    let updated = increment_exposures(pool, wisdom_id, i32::MAX).await?;

    if updated == 0 {
        debug!("Exposure ignored, wisdom is missing or not active");
    }
    Ok(updated)
}

/// Increments both exposure counters of an active wisdom that was shown fewer
/// than `below` times today
async fn increment_exposures(pool: &DbPool, wisdom_id: &str, below: i32) -> Result<usize> {
    let mut conn = pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = retry_on_busy(|| {
        diesel::update(
            wisdom::table
                .find(wisdom_id)
                .filter(wisdom::is_active.eq(true))
                .filter(wisdom::exposures_today.lt(below)),
        )
        .set((
            wisdom::exposures_today.eq(wisdom::exposures_today + 1),
            wisdom::exposures_total.eq(wisdom::exposures_total + 1),
            wisdom::last_exposure_time.eq(Some(now)),
        ))
        .execute(&mut conn)
    })
    .await?;

    Ok(updated)
}

/// Applies the daily rollover for today's local date
///
/// See [`daily_rollover_for`].
pub async fn daily_rollover(pool: &DbPool) -> Result<RolloverOutcome> {
    daily_rollover_for(pool, Local::now().date_naive(), Utc::now()).await
}

/// Applies the daily rollover for a given calendar day
///
/// In a single transaction:
/// 1. every active wisdom that is on day 21 or later is completed
/// 2. every other active wisdom moves to its next day with today's exposures reset
/// 3. the day is written to the rollover log
///
/// Completion looks at the state before this rollover, so a wisdom moving onto
/// day 21 still gets its 21st day. A day that is not after the last logged
/// rollover is skipped, which makes repeated calls harmless.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `day` - The calendar day being rolled over
/// * `now` - Timestamp recorded as completion and log time
///
/// ### Returns
///
/// What the rollover did, with `skipped` set if nothing changed
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - Any statement of the transaction fails, in which case nothing is applied
#[instrument(skip(pool, now))]
pub async fn daily_rollover_for(pool: &DbPool, day: NaiveDate, now: DateTime<Utc>) -> Result<RolloverOutcome> {
    debug!("Running daily rollover");

    let mut conn = pool.get()?;
    let now = now.naive_utc();

    let outcome = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let last: Option<NaiveDate> = rollovers::table
                .select(max(rollovers::day))
                .first(conn)?;

            if last.is_some_and(|last| last >= day) {
                return Ok(RolloverOutcome {
                    day,
                    advanced: 0,
                    completed: 0,
                    skipped: true,
                    completed_ids: Vec::new(),
                });
            }

            let finishing = wisdom::table
                .filter(wisdom::is_active.eq(true))
                .filter(wisdom::current_day.ge(CYCLE_DAYS));

            let completed_ids: Vec<String> = finishing.clone().select(wisdom::id).load(conn)?;

            let completed = diesel::update(finishing)
                .set((
                    wisdom::is_active.eq(false),
                    wisdom::date_completed.eq(Some(now)),
                ))
                .execute(conn)?;

            let advanced = diesel::update(
                wisdom::table
                    .filter(wisdom::is_active.eq(true))
                    .filter(wisdom::current_day.lt(CYCLE_DAYS)),
            )
            .set((
                wisdom::exposures_today.eq(0),
                wisdom::current_day.eq(wisdom::current_day + 1),
            ))
            .execute(conn)?;

            diesel::insert_into(rollovers::table)
                .values(&Rollover {
                    day,
                    performed_at: now,
                    advanced: advanced as i32,
                    completed: completed as i32,
                })
                .execute(conn)?;

            Ok::<_, diesel::result::Error>(RolloverOutcome {
                day,
                advanced,
                completed,
                skipped: false,
                completed_ids,
            })
        })
    })
    .await?;

    if outcome.skipped {
        debug!("Rollover for {} already applied", day);
    } else {
        info!(
            "Rolled over {}: {} advanced, {} completed",
            day, outcome.advanced, outcome.completed
        );
    }

    Ok(outcome)
}

/// Takes a wisdom out of its cycle and back into the queue
///
/// All cycle fields are cleared and the wisdom goes to the end of its
/// category's queue. A completed wisdom becomes queued again.
///
/// ### Returns
///
/// The number of updated rows, 0 if no wisdom has that ID
#[instrument(skip(pool))]
pub async fn deactivate_wisdom(pool: &DbPool, wisdom_id: &str) -> Result<usize> {
    debug!("Deactivating wisdom");

    let mut conn = pool.get()?;

    let updated = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let Some(category) = wisdom::table
                .find(wisdom_id)
                .select(wisdom::category)
                .first::<String>(conn)
                .optional()?
            else {
                return Ok(0);
            };

            let position = next_queue_position(conn, &category)?;

            diesel::update(wisdom::table.find(wisdom_id))
                .set((
                    wisdom::is_active.eq(false),
                    wisdom::start_date.eq(None::<NaiveDateTime>),
                    wisdom::current_day.eq(0),
                    wisdom::exposures_today.eq(0),
                    wisdom::exposures_total.eq(0),
                    wisdom::date_completed.eq(None::<NaiveDateTime>),
                    wisdom::queue_position.eq(position),
                ))
                .execute(conn)
        })
    })
    .await?;

    if updated > 0 {
        info!("Deactivated wisdom {}", wisdom_id);
    }
    Ok(updated)
}

/// Lists every wisdom currently in its cycle, by category then queue position
#[instrument(skip(pool))]
pub fn list_active(pool: &DbPool) -> Result<Vec<Wisdom>> {
    let conn = &mut pool.get()?;

    let active = wisdom::table
        .filter(wisdom::is_active.eq(true))
        .order_by(wisdom::category.asc())
        .then_order_by(wisdom::queue_position.asc())
        .load::<Wisdom>(conn)?;

    debug!("Found {} active wisdom", active.len());
    Ok(active)
}

/// Activates the queued wisdom at the front of the queue
///
/// Only wisdom that is neither active nor completed is considered. With a
/// category the front of that category's queue is taken, otherwise the lowest
/// queue position across all categories, oldest first on ties.
///
/// ### Returns
///
/// The activated wisdom, or None if the queue is empty
#[instrument(skip(pool))]
pub async fn activate_next_queued(pool: &DbPool, category: Option<&str>) -> Result<Option<Wisdom>> {
    let mut conn = pool.get()?;
    let now = Utc::now().naive_utc();

    let activated = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let mut next = wisdom::table
                .select(wisdom::id)
                .filter(wisdom::is_active.eq(false))
                .filter(wisdom::date_completed.is_null())
                .into_boxed();

            if let Some(category) = category {
                next = next.filter(wisdom::category.eq(category));
            }

            let Some(next_id) = next
                .order_by(wisdom::queue_position.asc())
                .then_order_by(wisdom::date_created.asc())
                .first::<String>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            start_cycle(conn, &next_id, now)?;

            wisdom::table.find(&next_id).first::<Wisdom>(conn).optional()
        })
    })
    .await?;

    match &activated {
        Some(wisdom) => info!("Activated next queued wisdom {}", wisdom.get_id()),
        None => debug!("No queued wisdom to activate"),
    }
    Ok(activated)
}

/// Returns the wisdom that would be shown next, without recording anything
#[instrument(skip(pool))]
pub fn peek_next(pool: &DbPool) -> Result<Option<Wisdom>> {
    let active = list_active(pool)?;
    Ok(select_next_for_display(&active).cloned())
}

/// Picks the next wisdom to show and records the exposure
///
/// Nothing is shown once the chosen wisdom has met the daily target. Since the
/// wisdom with the fewest exposures is chosen, that means every active wisdom
/// has met it.
///
/// ### Returns
///
/// The wisdom as stored after the exposure, if any was shown
///
/// ### Errors
///
/// Returns an error if reading the active wisdom or recording the exposure fails
#[instrument(skip(pool))]
pub async fn show_next(pool: &DbPool) -> Result<DisplayDto> {
    loop {
        let active = list_active(pool)?;

        let Some(chosen) = select_next_for_display(&active) else {
            debug!("Nothing active to show");
            return Ok(DisplayDto { wisdom: None, recorded: false, daily_target_met: false });
        };

        if daily_target_met(chosen) {
            debug!("Daily target met for all active wisdom");
            return Ok(DisplayDto { wisdom: None, recorded: false, daily_target_met: true });
        }

        // Applies only below the target; a concurrent caller may have taken the last slot
        let chosen_id = chosen.get_id();
        if increment_exposures(pool, &chosen_id, DAILY_TARGET).await? > 0 {
            let wisdom = get_wisdom(pool, &chosen_id)?;
            return Ok(DisplayDto { wisdom, recorded: true, daily_target_met: false });
        }

        debug!("Wisdom changed before its exposure was recorded, choosing again");
    }
}

/// Counts wisdom per cycle state and sums up today's exposures
#[instrument(skip(pool))]
pub fn cycle_summary(pool: &DbPool) -> Result<CycleSummary> {
    let conn = &mut pool.get()?;

    let rows = wisdom::table
        .select((
            wisdom::is_active,
            wisdom::date_completed.is_not_null(),
            wisdom::exposures_today,
        ))
        .load::<(bool, bool, i32)>(conn)?;

    let summary = rows.into_iter().fold(CycleSummary::default(), |mut summary, (is_active, completed, exposures)| {
        if is_active {
            summary.active += 1;
            summary.exposures_today += i64::from(exposures);
            summary.remaining_today += i64::from((DAILY_TARGET - exposures).max(0));
        } else if completed {
            summary.completed += 1;
        } else {
            summary.queued += 1;
        }
        summary
    });

    Ok(summary)
}

/// Returns the most recent entry of the rollover log
#[instrument(skip(pool))]
pub fn last_rollover(pool: &DbPool) -> Result<Option<Rollover>> {
    let conn = &mut pool.get()?;

    let last = rollovers::table
        .order_by(rollovers::day.desc())
        .first::<Rollover>(conn)
        .optional()?;

    Ok(last)
}

/// Logs `day` as rolled over without touching any wisdom, if the log is empty
///
/// Gives a fresh database a starting point so the first rollover happens when
/// the calendar day changes rather than immediately.
///
/// ### Returns
///
/// True if the baseline was written, false if the log already had entries
#[instrument(skip(pool, now))]
pub async fn mark_rollover_baseline(pool: &DbPool, day: NaiveDate, now: DateTime<Utc>) -> Result<bool> {
    let mut conn = pool.get()?;
    let now = now.naive_utc();

    let written = retry_on_busy(|| {
        conn.immediate_transaction(|conn| {
            let existing: i64 = rollovers::table.count().get_result(conn)?;
            if existing > 0 {
                return Ok(false);
            }

            diesel::insert_into(rollovers::table)
                .values(&Rollover { day, performed_at: now, advanced: 0, completed: 0 })
                .execute(conn)?;
            Ok::<_, diesel::result::Error>(true)
        })
    })
    .await?;

    if written {
        info!("Recorded rollover baseline for {}", day);
    }
    Ok(written)
}
