//! Background rollover worker
//!
//! Checks on a fixed interval whether the local calendar day has changed and,
//! if so, applies the daily rollover. The worker is owned by whoever starts it:
//! [`RolloverWorker::shutdown`] stops it and waits for the current tick to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::db::DbPool;
use crate::dto::RolloverResultDto;
use crate::models::Wisdom;
use crate::repo;

/// Handle to a running rollover worker
pub struct RolloverWorker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RolloverWorker {
    /// Signals the worker to stop and waits until it has
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Rollover worker ended abnormally: {}", e);
        }
    }
}

/// Starts the rollover worker on the current tokio runtime
///
/// A fresh database gets today's date as its baseline, so the first real
/// rollover happens when the day changes. Errors during a tick are logged and
/// the tick is retried on the next interval.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `check_interval` - How often to look at the clock
/// * `auto_advance` - Replace completed wisdom with the next queued one of its category
pub fn start_rollover_worker(pool: Arc<DbPool>, check_interval: Duration, auto_advance: bool) -> RolloverWorker {
    let (tx, mut rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!("Rollover worker started, checking every {:?}", check_interval);

        let today = Local::now().date_naive();
        if let Err(e) = repo::mark_rollover_baseline(&pool, today, Utc::now()).await {
            error!("Failed to record rollover baseline: {:#}", e);
        }

        let mut interval = tokio::time::interval(check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let today = Local::now().date_naive();
                    if let Err(e) = run_tick(&pool, today, auto_advance).await {
                        error!("Rollover check failed, retrying next tick: {:#}", e);
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Rollover worker stopped");
    });

    RolloverWorker { shutdown: tx, handle }
}

/// Applies the rollover for `today` unless it is already in the log
///
/// A gap of several days is caught up by a single rollover.
///
/// ### Returns
///
/// The rollover result, or None if there was nothing to do
#[instrument(skip(pool))]
pub async fn run_tick(pool: &DbPool, today: NaiveDate, auto_advance: bool) -> Result<Option<RolloverResultDto>> {
    if repo::last_rollover(pool)?.is_some_and(|last| last.day >= today) {
        debug!("Already rolled over for {}", today);
        return Ok(None);
    }

    let outcome = repo::daily_rollover_for(pool, today, Utc::now()).await?;
    if outcome.skipped {
        return Ok(None);
    }

    let activated = if auto_advance {
        refill_from_queue(pool, &outcome.completed_ids).await?
    } else {
        Vec::new()
    };

    Ok(Some(RolloverResultDto { outcome, activated }))
}

/// Activates one queued wisdom per completed one, from the same category
///
/// Categories whose queue is empty are skipped.
///
/// ### Returns
///
/// The wisdom that was activated
#[instrument(skip(pool, completed_ids), fields(completed = completed_ids.len()))]
pub async fn refill_from_queue(pool: &DbPool, completed_ids: &[String]) -> Result<Vec<Wisdom>> {
    let mut activated = Vec::new();

    for completed_id in completed_ids {
        let Some(completed) = repo::get_wisdom(pool, completed_id)? else {
            continue;
        };

        if let Some(next) = repo::activate_next_queued(pool, Some(&completed.get_category())).await? {
            info!("Replaced completed wisdom {} with {}", completed_id, next.get_id());
            activated.push(next);
        }
    }

    Ok(activated)
}
