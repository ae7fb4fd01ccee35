use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::{Local, Utc};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::dto::{ActivateNextQuery, DisplayDto, ExposureResultDto, RolloverRequestDto, RolloverResultDto};
use crate::errors::ApiError;
use crate::models::Wisdom;
use crate::repo;
use crate::scheduler::CycleSummary;
use crate::worker::refill_from_queue;
use crate::AppState;

/// Loads a wisdom that must exist, mapping absence to 404
fn require_wisdom(state: &AppState, wisdom_id: &str) -> Result<Wisdom, ApiError> {
    repo::get_wisdom(&state.pool, wisdom_id)
        .map_err(ApiError::from_repo)?
        .ok_or(ApiError::NotFound)
}

/// Handler for starting a wisdom's 21-day cycle
///
/// This function handles POST requests to `/wisdom/{id}/activate`.
///
/// ### Returns
///
/// The activated wisdom as JSON, or 404 if it does not exist
#[instrument(skip(state), fields(wisdom_id = %wisdom_id))]
pub async fn activate_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
) -> Result<Json<Wisdom>, ApiError> {
    let updated = repo::activate_wisdom(&state.pool, &wisdom_id)
        .await
        .map_err(ApiError::from_repo)?;

    if updated == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(Json(require_wisdom(&state, &wisdom_id)?))
}

/// Handler for taking a wisdom out of its cycle
///
/// This function handles POST requests to `/wisdom/{id}/deactivate`.
///
/// ### Returns
///
/// The wisdom, now queued, as JSON, or 404 if it does not exist
#[instrument(skip(state), fields(wisdom_id = %wisdom_id))]
pub async fn deactivate_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
) -> Result<Json<Wisdom>, ApiError> {
    let updated = repo::deactivate_wisdom(&state.pool, &wisdom_id)
        .await
        .map_err(ApiError::from_repo)?;

    if updated == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(Json(require_wisdom(&state, &wisdom_id)?))
}

/// Handler for recording that a wisdom was shown
///
/// This function handles POST requests to `/wisdom/{id}/exposures`. A wisdom
/// that is not active is returned unchanged with `recorded` set to false.
#[instrument(skip(state), fields(wisdom_id = %wisdom_id))]
pub async fn record_exposure_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
) -> Result<Json<ExposureResultDto>, ApiError> {
    let recorded = repo::record_exposure(&state.pool, &wisdom_id)
        .await
        .map_err(ApiError::from_repo)?
        > 0;

    let wisdom = require_wisdom(&state, &wisdom_id)?;

    Ok(Json(ExposureResultDto { recorded, wisdom }))
}

/// Handler for listing all active wisdom
///
/// This function handles GET requests to `/active`.
#[instrument(skip(state))]
pub async fn list_active_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Wisdom>>, ApiError> {
    let active = repo::list_active(&state.pool)
        .map_err(ApiError::from_repo)?;

    Ok(Json(active))
}

/// Handler for activating the front of the queue
///
/// This function handles POST requests to `/active/next`, optionally limited
/// to one category with `?category=`.
///
/// ### Returns
///
/// The activated wisdom as JSON, or null if the queue is empty
#[instrument(skip(state))]
pub async fn activate_next_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<ActivateNextQuery>, ApiError>,
) -> Result<Json<Option<Wisdom>>, ApiError> {
    let activated = repo::activate_next_queued(&state.pool, query.category.as_deref())
        .await
        .map_err(ApiError::from_repo)?;

    Ok(Json(activated))
}

/// Handler for looking at the next wisdom to show without recording it
///
/// This function handles GET requests to `/display/next`.
#[instrument(skip(state))]
pub async fn peek_next_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<Wisdom>>, ApiError> {
    let next = repo::peek_next(&state.pool)
        .map_err(ApiError::from_repo)?;

    Ok(Json(next))
}

/// Handler for showing the next wisdom
///
/// This function handles POST requests to `/display/next`. The chosen wisdom
/// gets an exposure recorded; nothing is chosen once today's target is met.
#[instrument(skip(state))]
pub async fn show_next_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DisplayDto>, ApiError> {
    let display = repo::show_next(&state.pool)
        .await
        .map_err(ApiError::from_repo)?;

    if let Some(ref wisdom) = display.wisdom {
        debug!("Showing wisdom {}", wisdom.get_id());
    }

    Ok(Json(display))
}

/// Handler for applying the daily rollover
///
/// This function handles POST requests to `/rollover`. The body is optional;
/// `{"day": "YYYY-MM-DD"}` rolls over a specific day instead of today. Days
/// after today are rejected.
///
/// ### Returns
///
/// What the rollover did, including wisdom activated to replace completed ones
#[instrument(skip(state, body))]
pub async fn rollover_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RolloverResultDto>, ApiError> {
    let request: RolloverRequestDto = if body.iter().all(u8::is_ascii_whitespace) {
        RolloverRequestDto::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidInput(format!("Invalid rollover request: {}", e)))?
    };

    let today = Local::now().date_naive();
    let day = request.day.unwrap_or(today);
    // A logged future day would make every rollover up to it a no-op
    if day > today {
        return Err(ApiError::InvalidInput(format!(
            "Cannot roll over {}, it is after today ({})",
            day, today
        )));
    }
    info!("Rollover requested for {}", day);

    let outcome = repo::daily_rollover_for(&state.pool, day, Utc::now())
        .await
        .map_err(ApiError::from_repo)?;

    let activated = if state.auto_advance && !outcome.skipped {
        refill_from_queue(&state.pool, &outcome.completed_ids)
            .await
            .map_err(ApiError::from_repo)?
    } else {
        Vec::new()
    };

    Ok(Json(RolloverResultDto { outcome, activated }))
}

/// Handler for the per-state counts
///
/// This function handles GET requests to `/summary`.
#[instrument(skip(state))]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleSummary>, ApiError> {
    let summary = repo::cycle_summary(&state.pool)
        .map_err(ApiError::from_repo)?;

    Ok(Json(summary))
}
