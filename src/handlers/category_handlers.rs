use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use tracing::{instrument, info};

use crate::dto::{AffectedDto, CategoryCountDto, RenameCategoryDto};
use crate::errors::ApiError;
use crate::repo;
use crate::AppState;

/// Handler for listing categories with their counts
///
/// This function handles GET requests to `/categories`.
#[instrument(skip(state))]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryCountDto>>, ApiError> {
    let categories = repo::list_categories(&state.pool)
        .map_err(ApiError::from_repo)?;

    Ok(Json(categories))
}

/// Handler for renaming a category
///
/// This function handles PUT requests to `/categories/{name}` with the new
/// name in the body. Renaming onto an existing category merges the two.
///
/// ### Returns
///
/// How many wisdom were moved
#[instrument(skip(state, payload), fields(to = %payload.name))]
pub async fn rename_category_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<RenameCategoryDto>, ApiError>,
) -> Result<Json<AffectedDto>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Category name must not be empty".to_string()));
    }

    let affected = repo::rename_category(&state.pool, &name, &payload.name)
        .await
        .map_err(ApiError::from_repo)?;

    info!("Renamed category, {} wisdom moved", affected);
    Ok(Json(AffectedDto { affected }))
}

/// Handler for deleting a category
///
/// This function handles DELETE requests to `/categories/{name}`. Its wisdom
/// moves to the default category, which itself cannot be deleted.
#[instrument(skip(state))]
pub async fn delete_category_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AffectedDto>, ApiError> {
    if name == state.default_category {
        return Err(ApiError::InvalidState("The default category cannot be deleted".to_string()));
    }

    let affected = repo::delete_category(&state.pool, &name, &state.default_category)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(Json(AffectedDto { affected }))
}
