use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::dto::{CreateWisdomDto, SetFavoriteDto, UpdateWisdomDto, WisdomQueryDto};
use crate::errors::ApiError;
use crate::models::Wisdom;
use crate::repo;
use crate::AppState;

/// Handler for creating a new wisdom
///
/// This function handles POST requests to `/wisdom`.
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `payload` - The text, source and category of the new wisdom
///
/// ### Returns
///
/// The newly created wisdom as JSON
#[instrument(skip(state, payload), fields(category = ?payload.category))]
pub async fn create_wisdom_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateWisdomDto>, ApiError>,
) -> Result<Json<Wisdom>, ApiError> {
    info!("Creating new wisdom");

    if payload.text.trim().is_empty() {
        return Err(ApiError::InvalidInput("Wisdom text must not be empty".to_string()));
    }

    let wisdom = repo::create_wisdom(
        &state.pool,
        payload.text,
        payload.source,
        payload.category,
        &state.default_category,
    )
    .await
    .map_err(ApiError::from_repo)?;

    info!("Successfully created wisdom with id: {}", wisdom.get_id());

    Ok(Json(wisdom))
}

/// Handler for retrieving a specific wisdom
///
/// This function handles GET requests to `/wisdom/{id}`.
///
/// ### Returns
///
/// The requested wisdom as JSON, or null if not found
#[instrument(skip(state), fields(wisdom_id = %wisdom_id))]
pub async fn get_wisdom_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
) -> Result<Json<Option<Wisdom>>, ApiError> {
    debug!("Retrieving wisdom");

    let wisdom = repo::get_wisdom(&state.pool, &wisdom_id)
        .map_err(ApiError::from_repo)?;

    Ok(Json(wisdom))
}

/// Handler for listing wisdom
///
/// This function handles GET requests to `/wisdom`, filtered by the query
/// parameters `state`, `category`, `favorite`, `search` and `sort`.
///
/// ### Returns
///
/// The matching wisdom as a JSON array
#[instrument(skip(state, query), fields(query = %query))]
pub async fn list_wisdom_handler(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<WisdomQueryDto>, ApiError>,
) -> Result<Json<Vec<Wisdom>>, ApiError> {
    debug!("Listing wisdom");

    let wisdom = repo::list_wisdom(&state.pool, &query)
        .map_err(ApiError::from_repo)?;

    debug!("Returning {} wisdom", wisdom.len());
    Ok(Json(wisdom))
}

/// Handler for editing the text, source or category of a wisdom
///
/// This function handles PATCH requests to `/wisdom/{id}`.
///
/// ### Returns
///
/// The updated wisdom as JSON, or 404 if it does not exist
#[instrument(skip(state, payload), fields(wisdom_id = %wisdom_id))]
pub async fn update_wisdom_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateWisdomDto>, ApiError>,
) -> Result<Json<Wisdom>, ApiError> {
    info!("Updating wisdom");

    if payload.text.as_ref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::InvalidInput("Wisdom text must not be empty".to_string()));
    }

    let wisdom = repo::update_wisdom(&state.pool, &wisdom_id, payload, &state.default_category)
        .await
        .map_err(ApiError::from_repo)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(wisdom))
}

/// Handler for deleting a specific wisdom
///
/// This function handles DELETE requests to `/wisdom/{id}`.
#[instrument(skip(state), fields(wisdom_id = %wisdom_id))]
pub async fn delete_wisdom_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
) -> Result<Json<()>, ApiError> {
    info!("Deleting wisdom");

    let deleted = repo::delete_wisdom(&state.pool, &wisdom_id)
        .await
        .map_err(ApiError::from_repo)?;

    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    Ok(Json(()))
}

/// Handler for marking or unmarking a favorite
///
/// This function handles PUT requests to `/wisdom/{id}/favorite`.
///
/// ### Returns
///
/// The updated wisdom as JSON
#[instrument(skip(state), fields(wisdom_id = %wisdom_id, favorite = payload.favorite))]
pub async fn set_favorite_handler(
    State(state): State<Arc<AppState>>,
    Path(wisdom_id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<SetFavoriteDto>, ApiError>,
) -> Result<Json<Wisdom>, ApiError> {
    let updated = repo::set_favorite(&state.pool, &wisdom_id, payload.favorite)
        .await
        .map_err(ApiError::from_repo)?;

    if updated == 0 {
        return Err(ApiError::NotFound);
    }

    let wisdom = repo::get_wisdom(&state.pool, &wisdom_id)
        .map_err(ApiError::from_repo)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(wisdom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{json, query, setup_test_state};
    use crate::models::DEFAULT_CATEGORY;

    fn create_dto(text: &str) -> CreateWisdomDto {
        CreateWisdomDto { text: text.to_string(), source: None, category: None }
    }

    #[tokio::test]
    async fn test_create_wisdom_handler() {
        let state = setup_test_state(false);

        let result = create_wisdom_handler(State(state.clone()), json(create_dto("Memento mori")))
            .await
            .unwrap();

        let wisdom = result.0;
        assert_eq!(wisdom.get_text(), "Memento mori");
        assert_eq!(wisdom.get_category(), DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_create_wisdom_handler_blank_text() {
        let state = setup_test_state(false);

        let result = create_wisdom_handler(State(state), json(create_dto("   "))).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_get_wisdom_handler_not_found() {
        let state = setup_test_state(false);

        let result = get_wisdom_handler(State(state), Path("nonexistent".to_string()))
            .await
            .unwrap();
        assert!(result.0.is_none());
    }

    #[tokio::test]
    async fn test_list_wisdom_handler() {
        let state = setup_test_state(false);
        create_wisdom_handler(State(state.clone()), json(create_dto("one"))).await.unwrap();
        create_wisdom_handler(State(state.clone()), json(create_dto("two"))).await.unwrap();

        let result = list_wisdom_handler(State(state), query(WisdomQueryDto::default()))
            .await
            .unwrap();
        assert_eq!(result.0.len(), 2);
    }

    #[tokio::test]
    async fn test_update_wisdom_handler_not_found() {
        let state = setup_test_state(false);

        let update = UpdateWisdomDto { text: Some("text".to_string()), ..Default::default() };
        let result = update_wisdom_handler(State(state), Path("nonexistent".to_string()), json(update)).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_wisdom_handler() {
        let state = setup_test_state(false);
        let wisdom = create_wisdom_handler(State(state.clone()), json(create_dto("text")))
            .await
            .unwrap()
            .0;

        delete_wisdom_handler(State(state.clone()), Path(wisdom.get_id())).await.unwrap();

        let again = delete_wisdom_handler(State(state), Path(wisdom.get_id())).await;
        assert!(matches!(again, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_favorite_handler() {
        let state = setup_test_state(false);
        let wisdom = create_wisdom_handler(State(state.clone()), json(create_dto("text")))
            .await
            .unwrap()
            .0;

        let updated = set_favorite_handler(
            State(state.clone()),
            Path(wisdom.get_id()),
            json(SetFavoriteDto { favorite: true }),
        )
        .await
        .unwrap()
        .0;
        assert!(updated.is_favorite());

        let missing = set_favorite_handler(
            State(state),
            Path("nonexistent".to_string()),
            json(SetFavoriteDto { favorite: true }),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::NotFound)));
    }
}
