//! wisdom21: the 21/21 wisdom repetition scheduler
//!
//! Short pieces of text ("wisdom") are internalized by showing each active one
//! 21 times a day for 21 days. This library stores the wisdom in SQLite, drives
//! every wisdom through its cycle and exposes the whole thing as a JSON API.
//!
//! ### Modules
//!
//! - `config`: Layered configuration (defaults, TOML file, environment and flags)
//! - `db`: Connection pool, migrations and lock retries
//! - `models`: The `Wisdom` entity and the constants of the 21/21 rule
//! - `scheduler`: Next-wisdom selection and scheduling results
//! - `repo`: Repository layer for database operations
//! - `handlers`: Axum handlers for the web API
//! - `worker`: Background task that applies the daily rollover
//!
//! ### Web API
//!
//! - `POST /wisdom`, `GET /wisdom`: Create and list wisdom
//! - `GET|PATCH|DELETE /wisdom/{id}`: Read, edit and delete one wisdom
//! - `PUT /wisdom/{id}/favorite`: Mark or unmark a favorite
//! - `POST /wisdom/{id}/activate`, `POST /wisdom/{id}/deactivate`: Start or leave a cycle
//! - `POST /wisdom/{id}/exposures`: Record that a wisdom was shown
//! - `GET /active`, `POST /active/next`: Active wisdom and activating from the queue
//! - `GET|POST /display/next`: Peek at or show the next wisdom
//! - `POST /rollover`: Apply the daily rollover
//! - `GET /summary`: Counts per cycle state
//! - `GET /categories`, `PUT|DELETE /categories/{name}`: Category management

pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repo;
pub mod scheduler;
pub mod schema;
pub mod worker;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::db::DbPool;
use crate::handlers::*;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection pool
    pub pool: Arc<DbPool>,
    /// Category used for wisdom created without one
    pub default_category: String,
    /// Whether a completed wisdom is replaced from its category queue
    pub auto_advance: bool,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, config: &Config) -> Self {
        Self {
            pool,
            default_category: config.default_category.clone(),
            auto_advance: config.auto_advance,
        }
    }
}

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The shared state, holding the pool and the scheduling settings
///
/// ### Returns
///
/// An Axum Router configured with all routes and the state attached
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        // Wisdom management
        .route("/wisdom", post(create_wisdom_handler).get(list_wisdom_handler))
        .route(
            "/wisdom/{id}",
            get(get_wisdom_handler)
                .patch(update_wisdom_handler)
                .delete(delete_wisdom_handler),
        )
        .route("/wisdom/{id}/favorite", put(set_favorite_handler))
        // Cycle of a single wisdom
        .route("/wisdom/{id}/activate", post(activate_handler))
        .route("/wisdom/{id}/deactivate", post(deactivate_handler))
        .route("/wisdom/{id}/exposures", post(record_exposure_handler))
        // Scheduling across all wisdom
        .route("/active", get(list_active_handler))
        .route("/active/next", post(activate_next_handler))
        .route("/display/next", get(peek_next_handler).post(show_next_handler))
        .route("/rollover", post(rollover_handler))
        .route("/summary", get(summary_handler))
        // Categories
        .route("/categories", get(list_categories_handler))
        .route(
            "/categories/{name}",
            put(rename_category_handler).delete(delete_category_handler),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
