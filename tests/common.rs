#![allow(dead_code)]

/// Common test utilities for wisdom21 integration tests
///
/// This file contains shared functions for all integration tests: building a
/// test application on a fresh database and small wrappers around the requests
/// the tests send over and over.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service;
use wisdom21::{
    create_app,
    db::{init_pool, run_migrations},
    models::{Wisdom, DEFAULT_CATEGORY},
    AppState,
};

/// Creates a test application with an in-memory SQLite database
///
/// This helper function:
/// 1. Creates a uniquely named shared in-memory SQLite database
/// 2. Runs migrations to set up the schema
/// 3. Creates an Axum application on top of it
///
/// Every call gets its own database, so tests are isolated from each other and
/// no cleanup is needed.
///
/// ### Arguments
///
/// * `auto_advance` - Whether completed wisdom is replaced from its category queue
///
/// ### Returns
///
/// An Axum Router configured with all routes
pub fn create_test_app_with(auto_advance: bool) -> Router {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());

    let conn = &mut pool.get().unwrap();
    run_migrations(conn).unwrap();

    create_app(Arc::new(AppState {
        pool: pool.clone(),
        default_category: DEFAULT_CATEGORY.to_string(),
        auto_advance,
    }))
}

/// Creates a test application with auto-advance turned off
pub fn create_test_app() -> Router {
    create_test_app_with(false)
}

/// Sends a request and returns the status with the parsed JSON body
///
/// An empty body is returned as `Value::Null`.
///
/// ### Arguments
///
/// * `app` - The test application
/// * `method` - HTTP method
/// * `uri` - Request path including any query string
/// * `body` - Optional JSON body
pub async fn send(app: &mut Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.call(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates a wisdom via the API
///
/// This helper function:
/// 1. Sends a POST request to /wisdom with the provided fields
/// 2. Verifies the response has a 200 OK status
/// 3. Parses and returns the created Wisdom
pub async fn create_wisdom(app: &mut Router, text: &str, source: Option<&str>, category: Option<&str>) -> Wisdom {
    let (status, body) = send(
        app,
        "POST",
        "/wisdom",
        Some(json!({
            "text": text,
            "source": source,
            "category": category,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

/// Fetches a wisdom via the API, None if it does not exist
pub async fn get_wisdom(app: &mut Router, id: &str) -> Option<Wisdom> {
    let (status, body) = send(app, "GET", &format!("/wisdom/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

/// Starts the cycle of a wisdom via the API
pub async fn activate(app: &mut Router, id: &str) -> Wisdom {
    let (status, body) = send(app, "POST", &format!("/wisdom/{}/activate", id), None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

/// Records one exposure via the API and returns the JSON result
pub async fn expose(app: &mut Router, id: &str) -> Value {
    let (status, body) = send(app, "POST", &format!("/wisdom/{}/exposures", id), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

/// Applies the rollover for an explicit day (YYYY-MM-DD) via the API
pub async fn rollover(app: &mut Router, day: &str) -> Value {
    let (status, body) = send(app, "POST", "/rollover", Some(json!({ "day": day }))).await;
    assert_eq!(status, StatusCode::OK);
    body
}
