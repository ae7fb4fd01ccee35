/// Integration tests for the 21/21 cycle
///
/// This file contains end-to-end tests for:
/// - Activating and deactivating wisdom
/// - Recording exposures
/// - Showing the next wisdom and the daily target
/// - The daily rollover, its idempotence and automatic refills
/// - A full 21-day cycle driven entirely over HTTP

use axum::http::StatusCode;
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};
use wisdom21::dto::{DisplayDto, RolloverResultDto};
use wisdom21::models::{CycleState, Wisdom};
use wisdom21::scheduler::CycleSummary;

mod common;
use common::*;

/// The n-th rollover day of a test run, starting at 2025-01-01
fn day(n: u64) -> String {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (start + Days::new(n)).format("%Y-%m-%d").to_string()
}

/// Tests activating a wisdom and activating one that does not exist
///
/// This test verifies:
/// 1. Activation starts the cycle on day 1 with fresh counters
/// 2. A missing wisdom returns 404
#[tokio::test]
async fn test_activate_wisdom() {
    let mut app = create_test_app();
    let wisdom = create_wisdom(&mut app, "Amor fati", None, None).await;

    let active = activate(&mut app, &wisdom.get_id()).await;
    assert_eq!(active.get_state(), CycleState::Active);
    assert_eq!(active.get_current_day(), 1);
    assert_eq!(active.get_exposures_today(), 0);
    assert!(active.get_start_date().is_some());

    let (status, body) = send(&mut app, "POST", "/wisdom/missing/activate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Wisdom not found");
}

/// Tests recording exposures on active and queued wisdom
///
/// This test verifies:
/// 1. Exposures on an active wisdom count towards today and the total
/// 2. Counting continues past the daily target
/// 3. A queued wisdom is left untouched and reported as not recorded
#[tokio::test]
async fn test_record_exposure() {
    let mut app = create_test_app();
    let queued = create_wisdom(&mut app, "Waiting", None, None).await;
    let wisdom = create_wisdom(&mut app, "Shown", None, None).await;
    activate(&mut app, &wisdom.get_id()).await;

    let mut last = Value::Null;
    for _ in 0..23 {
        last = expose(&mut app, &wisdom.get_id()).await;
    }
    assert_eq!(last["recorded"], Value::Bool(true));
    assert_eq!(last["wisdom"]["exposures_today"], 23);
    assert_eq!(last["wisdom"]["exposures_total"], 23);

    let result = expose(&mut app, &queued.get_id()).await;
    assert_eq!(result["recorded"], Value::Bool(false));
    assert_eq!(result["wisdom"]["exposures_total"], 0);

    let (status, _) = send(&mut app, "POST", "/wisdom/missing/exposures", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Tests deactivating a wisdom
///
/// This test verifies:
/// 1. The wisdom is queued again with its counters reset
/// 2. It moves behind the rest of its category queue
#[tokio::test]
async fn test_deactivate_wisdom() {
    let mut app = create_test_app();
    let wisdom = create_wisdom(&mut app, "First", None, Some("Zen")).await;
    let other = create_wisdom(&mut app, "Second", None, Some("Zen")).await;
    activate(&mut app, &wisdom.get_id()).await;
    expose(&mut app, &wisdom.get_id()).await;

    let (status, body) = send(&mut app, "POST", &format!("/wisdom/{}/deactivate", wisdom.get_id()), None).await;
    assert_eq!(status, StatusCode::OK);
    let queued: Wisdom = serde_json::from_value(body).unwrap();
    assert_eq!(queued.get_state(), CycleState::Queued);
    assert_eq!(queued.get_current_day(), 0);
    assert_eq!(queued.get_exposures_today(), 0);
    assert!(queued.get_queue_position() > other.get_queue_position());

    let (status, _) = send(&mut app, "POST", "/wisdom/missing/deactivate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Tests activating the front of a category queue
#[tokio::test]
async fn test_activate_next_queued() {
    let mut app = create_test_app();
    create_wisdom(&mut app, "Elsewhere", None, Some("Greek")).await;
    let first = create_wisdom(&mut app, "First in line", None, Some("Zen")).await;
    create_wisdom(&mut app, "Second in line", None, Some("Zen")).await;

    let (status, body) = send(&mut app, "POST", "/active/next?category=Zen", None).await;
    assert_eq!(status, StatusCode::OK);
    let activated: Wisdom = serde_json::from_value(body).unwrap();
    assert_eq!(activated.get_id(), first.get_id());
    assert!(activated.is_active());

    let (_, body) = send(&mut app, "GET", "/active", None).await;
    let active: Vec<Wisdom> = serde_json::from_value(body).unwrap();
    assert_eq!(active.len(), 1);

    let (status, body) = send(&mut app, "POST", "/active/next?category=Empty", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

/// Tests showing the next wisdom until the daily target is met
///
/// This test verifies:
/// 1. Peeking does not record an exposure
/// 2. Each show records one exposure, balanced across active wisdom
/// 3. Once every active wisdom reached 21, nothing more is shown
#[tokio::test]
async fn test_show_next_until_target() {
    let mut app = create_test_app();
    let a = create_wisdom(&mut app, "A", None, None).await;
    let b = create_wisdom(&mut app, "B", None, None).await;
    activate(&mut app, &a.get_id()).await;
    activate(&mut app, &b.get_id()).await;

    let (status, body) = send(&mut app, "GET", "/display/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
    let (_, body) = send(&mut app, "GET", "/summary", None).await;
    let summary: CycleSummary = serde_json::from_value(body).unwrap();
    assert_eq!(summary.exposures_today, 0);
    assert_eq!(summary.remaining_today, 42);

    for _ in 0..42 {
        let (_, body) = send(&mut app, "POST", "/display/next", None).await;
        let display: DisplayDto = serde_json::from_value(body).unwrap();
        assert!(display.recorded);
        assert!(display.wisdom.is_some());
    }

    let (_, body) = send(&mut app, "POST", "/display/next", None).await;
    let display: DisplayDto = serde_json::from_value(body).unwrap();
    assert!(display.wisdom.is_none());
    assert!(!display.recorded);
    assert!(display.daily_target_met);

    let a = get_wisdom(&mut app, &a.get_id()).await.unwrap();
    let b = get_wisdom(&mut app, &b.get_id()).await.unwrap();
    assert_eq!(a.get_exposures_today(), 21);
    assert_eq!(b.get_exposures_today(), 21);

    let (_, body) = send(&mut app, "GET", "/summary", None).await;
    let summary: CycleSummary = serde_json::from_value(body).unwrap();
    assert_eq!(summary.active, 2);
    assert_eq!(summary.remaining_today, 0);
}

/// Tests that nothing is shown when nothing is active
#[tokio::test]
async fn test_show_next_nothing_active() {
    let mut app = create_test_app();
    create_wisdom(&mut app, "Queued only", None, None).await;

    let (_, body) = send(&mut app, "POST", "/display/next", None).await;
    let display: DisplayDto = serde_json::from_value(body).unwrap();
    assert!(display.wisdom.is_none());
    assert!(!display.daily_target_met);
}

/// Tests that a day is rolled over at most once
///
/// This test verifies:
/// 1. The first rollover advances the active wisdom and resets today's count
/// 2. Repeating it for the same or an earlier day changes nothing
/// 3. A malformed day is rejected with 400
#[tokio::test]
async fn test_rollover_idempotent() {
    let mut app = create_test_app();
    let wisdom = create_wisdom(&mut app, "Once a day", None, None).await;
    activate(&mut app, &wisdom.get_id()).await;
    expose(&mut app, &wisdom.get_id()).await;

    let result: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(1)).await).unwrap();
    assert!(!result.outcome.skipped);
    assert_eq!(result.outcome.advanced, 1);

    let again: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(1)).await).unwrap();
    assert!(again.outcome.skipped);
    let earlier: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(0)).await).unwrap();
    assert!(earlier.outcome.skipped);

    let wisdom = get_wisdom(&mut app, &wisdom.get_id()).await.unwrap();
    assert_eq!(wisdom.get_current_day(), 2);
    assert_eq!(wisdom.get_exposures_today(), 0);
    assert_eq!(wisdom.get_exposures_total(), 1);

    let (status, body) = send(&mut app, "POST", "/rollover", Some(json!({ "day": "tomorrow" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

/// Tests that a rollover for a day after today is refused
///
/// This test verifies:
/// 1. `POST /rollover` with a future day returns 400 with an error message
/// 2. Nothing is logged, so today's rollover still advances the wisdom
#[tokio::test]
async fn test_rollover_rejects_future_day() {
    let mut app = create_test_app();
    let wisdom = create_wisdom(&mut app, "Not yet", None, None).await;
    activate(&mut app, &wisdom.get_id()).await;

    let (status, body) = send(&mut app, "POST", "/rollover", Some(json!({ "day": "2099-01-01" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("2099-01-01"));

    let (status, body) = send(&mut app, "POST", "/rollover", None).await;
    assert_eq!(status, StatusCode::OK);
    let result: RolloverResultDto = serde_json::from_value(body).unwrap();
    assert!(!result.outcome.skipped);
    assert_eq!(get_wisdom(&mut app, &wisdom.get_id()).await.unwrap().get_current_day(), 2);
}

/// Tests a complete 21/21 cycle over the API
///
/// This test verifies:
/// 1. A wisdom shown 21 times on each of 21 days is completed by the 21st rollover
/// 2. It was active for exactly 21 days and shown 441 times in total
/// 3. Afterwards it is listed as completed and no longer shown
#[tokio::test]
async fn test_full_cycle_round_trip() {
    let mut app = create_test_app();
    let wisdom = create_wisdom(&mut app, "Twenty-one by twenty-one", None, None).await;
    activate(&mut app, &wisdom.get_id()).await;

    for n in 1..=21 {
        for _ in 0..21 {
            let (_, body) = send(&mut app, "POST", "/display/next", None).await;
            let display: DisplayDto = serde_json::from_value(body).unwrap();
            assert!(display.recorded);
        }

        let current = get_wisdom(&mut app, &wisdom.get_id()).await.unwrap();
        assert!(current.is_active());
        assert_eq!(current.get_current_day(), n as i32);

        let result: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(n)).await).unwrap();
        if n < 21 {
            assert_eq!((result.outcome.advanced, result.outcome.completed), (1, 0));
        } else {
            assert_eq!((result.outcome.advanced, result.outcome.completed), (0, 1));
            assert_eq!(result.outcome.completed_ids, vec![wisdom.get_id()]);
        }
    }

    let done = get_wisdom(&mut app, &wisdom.get_id()).await.unwrap();
    assert_eq!(done.get_state(), CycleState::Completed);
    assert_eq!(done.get_exposures_total(), 441);
    assert!(done.get_date_completed().is_some());

    let (_, body) = send(&mut app, "GET", "/wisdom?state=completed", None).await;
    let completed: Vec<Wisdom> = serde_json::from_value(body).unwrap();
    assert_eq!(completed.len(), 1);

    let (_, body) = send(&mut app, "POST", "/display/next", None).await;
    let display: DisplayDto = serde_json::from_value(body).unwrap();
    assert!(display.wisdom.is_none());
}

/// Tests that a completed wisdom is replaced from its category queue
///
/// This test verifies:
/// 1. With auto-advance on, the rollover that completes a wisdom activates
///    the front of the same category's queue
/// 2. Other categories are left alone
#[tokio::test]
async fn test_rollover_auto_advance() {
    let mut app = create_test_app_with(true);
    let finishing = create_wisdom(&mut app, "Almost there", None, Some("Zen")).await;
    let next = create_wisdom(&mut app, "Up next", None, Some("Zen")).await;
    create_wisdom(&mut app, "Other queue", None, Some("Greek")).await;
    activate(&mut app, &finishing.get_id()).await;

    for n in 1..=20 {
        let result: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(n)).await).unwrap();
        assert!(result.activated.is_empty());
    }

    let result: RolloverResultDto = serde_json::from_value(rollover(&mut app, &day(21)).await).unwrap();
    assert_eq!(result.outcome.completed, 1);
    assert_eq!(result.activated.len(), 1);
    assert_eq!(result.activated[0].get_id(), next.get_id());

    let (_, body) = send(&mut app, "GET", "/active", None).await;
    let active: Vec<Wisdom> = serde_json::from_value(body).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].get_id(), next.get_id());
    assert_eq!(active[0].get_current_day(), 1);
}
