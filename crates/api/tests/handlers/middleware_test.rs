use axum::{body::to_bytes, http::StatusCode};
use chrono::NaiveTime;
use classcal_api::{
    middleware::{error_handling::map_error, save_guard::SaveGuard},
    routes::health::{HealthResponse, VersionResponse},
};
use classcal_core::{errors::TimeError, models::calendar::SchoolDay, swap::SwapError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::TestContext;

#[rstest]
#[case(TimeError::NotFound("class".into()), StatusCode::NOT_FOUND)]
#[case(TimeError::Validation("grid".into()), StatusCode::BAD_REQUEST)]
#[case(TimeError::Conflict("version".into()), StatusCode::CONFLICT)]
#[case(TimeError::Database(eyre::eyre!("connection reset")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(TimeError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: TimeError, #[case] status: StatusCode) {
    assert_eq!(map_error(error).status(), status);
}

#[tokio::test]
async fn test_swap_error_body_carries_conflict() {
    let error = TimeError::Swap(SwapError::TeacherUnavailable {
        teacher_name: "Ms. Lindqvist".to_string(),
        day: SchoolDay::Friday,
        start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    });

    let response = map_error(error);
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["conflict"]["kind"], "teacher_unavailable");
    assert_eq!(body["conflict"]["day"], "friday");
    assert_eq!(body["conflict"]["start"], "09:00:00");
    assert_eq!(
        body["error"],
        "Schedule conflict: Ms. Lindqvist is not available on friday from 09:00 to 10:00"
    );
}

#[tokio::test]
async fn test_plain_error_body() {
    let response = map_error(TimeError::NotFound("Class with ID 1 not found".into()));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "Resource not found: Class with ID 1 not found" })
    );
}

#[test]
fn test_save_guard_is_per_class() {
    let guard = SaveGuard::new();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let ticket = guard.try_acquire(first).unwrap();
    assert!(guard.try_acquire(first).is_none());
    assert!(guard.try_acquire(second).is_some());
    assert!(guard.is_saving(first));

    drop(ticket);
    assert!(!guard.is_saving(first));
    assert!(guard.try_acquire(first).is_some());
}

#[tokio::test]
async fn test_health_and_version() {
    let server = TestContext::new().server();

    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.status, "ok");

    let version: VersionResponse = server.get("/version").await.json();
    assert_eq!(version.name, "classcal-api");
    assert!(!version.version.is_empty());
}
