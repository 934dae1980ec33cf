use std::error::Error;

use chrono::NaiveTime;
use classcal_core::{
    errors::{TimeError, TimeResult},
    models::calendar::SchoolDay,
    swap::SwapError,
};

#[test]
fn test_time_error_display() {
    let not_found = TimeError::NotFound("Class not found".to_string());
    let validation = TimeError::Validation("Invalid input".to_string());
    let conflict = TimeError::Conflict("Calendar changed".to_string());
    let database = TimeError::Database(eyre::eyre!("Database connection failed"));
    let internal = TimeError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(not_found.to_string(), "Resource not found: Class not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert_eq!(conflict.to_string(), "Conflict: Calendar changed");
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_swap_error_names_teacher_and_time() {
    let error = SwapError::TeacherUnavailable {
        teacher_name: "Ms. Rivera".to_string(),
        day: SchoolDay::Thursday,
        start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
    };

    assert_eq!(error.teacher_name(), Some("Ms. Rivera"));
    assert_eq!(
        error.reason(),
        "Ms. Rivera is not available on thursday from 10:00 to 11:00"
    );

    let wrapped: TimeError = error.into();
    assert!(wrapped.to_string().starts_with("Schedule conflict: Ms. Rivera"));
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let time_error = TimeError::Internal(Box::new(io_error));

    assert!(time_error.source().is_some());
}

#[test]
fn test_time_result() {
    let result: TimeResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: TimeResult<i32> = Err(TimeError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_from_eyre_report() {
    let time_error: TimeError = eyre::eyre!("connection reset").into();

    assert!(matches!(time_error, TimeError::Database(_)));
    assert!(time_error.to_string().contains("connection reset"));
}
