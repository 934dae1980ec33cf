use std::collections::HashMap;

use chrono::NaiveTime;
use classcal_api::config::ApiConfig;
use classcal_core::models::calendar::SchoolDay;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tracing::Level;

fn config_from(vars: &[(&str, &str)]) -> eyre::Result<ApiConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    ApiConfig::from_vars(|key| vars.get(key).cloned())
}

const DATABASE_URL: (&str, &str) = ("DATABASE_URL", "postgres://localhost/classcal");

#[test]
fn test_defaults() {
    let config = config_from(&[DATABASE_URL]).unwrap();

    assert_eq!(config.server_addr(), "0.0.0.0:3000");
    assert_eq!(config.database_url, "postgres://localhost/classcal");
    assert_eq!(config.log_level, Level::INFO);
    assert_eq!(config.cors_origins, None);
    assert_eq!(config.request_timeout, 30);
    assert_eq!(config.schedule.passing_threshold, 70.0);
    assert_eq!(config.schedule.today, None);

    let monday = &config.schedule.week.days[&SchoolDay::Monday];
    assert_eq!(monday.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    assert_eq!(monday.slot_count, 8);
    assert_eq!(monday.slot_minutes, 45);
    assert_eq!(config.schedule.week.days.len(), 5);
}

#[test]
fn test_overrides() {
    let config = config_from(&[
        DATABASE_URL,
        ("API_HOST", "127.0.0.1"),
        ("API_PORT", "8080"),
        ("LOG_LEVEL", "DEBUG"),
        ("API_CORS_ORIGINS", "http://localhost:5173, https://school.example ,"),
        ("ATTENDANCE_PASSING_THRESHOLD", "75.5"),
        ("SCHOOL_DAY_START", "07:30"),
        ("SLOTS_PER_DAY", "6"),
        ("SLOT_MINUTES", "50"),
    ])
    .unwrap();

    assert_eq!(config.server_addr(), "127.0.0.1:8080");
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec![
            "http://localhost:5173".to_string(),
            "https://school.example".to_string()
        ])
    );
    assert_eq!(config.schedule.passing_threshold, 75.5);

    let friday = &config.schedule.week.days[&SchoolDay::Friday];
    assert_eq!(friday.start_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    assert_eq!(friday.slot_count, 6);
    assert_eq!(friday.slot_minutes, 50);
}

#[test]
fn test_database_url_required() {
    let err = config_from(&[]).unwrap_err();
    assert!(err.to_string().contains("DATABASE_URL"));
}

#[rstest]
#[case("API_PORT", "eighty")]
#[case("ATTENDANCE_PASSING_THRESHOLD", "120")]
#[case("ATTENDANCE_PASSING_THRESHOLD", "-1")]
#[case("ATTENDANCE_PASSING_THRESHOLD", "most")]
#[case("SCHOOL_DAY_START", "8am")]
#[case("SLOTS_PER_DAY", "0")]
#[case("SLOT_MINUTES", "600")]
fn test_invalid_values(#[case] key: &str, #[case] value: &str) {
    assert!(config_from(&[DATABASE_URL, (key, value)]).is_err());
}
