//! # API Configuration Module
//!
//! Loads the server configuration from environment variables, with defaults
//! for everything except the database URL.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `API_CORS_ORIGINS`: comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: request timeout (default: 30)
//! - `ATTENDANCE_PASSING_THRESHOLD`: projected percentage under which a
//!   student is at risk (default: 70)
//! - `SCHOOL_DAY_START`: first slot of the day, `HH:MM` (default: "08:00")
//! - `SLOTS_PER_DAY`: slots per school day (default: 8)
//! - `SLOT_MINUTES`: length of one slot (default: 45)

use std::env;

use chrono::{NaiveDate, NaiveTime};
use classcal_core::{forecast::DEFAULT_PASSING_THRESHOLD, grid::WeekConfig};
use eyre::{Result, WrapErr, eyre};
use tracing::Level;

/// Scheduling defaults shared by the handlers.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    /// Week shape for blank grids and drafts without their own config.
    pub week: WeekConfig,

    pub passing_threshold: f64,

    /// Pins the date used for saves and forecasts; the local date when unset.
    pub today: Option<NaiveDate>,
}

impl ScheduleSettings {
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            week: WeekConfig::uniform(NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(), 8, 45),
            passing_threshold: DEFAULT_PASSING_THRESHOLD,
            today: None,
        }
    }
}

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub schedule: ScheduleSettings,
}

fn parse_log_level(value: &str) -> Level {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

impl ApiConfig {
    /// Creates a new ApiConfig from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is unset or a numeric setting cannot be
    /// parsed; see [`ApiConfig::from_vars`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Network settings
        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "3000")
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;

        let log_level = parse_log_level(&var("LOG_LEVEL", "info"));

        let cors_origins = lookup("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let request_timeout = var("API_REQUEST_TIMEOUT_SECONDS", "30")
            .parse()
            .unwrap_or(30);

        // Scheduling settings
        let passing_threshold: f64 = var("ATTENDANCE_PASSING_THRESHOLD", "70")
            .parse()
            .wrap_err("Invalid ATTENDANCE_PASSING_THRESHOLD value")?;
        if !(0.0..=100.0).contains(&passing_threshold) {
            return Err(eyre!(
                "ATTENDANCE_PASSING_THRESHOLD must be between 0 and 100, got {}",
                passing_threshold
            ));
        }

        let day_start = NaiveTime::parse_from_str(&var("SCHOOL_DAY_START", "08:00"), "%H:%M")
            .wrap_err("Invalid SCHOOL_DAY_START value, expected HH:MM")?;
        let slots_per_day = var("SLOTS_PER_DAY", "8")
            .parse()
            .wrap_err("Invalid SLOTS_PER_DAY value")?;
        let slot_minutes = var("SLOT_MINUTES", "45")
            .parse()
            .wrap_err("Invalid SLOT_MINUTES value")?;
        let week = WeekConfig::uniform(day_start, slots_per_day, slot_minutes);
        week.validate().wrap_err("Invalid school day configuration")?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            schedule: ScheduleSettings {
                week,
                passing_threshold,
                today: None,
            },
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
