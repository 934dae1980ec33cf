//! Store-backed operations.
//!
//! These functions glue the pure engine to a [`CalendarStore`]: they load
//! what a decision needs, run it, and write back through a single atomic
//! plan when there is something to write.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    editor::ScheduleEditor,
    errors::{TimeError, TimeResult},
    forecast::{StudentRisk, forecast_period},
    grid::{WeekConfig, WeekGrid},
    models::{
        calendar::{Assignment, Calendar},
        period::AcademicPeriod,
        roster::ClassInfo,
    },
    sessions::enumerate_session_dates,
    solver::verify_availability,
    store::CalendarStore,
    versioning::{Confirmation, SaveDecision},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedSchedule {
    pub class: ClassInfo,
    pub grid: WeekGrid,
    pub calendar: Option<Calendar>,
    pub period: Option<AcademicPeriod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved {
        calendar: Calendar,
        period: AcademicPeriod,
    },
    ConfirmationRequired,
    Declined,
}

async fn require_class(store: &dyn CalendarStore, class_id: Uuid) -> TimeResult<ClassInfo> {
    store
        .get_class(class_id)
        .await?
        .ok_or_else(|| TimeError::NotFound(format!("Class with ID {} not found", class_id)))
}

/// Loads the class's active timetable, or the blank grid when it has none.
pub async fn load_schedule(
    store: &dyn CalendarStore,
    class_id: Uuid,
    config: &WeekConfig,
) -> TimeResult<LoadedSchedule> {
    let class = require_class(store, class_id).await?;

    match store.get_active_schedule(class_id).await? {
        Some(active) => {
            let grid = WeekGrid::load_or_blank(&active.slots, config)?;
            Ok(LoadedSchedule {
                class,
                grid,
                calendar: Some(active.calendar),
                period: Some(active.period),
            })
        }
        None => Ok(LoadedSchedule {
            class,
            grid: WeekGrid::blank(config)?,
            calendar: None,
            period: None,
        }),
    }
}

/// Saves the editor's grid according to the versioning policy.
///
/// The grid is checked against teacher availability first. Nothing is
/// written unless the decision is to apply a plan; on success the editor
/// leaves drafting mode and drops its pinned set.
pub async fn save_schedule(
    store: &dyn CalendarStore,
    editor: &mut ScheduleEditor,
    confirmation: Confirmation,
    expected_version: Option<i32>,
    today: NaiveDate,
) -> TimeResult<SaveOutcome> {
    let class_id = editor.class().id;
    require_class(store, class_id).await?;

    let availability = store.load_availability().await?;
    verify_availability(editor.grid(), &availability)?;

    let school_id = editor.class().school_id;
    let active = store.get_active_schedule(class_id).await?;
    let current_period = store.get_current_period(school_id, today).await?;
    let next_period = store.get_next_period(school_id, today).await?;

    let decision = editor.plan_save(
        active.as_ref(),
        current_period.as_ref(),
        next_period.as_ref(),
        today,
        confirmation,
        expected_version,
    )?;

    match decision {
        SaveDecision::Apply(plan) => {
            debug!("Applying save plan for class {}: {:?}", class_id, plan);
            let saved = store.apply_save_plan(plan).await?;
            editor.finish_save();
            info!(
                "Saved calendar {} (version {}) for class {} in period {}",
                saved.calendar.id, saved.calendar.version, class_id, saved.period.id
            );
            Ok(SaveOutcome::Saved {
                calendar: saved.calendar,
                period: saved.period,
            })
        }
        SaveDecision::ConfirmationRequired => {
            debug!("Save for class {} awaits confirmation", class_id);
            Ok(SaveOutcome::ConfirmationRequired)
        }
        SaveDecision::Declined => {
            info!("Destructive save for class {} declined", class_id);
            Ok(SaveOutcome::Declined)
        }
    }
}

/// Session dates of an assignment in a period; empty when the period does
/// not exist.
pub async fn session_dates(
    store: &dyn CalendarStore,
    period_id: Uuid,
    assignment: Assignment,
    class_id: Option<Uuid>,
) -> TimeResult<Vec<NaiveDate>> {
    let Some(period) = store.get_period(period_id).await? else {
        debug!("Period {} not found, no sessions", period_id);
        return Ok(Vec::new());
    };
    let slots = store.list_period_slots(period_id, class_id).await?;
    Ok(enumerate_session_dates(&period, &slots, assignment))
}

/// Students with at least one subject projected under `threshold`; empty
/// when the period does not exist.
pub async fn at_risk_report(
    store: &dyn CalendarStore,
    period_id: Uuid,
    today: NaiveDate,
    threshold: f64,
) -> TimeResult<Vec<StudentRisk>> {
    let Some(period) = store.get_period(period_id).await? else {
        debug!("Period {} not found, empty forecast", period_id);
        return Ok(Vec::new());
    };

    let rosters = store.list_period_rosters(period_id).await?;
    let marks = store.list_attendance_marks(period_id).await?;
    let subject_names = store.subject_names().await?;

    let report = forecast_period(&period, &rosters, &marks, &subject_names, today, threshold);
    info!(
        "Forecast for period {}: {} classes, {} students at risk",
        period_id,
        rosters.len(),
        report.len()
    );
    Ok(report)
}
