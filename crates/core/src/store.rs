use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    errors::TimeResult,
    models::{
        availability::AvailabilityIndex,
        calendar::CalendarSlot,
        period::AcademicPeriod,
        roster::{AttendanceMark, ClassInfo, ClassRoster},
    },
    versioning::{ActiveSchedule, SavePlan, SavedSchedule},
};

/// Persistence boundary of the engine.
///
/// Reads never fail because something is missing; they return `None` or an
/// empty collection and let the caller decide. [`CalendarStore::apply_save_plan`]
/// must apply a plan completely or not at all.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn get_class(&self, class_id: Uuid) -> TimeResult<Option<ClassInfo>>;

    async fn get_active_schedule(&self, class_id: Uuid) -> TimeResult<Option<ActiveSchedule>>;

    /// The school's period covering `today`.
    async fn get_current_period(
        &self,
        school_id: Uuid,
        today: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>>;

    /// The school's earliest period starting after `after`.
    async fn get_next_period(
        &self,
        school_id: Uuid,
        after: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>>;

    async fn get_period(&self, period_id: Uuid) -> TimeResult<Option<AcademicPeriod>>;

    /// Slots of every calendar attached to the period, optionally narrowed
    /// to one class.
    async fn list_period_slots(
        &self,
        period_id: Uuid,
        class_id: Option<Uuid>,
    ) -> TimeResult<Vec<CalendarSlot>>;

    /// One roster per class with a calendar in the period.
    async fn list_period_rosters(&self, period_id: Uuid) -> TimeResult<Vec<ClassRoster>>;

    async fn list_attendance_marks(&self, period_id: Uuid) -> TimeResult<Vec<AttendanceMark>>;

    async fn load_availability(&self) -> TimeResult<AvailabilityIndex>;

    async fn subject_names(&self) -> TimeResult<HashMap<Uuid, String>>;

    async fn apply_save_plan(&self, plan: SavePlan) -> TimeResult<SavedSchedule>;
}
