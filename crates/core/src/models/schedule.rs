use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    forecast::StudentRisk,
    grid::{WeekConfig, WeekGrid},
    models::calendar::SlotKey,
    service::SaveOutcome,
    solver::SubjectDemand,
    swap::FixedSet,
    versioning::EditMode,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetScheduleResponse {
    pub class_id: Uuid,
    pub class_name: String,
    pub calendar_id: Option<Uuid>,
    pub period_id: Option<Uuid>,
    pub version: Option<i32>,
    pub mode: EditMode,
    pub grid: WeekGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub grid: WeekGrid,
    #[serde(default)]
    pub fixed: FixedSet,
    pub active: SlotKey,
    pub target: SlotKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResponse {
    pub grid: WeekGrid,
    pub fixed: FixedSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFixedRequest {
    #[serde(default)]
    pub fixed: FixedSet,
    pub key: SlotKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFixedResponse {
    pub fixed: FixedSet,
    pub is_fixed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftScheduleRequest {
    #[serde(default)]
    pub fixed: FixedSet,
    /// Week shape to draft into; the server default applies when absent.
    pub config: Option<WeekConfig>,
    #[serde(default)]
    pub demands: Vec<SubjectDemand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftScheduleResponse {
    pub grid: WeekGrid,
    pub fixed: FixedSet,
    pub mode: EditMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScheduleRequest {
    #[serde(default)]
    pub mode: EditMode,
    pub grid: WeekGrid,
    #[serde(default)]
    pub fixed: FixedSet,
    /// Answer to the confirmation prompt; absent until the user is asked.
    pub confirm: Option<bool>,
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScheduleResponse {
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    pub mode: EditMode,
    pub fixed: FixedSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDatesQuery {
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDatesResponse {
    pub period_id: Uuid,
    pub dates: Vec<NaiveDate>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtRiskResponse {
    pub period_id: Uuid,
    pub threshold: f64,
    pub today: NaiveDate,
    pub students: Vec<StudentRisk>,
}
