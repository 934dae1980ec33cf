use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use classcal_core::{
    editor::ScheduleEditor,
    errors::TimeError,
    models::schedule::{
        DraftScheduleRequest, DraftScheduleResponse, GetScheduleResponse, SaveScheduleRequest,
        SaveScheduleResponse, SwapRequest, SwapResponse, ToggleFixedRequest, ToggleFixedResponse,
    },
    service,
    swap::attempt_swap,
    versioning::{Confirmation, EditMode},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<ApiState>>,
    Path(class_id): Path<Uuid>,
) -> Result<Json<GetScheduleResponse>, AppError> {
    let loaded = service::load_schedule(state.store.as_ref(), class_id, &state.settings.week).await?;

    Ok(Json(GetScheduleResponse {
        class_id: loaded.class.id,
        class_name: loaded.class.name,
        calendar_id: loaded.calendar.as_ref().map(|c| c.id),
        period_id: loaded.period.as_ref().map(|p| p.id),
        version: loaded.calendar.as_ref().map(|c| c.version),
        mode: EditMode::EditingExisting,
        grid: loaded.grid,
    }))
}

#[axum::debug_handler]
pub async fn swap_slots(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<SwapRequest>,
) -> Result<Json<SwapResponse>, AppError> {
    payload.grid.validate()?;
    let availability = state.store.load_availability().await?;

    let outcome = attempt_swap(
        &payload.grid,
        &payload.fixed,
        &payload.active,
        &payload.target,
        &availability,
    )?;

    Ok(Json(SwapResponse {
        grid: outcome.grid,
        fixed: outcome.fixed,
    }))
}

#[axum::debug_handler]
pub async fn toggle_fixed(
    Json(payload): Json<ToggleFixedRequest>,
) -> Result<Json<ToggleFixedResponse>, AppError> {
    let mut fixed = payload.fixed;
    let is_fixed = fixed.toggle(payload.key);
    debug!("Slot {} pinned: {}", payload.key, is_fixed);

    Ok(Json(ToggleFixedResponse { fixed, is_fixed }))
}

#[axum::debug_handler]
pub async fn draft_schedule(
    State(state): State<Arc<ApiState>>,
    Path(class_id): Path<Uuid>,
    Json(payload): Json<DraftScheduleRequest>,
) -> Result<Json<DraftScheduleResponse>, AppError> {
    let loaded = service::load_schedule(state.store.as_ref(), class_id, &state.settings.week).await?;
    let availability = state.store.load_availability().await?;
    let config = payload
        .config
        .unwrap_or_else(|| state.settings.week.clone());

    let mut editor = ScheduleEditor::new(
        loaded.class,
        EditMode::EditingExisting,
        loaded.grid,
        payload.fixed,
    );
    editor
        .draft(state.solver.as_ref(), config, payload.demands, availability)
        .await?;

    let (grid, fixed, mode) = editor.into_parts();
    Ok(Json(DraftScheduleResponse { grid, fixed, mode }))
}

#[axum::debug_handler]
pub async fn save_schedule(
    State(state): State<Arc<ApiState>>,
    Path(class_id): Path<Uuid>,
    Json(payload): Json<SaveScheduleRequest>,
) -> Result<Json<SaveScheduleResponse>, AppError> {
    let _ticket = state.saves.try_acquire(class_id).ok_or_else(|| {
        TimeError::Conflict(format!("A save for class {} is already running", class_id))
    })?;

    let class = state
        .store
        .get_class(class_id)
        .await?
        .ok_or_else(|| TimeError::NotFound(format!("Class with ID {} not found", class_id)))?;

    let mut editor = ScheduleEditor::new(class, payload.mode, payload.grid, payload.fixed);
    let outcome = service::save_schedule(
        state.store.as_ref(),
        &mut editor,
        Confirmation::from(payload.confirm),
        payload.expected_version,
        state.settings.today(),
    )
    .await?;

    info!("Save for class {} finished in mode {:?}", class_id, editor.mode());
    let (_, fixed, mode) = editor.into_parts();
    Ok(Json(SaveScheduleResponse {
        outcome,
        mode,
        fixed,
    }))
}
