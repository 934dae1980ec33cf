//! Read-only reports over an academic period.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use classcal_core::{
    models::{
        calendar::Assignment,
        schedule::{AtRiskResponse, SessionDatesQuery, SessionDatesResponse},
    },
    service,
};
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn session_dates(
    State(state): State<Arc<ApiState>>,
    Path(period_id): Path<Uuid>,
    Query(query): Query<SessionDatesQuery>,
) -> Result<Json<SessionDatesResponse>, AppError> {
    let assignment = Assignment {
        teacher_id: query.teacher_id,
        subject_id: query.subject_id,
    };
    let dates =
        service::session_dates(state.store.as_ref(), period_id, assignment, query.class_id).await?;

    Ok(Json(SessionDatesResponse {
        period_id,
        count: dates.len(),
        dates,
    }))
}

#[axum::debug_handler]
pub async fn at_risk(
    State(state): State<Arc<ApiState>>,
    Path(period_id): Path<Uuid>,
) -> Result<Json<AtRiskResponse>, AppError> {
    let today = state.settings.today();
    let threshold = state.settings.passing_threshold;
    let students = service::at_risk_report(state.store.as_ref(), period_id, today, threshold).await?;

    Ok(Json(AtRiskResponse {
        period_id,
        threshold,
        today,
        students,
    }))
}
