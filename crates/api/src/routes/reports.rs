use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/periods/:period_id/sessions",
            get(handlers::reports::session_dates),
        )
        .route(
            "/api/periods/:period_id/at-risk",
            get(handlers::reports::at_risk),
        )
}
