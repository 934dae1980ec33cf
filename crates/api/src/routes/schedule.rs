use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/classes/:class_id/schedule",
            get(handlers::schedule::get_schedule),
        )
        .route(
            "/api/classes/:class_id/schedule/draft",
            post(handlers::schedule::draft_schedule),
        )
        .route(
            "/api/classes/:class_id/schedule/save",
            post(handlers::schedule::save_schedule),
        )
        .route("/api/schedule/swap", post(handlers::schedule::swap_slots))
        .route(
            "/api/schedule/fixed/toggle",
            post(handlers::schedule::toggle_fixed),
        )
}
