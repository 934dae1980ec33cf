//! # Classcal API
//!
//! HTTP surface of the class calendar engine: loading and editing a class's
//! weekly timetable, drafting and saving it, and the period reports (session
//! dates and the attendance at-risk forecast).
//!
//! ## Architecture
//!
//! - **Routes**: endpoint paths, grouped by area
//! - **Handlers**: extract the request, call the engine, shape the response
//! - **Middleware**: error mapping and the per-class save guard
//! - **Config**: environment configuration
//!
//! Handlers only talk to storage through [`CalendarStore`] and to the draft
//! generator through [`DraftSolver`], so the router can be served over
//! Postgres or over the in-memory store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Error mapping and save guard
pub mod middleware;
/// Route definitions
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use classcal_core::{solver::GreedySolver, solver::DraftSolver, store::CalendarStore};
use classcal_db::{DbPool, PgCalendarStore};
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::{config::ScheduleSettings, middleware::save_guard::SaveGuard};

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub store: Arc<dyn CalendarStore>,
    pub solver: Arc<dyn DraftSolver>,
    pub settings: ScheduleSettings,
    /// Classes with a save in flight.
    pub saves: SaveGuard,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn CalendarStore>,
        solver: Arc<dyn DraftSolver>,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            store,
            solver,
            settings,
            saves: SaveGuard::new(),
        }
    }
}

/// Builds the application router with every route and request tracing.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::schedule::routes())
        .merge(routes::reports::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origins)
}

/// Starts the API server over Postgres with the greedy draft solver.
///
/// ```rust,ignore
/// let config = config::ApiConfig::from_env()?;
/// let db_pool = classcal_db::create_pool(&config.database_url).await?;
/// start_server(config, db_pool).await?;
/// ```
pub async fn start_server(config: config::ApiConfig, db_pool: DbPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(
        Arc::new(PgCalendarStore::new(db_pool)),
        Arc::new(GreedySolver),
        config.schedule.clone(),
    ));

    let app = app(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
            .into_inner(),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
