//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/clock", get(clock_handler))
        .route("/alarms", get(list_alarms_handler).post(create_alarm_handler))
        .route("/alarms/:id", delete(delete_alarm_handler))
        .route("/alarms/:id/toggle", post(toggle_alarm_handler))
        .route("/timer", get(timer_handler))
        .route("/timer/start", post(start_timer_handler))
        .route("/timer/pause", post(pause_timer_handler))
        .route("/timer/resume", post(resume_timer_handler))
        .route("/timer/reset", post(reset_timer_handler))
        .route("/stopwatch", get(stopwatch_handler))
        .route("/stopwatch/start", post(start_stopwatch_handler))
        .route("/stopwatch/pause", post(pause_stopwatch_handler))
        .route("/stopwatch/reset", post(reset_stopwatch_handler))
        .route("/stopwatch/lap", post(lap_stopwatch_handler))
        .route("/settings", get(settings_handler).patch(update_settings_handler))
        .route("/ringing", get(ringing_handler))
        .route("/ringing/stop", post(stop_ringing_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
