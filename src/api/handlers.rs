//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::ClockError,
    state::{AppSettings, AppState, SettingsPatch},
};
use super::responses::{
    AlarmResponse, ApiError, ClockResponse, HealthResponse, LapResponse, RingingResponse, StatusResponse,
    StopwatchResponse, TimerResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateAlarmRequest {
    pub time: String,
    pub label: Option<String>,
}

/// Countdown length, given in exactly one unit
#[derive(Debug, Deserialize)]
pub struct StartTimerRequest {
    pub seconds: Option<u64>,
    pub minutes: Option<u64>,
}

impl StartTimerRequest {
    fn duration_seconds(&self) -> Result<u64, ClockError> {
        match (self.seconds, self.minutes) {
            (Some(seconds), None) => Ok(seconds),
            (None, Some(minutes)) => minutes
                .checked_mul(60)
                .ok_or_else(|| ClockError::invalid_input("minutes out of range")),
            _ => Err(ClockError::invalid_input("give exactly one of seconds or minutes")),
        }
    }
}

/// Handle GET /status - Return the full clock snapshot
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let is_24_hour = state.settings()?.is_24_hour;
    let alarms = state
        .alarms()?
        .into_iter()
        .map(|alarm| AlarmResponse::new(alarm, is_24_hour))
        .collect();

    Ok(Json(StatusResponse {
        clock: ClockResponse::new(state.current_time(), is_24_hour),
        alarms,
        timer: TimerResponse::from(&state.timer()?),
        stopwatch: StopwatchResponse::from(&state.stopwatch()?),
        ringing: state.ringing()?,
        uptime: state.get_uptime(),
    }))
}

/// Handle GET /clock - Current time as last sampled by the tick
pub async fn clock_handler(State(state): State<Arc<AppState>>) -> ApiResult<ClockResponse> {
    let is_24_hour = state.settings()?.is_24_hour;
    Ok(Json(ClockResponse::new(state.current_time(), is_24_hour)))
}

/// Handle GET /alarms
pub async fn list_alarms_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<AlarmResponse>> {
    let is_24_hour = state.settings()?.is_24_hour;
    Ok(Json(
        state
            .alarms()?
            .into_iter()
            .map(|alarm| AlarmResponse::new(alarm, is_24_hour))
            .collect(),
    ))
}

/// Handle POST /alarms - Create an active alarm
pub async fn create_alarm_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAlarmRequest>,
) -> Result<(StatusCode, Json<AlarmResponse>), ApiError> {
    let alarm = state.add_alarm(&request.time, request.label)?;
    let is_24_hour = state.settings()?.is_24_hour;
    Ok((StatusCode::CREATED, Json(AlarmResponse::new(alarm, is_24_hour))))
}

/// Handle DELETE /alarms/:id
pub async fn delete_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<AlarmResponse> {
    let alarm = state.delete_alarm(&id)?;
    let is_24_hour = state.settings()?.is_24_hour;
    Ok(Json(AlarmResponse::new(alarm, is_24_hour)))
}

/// Handle POST /alarms/:id/toggle - Flip the active flag
pub async fn toggle_alarm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<AlarmResponse> {
    let alarm = state.toggle_alarm(&id)?;
    let is_24_hour = state.settings()?.is_24_hour;
    Ok(Json(AlarmResponse::new(alarm, is_24_hour)))
}

/// Handle GET /timer
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<TimerResponse> {
    Ok(Json(TimerResponse::from(&state.timer()?)))
}

/// Handle POST /timer/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartTimerRequest>,
) -> ApiResult<TimerResponse> {
    let timer = state.start_timer(request.duration_seconds()?)?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle POST /timer/pause
pub async fn pause_timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<TimerResponse> {
    Ok(Json(TimerResponse::from(&state.pause_timer()?)))
}

/// Handle POST /timer/resume
pub async fn resume_timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<TimerResponse> {
    Ok(Json(TimerResponse::from(&state.resume_timer()?)))
}

/// Handle POST /timer/reset
pub async fn reset_timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<TimerResponse> {
    Ok(Json(TimerResponse::from(&state.reset_timer()?)))
}

/// Handle GET /stopwatch
pub async fn stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<StopwatchResponse> {
    Ok(Json(StopwatchResponse::from(&state.stopwatch()?)))
}

/// Handle POST /stopwatch/start
pub async fn start_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<StopwatchResponse> {
    Ok(Json(StopwatchResponse::from(&state.start_stopwatch()?)))
}

/// Handle POST /stopwatch/pause
pub async fn pause_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<StopwatchResponse> {
    Ok(Json(StopwatchResponse::from(&state.pause_stopwatch()?)))
}

/// Handle POST /stopwatch/reset
pub async fn reset_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<StopwatchResponse> {
    Ok(Json(StopwatchResponse::from(&state.reset_stopwatch()?)))
}

/// Handle POST /stopwatch/lap
pub async fn lap_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<LapResponse> {
    Ok(Json(LapResponse::from(state.lap_stopwatch()?)))
}

/// Handle GET /settings
pub async fn settings_handler(State(state): State<Arc<AppState>>) -> ApiResult<AppSettings> {
    Ok(Json(state.settings()?))
}

/// Handle PATCH /settings - Partial update
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> ApiResult<AppSettings> {
    Ok(Json(state.update_settings(patch)?))
}

/// Handle GET /ringing
pub async fn ringing_handler(State(state): State<Arc<AppState>>) -> ApiResult<RingingResponse> {
    Ok(Json(RingingResponse { ringing: state.ringing()? }))
}

/// Handle POST /ringing/stop - Dismiss the ringing alarm
pub async fn stop_ringing_handler(State(state): State<Arc<AppState>>) -> ApiResult<RingingResponse> {
    let stopped = state.stop_alarm()?;
    if stopped.is_some() {
        info!("Ringing dismissed via API");
    }
    Ok(Json(RingingResponse { ringing: stopped }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
