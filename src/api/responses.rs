//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    error::ClockError,
    state::{Alarm, Lap, RingingAlarm, Stopwatch, TimerPhase, TimerState},
    utils::{format_alarm_time, format_clock_time, format_date, format_duration, format_seconds, format_timer_time},
};

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Wraps [`ClockError`] so handlers can use `?`
#[derive(Debug)]
pub struct ApiError(pub ClockError);

impl From<ClockError> for ApiError {
    fn from(e: ClockError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClockError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClockError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ClockError::AlarmNotFound(_) => StatusCode::NOT_FOUND,
            ClockError::Lock(_) | ClockError::Storage(_) | ClockError::Audio(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Clock face data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockResponse {
    pub time: String,
    pub seconds: String,
    pub date: String,
    #[serde(rename = "is24Hour")]
    pub is_24_hour: bool,
    pub local: NaiveDateTime,
}

impl ClockResponse {
    pub fn new(now: NaiveDateTime, is_24_hour: bool) -> Self {
        Self {
            time: format_clock_time(&now, is_24_hour),
            seconds: format_seconds(&now),
            date: format_date(&now),
            is_24_hour,
            local: now,
        }
    }
}

/// Alarm with its display form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmResponse {
    #[serde(flatten)]
    pub alarm: Alarm,
    pub display_time: String,
}

impl AlarmResponse {
    pub fn new(alarm: Alarm, is_24_hour: bool) -> Self {
        let display_time = format_alarm_time(&alarm.time, is_24_hour);
        Self { alarm, display_time }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerResponse {
    pub phase: TimerPhase,
    pub time_left_seconds: u64,
    pub initial_total_seconds: u64,
    pub is_running: bool,
    pub progress_percent: f64,
    pub display: String,
}

impl From<&TimerState> for TimerResponse {
    fn from(timer: &TimerState) -> Self {
        Self {
            phase: timer.phase(),
            time_left_seconds: timer.time_left_seconds(),
            initial_total_seconds: timer.initial_total_seconds(),
            is_running: timer.is_running(),
            progress_percent: timer.progress_percent(),
            display: format_timer_time(timer.time_left_seconds()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LapResponse {
    #[serde(flatten)]
    pub lap: Lap,
    pub display: String,
    pub delta_display: String,
}

impl From<Lap> for LapResponse {
    fn from(lap: Lap) -> Self {
        Self {
            display: format_duration(lap.absolute_elapsed_ms),
            delta_display: format!("+{}", format_duration(lap.delta_from_previous_lap_ms)),
            lap,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopwatchResponse {
    pub elapsed_ms: u64,
    pub is_running: bool,
    pub display: String,
    /// Most recent first
    pub laps: Vec<LapResponse>,
}

impl From<&Stopwatch> for StopwatchResponse {
    fn from(stopwatch: &Stopwatch) -> Self {
        Self {
            elapsed_ms: stopwatch.elapsed_ms(),
            is_running: stopwatch.is_running(),
            display: format_duration(stopwatch.elapsed_ms()),
            laps: stopwatch.laps().iter().copied().map(LapResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RingingResponse {
    pub ringing: Option<RingingAlarm>,
}

/// Full snapshot for GET /status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub clock: ClockResponse,
    pub alarms: Vec<AlarmResponse>,
    pub timer: TimerResponse,
    pub stopwatch: StopwatchResponse,
    pub ringing: Option<RingingAlarm>,
    pub uptime: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
