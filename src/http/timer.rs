use crate::application::reports::{daily_reports, records_for_date};
use crate::domain::timer::TimerSnapshot;
use crate::http::AppState;
use crate::infrastructure::error::AppError;
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use serde_json::{Value, json};

pub async fn snapshot(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.engine.snapshot().await)
}

pub async fn start(State(state): State<AppState>) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(state.engine.start().await?))
}

pub async fn pause(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.engine.pause().await)
}

pub async fn reset(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.engine.reset().await)
}

pub async fn skip(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.engine.skip().await)
}

pub async fn sessions(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let records = state.engine.history()?;
    Ok(Json(json!({ "sessions": records })))
}

pub async fn clear_sessions(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.engine.clear_history()?;
    tracing::info!("session history cleared");
    Ok(Json(json!({ "success": true })))
}

pub async fn reports(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let records = state.engine.history()?;
    let reports = daily_reports(&records, state.timezone);
    Ok(Json(json!({ "reports": reports })))
}

pub async fn report_sessions(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Value>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {date}")))?;
    let records = state.engine.history()?;
    let sessions = records_for_date(&records, date, state.timezone);
    Ok(Json(json!({ "date": date, "sessions": sessions })))
}
