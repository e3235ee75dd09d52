use crate::domain::models::TimerSettings;
use crate::http::{AppState, BodyJson};
use crate::infrastructure::error::AppError;
use axum::{Json, extract::State};

pub async fn get_settings() -> Json<TimerSettings> {
    Json(TimerSettings::default())
}

/// Validates the submitted settings, applies the durations to the hosted
/// timer, and echoes the settings back. Nothing is persisted.
pub async fn update_settings(
    State(state): State<AppState>,
    BodyJson(settings): BodyJson<TimerSettings>,
) -> Result<Json<TimerSettings>, AppError> {
    settings.validate().map_err(AppError::Validation)?;

    state.engine.set_study_duration(settings.study_duration).await;
    state.engine.set_break_duration(settings.break_duration).await;
    tracing::info!(
        study = settings.study_duration,
        brk = settings.break_duration,
        "timer settings applied"
    );
    Ok(Json(settings))
}
