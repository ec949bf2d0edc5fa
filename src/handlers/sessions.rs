//! Session handlers - upload, inspect, live prediction

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::extract::{JsonBody, PathParam};
use crate::models::{ControlInput, DeleteSessionResponse, Prediction, SessionView};
use crate::pipeline::{self, dataset_digest, CacheKey};
use crate::sessions::Session;
use crate::{AppError, AppResult, AppState};

/// Upload a dataset and train. Multipart fields: `file` (required), `seed` (optional)
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SessionView>> {
    let mut upload = None;
    let mut seed = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                tracing::info!("Received file: {:?} ({} bytes)", file_name, data.len());
                upload = Some((file_name, data));
            }
            Some("seed") => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() {
                    let parsed = text.parse::<u64>().map_err(|_| {
                        AppError::ValidationError(format!("Invalid seed '{}'", text))
                    })?;
                    seed = Some(parsed);
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| AppError::ValidationError("No file uploaded".to_string()))?;

    let params = state.config.pipeline_params(seed);
    let key = CacheKey::new(dataset_digest(&bytes), params);

    let (trained, cached) = match state.cache.get(&key) {
        Some(hit) => {
            tracing::info!("Reusing cached pipeline for dataset {}", key.dataset_digest);
            (hit, true)
        }
        None => {
            let name = file_name.clone();
            let result = tokio::task::spawn_blocking(move || {
                pipeline::run_upload(name.as_deref(), &bytes, &params)
            })
            .await??;

            let result = Arc::new(result);
            state.cache.insert(key, result.clone());
            (result, false)
        }
    };

    let view = state.sessions.insert(Session::new(file_name, trained, cached));
    tracing::info!(
        "Session {} ready: accuracy {}",
        view.session_id,
        view.evaluation.accuracy_display
    );

    Ok(Json(view))
}

/// Get session state
pub async fn get(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<SessionView>> {
    let view = state.sessions
        .view(id)
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(view))
}

/// Move the sliders; only the prediction is recomputed
pub async fn set_controls(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<ControlInput>,
) -> AppResult<Json<SessionView>> {
    req.validate()?;

    let view = state.sessions
        .set_controls(id, req)
        .ok_or_else(|| session_not_found(id))?;

    tracing::debug!("Session {} controls updated: {}", id, view.prediction.label);
    Ok(Json(view))
}

/// One-off prediction, slider state untouched
pub async fn predict(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<ControlInput>,
) -> AppResult<Json<Prediction>> {
    req.validate()?;

    let trained = state.sessions
        .pipeline(id)
        .ok_or_else(|| session_not_found(id))?;

    Ok(Json(trained.predict(&req.into())))
}

/// Drop a session
pub async fn delete(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<DeleteSessionResponse>> {
    if !state.sessions.remove(id) {
        return Err(session_not_found(id));
    }

    tracing::info!("Session {} deleted", id);
    Ok(Json(DeleteSessionResponse {
        session_id: id,
        deleted: true,
    }))
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {} not found", id))
}
