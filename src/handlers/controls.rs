//! Slider bounds handler

use axum::Json;

use crate::models::ControlsResponse;

/// Describe the live prediction sliders
pub async fn describe() -> Json<ControlsResponse> {
    Json(ControlsResponse::describe())
}
