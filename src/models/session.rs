//! Session API shapes

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::controls::ControlInput;
use super::observation::Outcome;
use crate::pipeline::evaluate::Evaluation;
use crate::pipeline::TrainedPipeline;

/// Single-row prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Model output, 0 = normal, 1 = failure
    pub failure: Outcome,
    pub label: &'static str,
    pub color: &'static str,
    pub probability: f64,
    /// What the label rule says for the same input
    pub rule_failure: Outcome,
}

#[derive(Debug, Serialize)]
pub struct TrainingSummary {
    pub dataset_digest: String,
    pub uploaded_rows: usize,
    pub real_training_rows: usize,
    pub synthetic_rows: usize,
    pub training_rows: usize,
    pub seed: u64,
    pub iterations: usize,
    pub converged: bool,
    pub trained_at: DateTime<Utc>,
}

impl From<&TrainedPipeline> for TrainingSummary {
    fn from(p: &TrainedPipeline) -> Self {
        Self {
            dataset_digest: p.dataset_digest.clone(),
            uploaded_rows: p.uploaded_rows,
            real_training_rows: p.real_training_rows,
            synthetic_rows: p.synthetic_rows,
            training_rows: p.training_rows,
            seed: p.seed,
            iterations: p.model.iterations,
            converged: p.model.converged,
            trained_at: p.trained_at,
        }
    }
}

/// Everything the client needs to render a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// True when the model came from the pipeline cache
    pub cached: bool,
    pub training: TrainingSummary,
    pub evaluation: Evaluation,
    pub controls: ControlInput,
    pub prediction: Prediction,
}

#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    pub session_id: Uuid,
    pub deleted: bool,
}
