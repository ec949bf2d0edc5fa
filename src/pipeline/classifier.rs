//! Logistic regression classifier
//!
//! Full-batch gradient descent on standardised features with an L2 penalty
//! (`C = 1` in the usual inverse-regularisation form). Iteration stops once
//! the gradient norm drops below `tolerance` or after `max_iter` steps.

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use super::PipelineError;
use crate::models::{LabeledObservation, Observation, Outcome, FEATURE_COUNT};

/// Training hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSettings {
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Inverse regularisation strength
    pub c: f64,
    pub tolerance: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 1.0,
            c: 1.0,
            tolerance: 1e-6,
        }
    }
}

/// Fitted model. Weights apply to standardised features.
#[derive(Debug, Clone, Serialize)]
pub struct LogisticModel {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
    pub means: [f64; FEATURE_COUNT],
    pub scales: [f64; FEATURE_COUNT],
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticModel {
    pub fn decision(&self, observation: &Observation) -> f64 {
        let features = observation.features();
        let mut score = self.bias;
        for i in 0..FEATURE_COUNT {
            score += self.weights[i] * (features[i] - self.means[i]) / self.scales[i];
        }
        score
    }

    pub fn predict_probability(&self, observation: &Observation) -> f64 {
        sigmoid(self.decision(observation))
    }

    pub fn predict(&self, observation: &Observation) -> Outcome {
        if self.decision(observation) > 0.0 {
            Outcome::Failure
        } else {
            Outcome::Normal
        }
    }
}

/// Fit a logistic regression on labelled rows
pub fn train(
    samples: &[LabeledObservation],
    settings: &TrainingSettings,
) -> Result<LogisticModel, PipelineError> {
    if samples.is_empty() {
        return Err(PipelineError::Training("no training rows".to_string()));
    }

    let positives = samples.iter().filter(|s| s.failure == Outcome::Failure).count();
    if positives == 0 || positives == samples.len() {
        return Err(PipelineError::Training(
            "training rows contain a single class".to_string(),
        ));
    }

    let m = samples.len();
    let mut x = Array2::<f64>::zeros((m, FEATURE_COUNT));
    for (mut row, sample) in x.axis_iter_mut(Axis(0)).zip(samples) {
        row.assign(&Array1::from(sample.observation.features().to_vec()));
    }
    let y: Array1<f64> = samples.iter().map(|s| s.failure.as_f64()).collect();

    let means = x
        .mean_axis(Axis(0))
        .ok_or_else(|| PipelineError::Training("empty design matrix".to_string()))?;
    let scales = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 1e-12 { s } else { 1.0 });
    let z = (&x - &means) / &scales;

    let n = m as f64;
    let l2 = 1.0 / (settings.c * n);
    let mut weights = Array1::<f64>::zeros(FEATURE_COUNT);
    let mut bias = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iter {
        let scores = z.dot(&weights) + bias;
        let error = scores.mapv(sigmoid) - &y;

        let grad_w = z.t().dot(&error) / n + &weights * l2;
        let grad_b = error.sum() / n;

        weights.scaled_add(-settings.learning_rate, &grad_w);
        bias -= settings.learning_rate * grad_b;
        iterations += 1;

        let grad_norm = (grad_w.dot(&grad_w) + grad_b * grad_b).sqrt();
        if grad_norm < settings.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!("Logistic regression hit max_iter={} before converging", settings.max_iter);
    }

    Ok(LogisticModel {
        weights: to_array(&weights),
        bias,
        means: to_array(&means),
        scales: to_array(&scales),
        iterations,
        converged,
    })
}

pub fn sigmoid(value: f64) -> f64 {
    if value >= 0.0 {
        1.0 / (1.0 + (-value).exp())
    } else {
        let z = value.exp();
        z / (1.0 + z)
    }
}

fn to_array(values: &Array1<f64>) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for (slot, value) in out.iter_mut().zip(values.iter()) {
        *slot = *value;
    }
    out
}
