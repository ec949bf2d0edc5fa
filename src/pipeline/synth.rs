//! Synthetic observation generator

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use super::PipelineError;
use crate::models::Observation;

/// Mean / standard deviation pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

impl Gaussian {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    fn distribution(&self, column: &str) -> Result<Normal<f64>, PipelineError> {
        Normal::new(self.mean, self.std_dev)
            .map_err(|e| PipelineError::Synthesis(format!("{}: {}", column, e)))
    }
}

/// Distributions the synthetic batch is drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticSpec {
    pub rows: usize,
    pub temperature: Gaussian,
    pub vibration: Gaussian,
    pub pressure: Gaussian,
    /// Weights for downtime_hrs = 0, 1, 2, ...
    pub downtime_weights: Vec<f64>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            rows: 1000,
            temperature: Gaussian::new(75.0, 12.0),
            vibration: Gaussian::new(5.0, 2.5),
            pressure: Gaussian::new(100.0, 20.0),
            downtime_weights: vec![0.75, 0.10, 0.08, 0.04, 0.03],
        }
    }
}

impl SyntheticSpec {
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }
}

/// Seeded RNG, or an entropy-seeded one when no seed is configured.
/// Returns the seed actually used so runs can be reproduced.
pub fn make_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    (StdRng::seed_from_u64(seed), seed)
}

/// Draw `spec.rows` observations, each feature independently
pub fn synthesize<R: Rng + ?Sized>(
    spec: &SyntheticSpec,
    rng: &mut R,
) -> Result<Vec<Observation>, PipelineError> {
    let temperature = spec.temperature.distribution("temperature")?;
    let vibration = spec.vibration.distribution("vibration")?;
    let pressure = spec.pressure.distribution("pressure")?;
    let downtime = WeightedIndex::new(&spec.downtime_weights)
        .map_err(|e| PipelineError::Synthesis(format!("downtime_hrs: {}", e)))?;

    let rows = (0..spec.rows)
        .map(|_| Observation {
            temperature: temperature.sample(rng),
            vibration: vibration.sample(rng),
            pressure: pressure.sample(rng),
            downtime_hrs: downtime.sample(rng) as f64,
        })
        .collect();

    Ok(rows)
}
