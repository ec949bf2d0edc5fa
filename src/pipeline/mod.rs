//! Predictive pipeline
//!
//! One run: validate size → synthesize → label → train → evaluate.
//! Runs are synchronous and self-contained; the result is an immutable
//! `TrainedPipeline` that sessions share through the cache.

pub mod cache;
pub mod classifier;
pub mod evaluate;
pub mod ingest;
pub mod synth;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{label_rows, Observation, Outcome, Prediction};
use classifier::{LogisticModel, TrainingSettings};
use evaluate::Evaluation;
use ingest::Dataset;
use synth::SyntheticSpec;

pub use cache::{CacheKey, PipelineCache};

/// Pipeline failures. Display text is what the user sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Need at least {required} rows!")]
    InsufficientRows { found: usize, required: usize },

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Unsupported file type '.{0}' (use CSV or Excel .xlsx)")]
    UnsupportedFormat(String),

    #[error("Workbook has no data")]
    EmptyWorkbook,

    #[error("Could not read file: {0}")]
    Parse(String),

    #[error("Synthetic data error: {0}")]
    Synthesis(String),

    #[error("Training failed: {0}")]
    Training(String),
}

/// Training parameters; part of the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PipelineParams {
    /// Minimum upload size, also the number of real rows used for training
    pub min_rows: usize,
    pub holdout_rows: usize,
    pub synthetic_rows: usize,
    pub max_iter: usize,
    pub seed: Option<u64>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            min_rows: 100,
            holdout_rows: 100,
            synthetic_rows: 1000,
            max_iter: 1000,
            seed: None,
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct TrainedPipeline {
    pub dataset_digest: String,
    pub uploaded_rows: usize,
    pub real_training_rows: usize,
    pub synthetic_rows: usize,
    pub training_rows: usize,
    pub seed: u64,
    pub model: LogisticModel,
    pub evaluation: Evaluation,
    pub trained_at: DateTime<Utc>,
}

impl TrainedPipeline {
    pub fn predict(&self, observation: &Observation) -> Prediction {
        let outcome = self.model.predict(observation);
        Prediction {
            failure: outcome,
            label: outcome.label(),
            color: outcome.color(),
            probability: self.model.predict_probability(observation),
            rule_failure: observation.rule_outcome(),
        }
    }
}

/// SHA-256 of the uploaded bytes, hex encoded
pub fn dataset_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Reject uploads that are too small to train on
pub fn validate_size(dataset: &Dataset, min_rows: usize) -> Result<(), PipelineError> {
    if dataset.len() < min_rows {
        return Err(PipelineError::InsufficientRows {
            found: dataset.len(),
            required: min_rows,
        });
    }
    Ok(())
}

/// Train and evaluate on an already-parsed dataset
pub fn run(
    dataset: &Dataset,
    digest: String,
    params: &PipelineParams,
) -> Result<TrainedPipeline, PipelineError> {
    validate_size(dataset, params.min_rows)?;

    let (mut rng, seed) = synth::make_rng(params.seed);
    let synthetic = synth::synthesize(&SyntheticSpec::with_rows(params.synthetic_rows), &mut rng)?;
    tracing::debug!("Generated {} synthetic rows (seed {})", synthetic.len(), seed);

    let real = &dataset.rows[..params.min_rows];
    let mut training = label_rows(real);
    training.extend(label_rows(&synthetic));

    let settings = TrainingSettings {
        max_iter: params.max_iter,
        ..Default::default()
    };
    let model = classifier::train(&training, &settings)?;
    tracing::debug!(
        "Model fit on {} rows in {} iterations (converged: {})",
        training.len(),
        model.iterations,
        model.converged
    );

    let (holdout, source) =
        evaluate::select_holdout(&dataset.rows, params.min_rows, params.holdout_rows);
    let evaluation = evaluate::evaluate(&model, &label_rows(holdout), source);

    let failures = training.iter().filter(|s| s.failure == Outcome::Failure).count();
    tracing::info!(
        "Pipeline complete: accuracy {} on {} holdout rows ({:?}), \
         {} / {} training rows labelled failure",
        evaluation.accuracy_display,
        evaluation.holdout_rows,
        evaluation.holdout_source,
        failures,
        training.len()
    );

    Ok(TrainedPipeline {
        dataset_digest: digest,
        uploaded_rows: dataset.len(),
        real_training_rows: real.len(),
        synthetic_rows: synthetic.len(),
        training_rows: training.len(),
        seed,
        model,
        evaluation,
        trained_at: Utc::now(),
    })
}

/// Ingest raw upload bytes then run the pipeline
pub fn run_upload(
    file_name: Option<&str>,
    bytes: &[u8],
    params: &PipelineParams,
) -> Result<TrainedPipeline, PipelineError> {
    let dataset = ingest::parse_upload(file_name, bytes)?;
    tracing::debug!("Parsed {} rows from {:?}", dataset.len(), file_name);
    run(&dataset, dataset_digest(bytes), params)
}


#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::{plant_csv, plant_xlsx};

    fn seeded() -> PipelineParams {
        PipelineParams {
            seed: Some(2024),
            ..Default::default()
        }
    }

    #[test]
    fn test_fifty_rows_rejected() {
        let csv = plant_csv(50, 1);
        let err = run_upload(Some("small.csv"), csv.as_bytes(), &seeded()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientRows { found: 50, required: 100 }));
        assert_eq!(err.to_string(), "Need at least 100 rows!");
    }

    #[test]
    fn test_exactly_hundred_rows_accepted() {
        let csv = plant_csv(100, 2);
        let result = run_upload(Some("plant.csv"), csv.as_bytes(), &seeded()).unwrap();
        assert_eq!(result.training_rows, 1100);
        assert_eq!(result.evaluation.holdout_source, evaluate::HoldoutSource::ReusedTrainingRows);
        assert_eq!(result.evaluation.holdout_rows, 100);
    }

    #[test]
    fn test_end_to_end_two_hundred_fifty_rows() {
        let csv = plant_csv(250, 3);
        let result = run_upload(Some("plant.csv"), csv.as_bytes(), &seeded()).unwrap();

        assert_eq!(result.uploaded_rows, 250);
        assert_eq!(result.real_training_rows, 100);
        assert_eq!(result.synthetic_rows, 1000);
        assert_eq!(result.training_rows, 1100);
        assert_eq!(result.evaluation.holdout_rows, 100);
        assert_eq!(result.evaluation.holdout_source, evaluate::HoldoutSource::Unseen);
        assert!((0.0..=1.0).contains(&result.evaluation.accuracy));
        // a linear fit of the OR rule lands well above chance
        assert!(result.evaluation.accuracy > 0.6, "accuracy {}", result.evaluation.accuracy);

        // hot but still: the rule flags it, the linear fit does not
        let slider = Observation::new(90.0, 1.0, 100.0, 0.0);
        let prediction = result.predict(&slider);
        assert_eq!(prediction.rule_failure, Outcome::Failure);
        assert_eq!(prediction.failure, Outcome::Normal);
        assert_eq!(prediction.label, "NORMAL");
        assert!(prediction.probability < 0.5, "probability {}", prediction.probability);

        let extreme = result.predict(&Observation::new(110.0, 14.0, 100.0, 4.0));
        assert_eq!(extreme.failure, Outcome::Failure);
        assert_eq!(extreme.label, "FAILURE");
        assert_eq!(extreme.color, "red");

        let calm = result.predict(&Observation::new(60.0, 2.0, 100.0, 0.0));
        assert_eq!(calm.failure, Outcome::Normal);
        assert_eq!(calm.color, "green");
    }

    #[test]
    fn test_end_to_end_from_workbook() {
        let xlsx = plant_xlsx(250, 3);
        let result = run_upload(Some("plant.xlsx"), &xlsx, &seeded()).unwrap();

        assert_eq!(result.uploaded_rows, 250);
        assert_eq!(result.training_rows, 1100);
        assert_eq!(result.evaluation.holdout_rows, 100);
        assert_eq!(result.evaluation.holdout_source, evaluate::HoldoutSource::Unseen);
        assert!(result.evaluation.accuracy > 0.6, "accuracy {}", result.evaluation.accuracy);
        assert_eq!(result.dataset_digest, dataset_digest(&xlsx));

        // no extension: the ZIP signature picks the workbook reader
        let sniffed = run_upload(None, &xlsx, &seeded()).unwrap();
        assert_eq!(sniffed.model.weights, result.model.weights);
    }

    #[test]
    fn test_small_workbook_rejected() {
        let err = run_upload(Some("plant.xlsx"), &plant_xlsx(60, 1), &seeded()).unwrap_err();
        assert_eq!(err.to_string(), "Need at least 100 rows!");
    }

    #[test]
    fn test_same_seed_reproducible() {
        let csv = plant_csv(220, 4);
        let a = run_upload(Some("a.csv"), csv.as_bytes(), &seeded()).unwrap();
        let b = run_upload(Some("b.csv"), csv.as_bytes(), &seeded()).unwrap();
        assert_eq!(a.seed, 2024);
        assert_eq!(a.model.weights, b.model.weights);
        assert_eq!(a.evaluation.accuracy, b.evaluation.accuracy);
        assert_eq!(a.dataset_digest, b.dataset_digest);
    }

    #[test]
    fn test_in_sample_fallback_not_worse_on_average() {
        let mut in_sample = 0.0;
        let mut out_of_sample = 0.0;
        for seed in 0..5u64 {
            let csv = plant_csv(200, 100 + seed);
            let dataset = ingest::read_csv(csv.as_bytes()).unwrap();
            let params = PipelineParams {
                seed: Some(seed),
                ..Default::default()
            };
            let result = run(&dataset, dataset_digest(csv.as_bytes()), &params).unwrap();
            out_of_sample += result.evaluation.accuracy;

            let reused = evaluate::evaluate(
                &result.model,
                &label_rows(&dataset.rows[..100]),
                evaluate::HoldoutSource::ReusedTrainingRows,
            );
            in_sample += reused.accuracy;
        }
        // same distribution on both sides; allow sampling noise
        assert!(in_sample + 0.25 >= out_of_sample, "{} vs {}", in_sample, out_of_sample);
    }

    #[test]
    fn test_missing_column_aborts_before_training() {
        let csv = "temperature,vibration,pressure\n".to_string() + &"80,5,100\n".repeat(150);
        let err = run_upload(Some("plant.csv"), csv.as_bytes(), &seeded()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: downtime_hrs");
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(dataset_digest(b"abc"), dataset_digest(b"abc"));
        assert_ne!(dataset_digest(b"abc"), dataset_digest(b"abd"));
        assert_eq!(dataset_digest(b"").len(), 64);
    }
}
