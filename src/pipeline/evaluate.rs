//! Holdout selection and accuracy reporting

use serde::Serialize;

use super::classifier::LogisticModel;
use crate::models::{LabeledObservation, Observation, Outcome};

/// Where the holdout rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldoutSource {
    /// Rows after the training block, never seen in training
    Unseen,
    /// Upload too short, so the training rows are scored again
    ReusedTrainingRows,
}

/// Pick holdout rows: `[train_rows, train_rows + holdout_rows)` when the
/// upload has that many rows, else the first `train_rows` rows again.
pub fn select_holdout(
    rows: &[Observation],
    train_rows: usize,
    holdout_rows: usize,
) -> (&[Observation], HoldoutSource) {
    let end = train_rows + holdout_rows;
    if rows.len() >= end {
        (&rows[train_rows..end], HoldoutSource::Unseen)
    } else {
        (&rows[..train_rows.min(rows.len())], HoldoutSource::ReusedTrainingRows)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    /// Accuracy as a percentage with one decimal, e.g. `92.0%`
    pub accuracy_display: String,
    pub holdout_rows: usize,
    pub holdout_source: HoldoutSource,
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Score the model against rule-derived labels
pub fn evaluate(
    model: &LogisticModel,
    holdout: &[LabeledObservation],
    source: HoldoutSource,
) -> Evaluation {
    let (mut tp, mut tn, mut fp, mut fn_) = (0, 0, 0, 0);

    for sample in holdout {
        match (model.predict(&sample.observation), sample.failure) {
            (Outcome::Failure, Outcome::Failure) => tp += 1,
            (Outcome::Normal, Outcome::Normal) => tn += 1,
            (Outcome::Failure, Outcome::Normal) => fp += 1,
            (Outcome::Normal, Outcome::Failure) => fn_ += 1,
        }
    }

    let accuracy = if holdout.is_empty() {
        0.0
    } else {
        (tp + tn) as f64 / holdout.len() as f64
    };

    Evaluation {
        accuracy,
        accuracy_display: format_percent(accuracy),
        holdout_rows: holdout.len(),
        holdout_source: source,
        true_positives: tp,
        true_negatives: tn,
        false_positives: fp,
        false_negatives: fn_,
    }
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label_rows;
    use crate::pipeline::classifier::{train, TrainingSettings};

    fn rows(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                Observation::new(60.0 + (i % 40) as f64, (i % 11) as f64, 100.0, (i % 5) as f64)
            })
            .collect()
    }

    #[test]
    fn test_holdout_unseen_when_enough_rows() {
        let data = rows(250);
        let (holdout, source) = select_holdout(&data, 100, 100);
        assert_eq!(source, HoldoutSource::Unseen);
        assert_eq!(holdout.len(), 100);
        assert_eq!(holdout[0], data[100]);
        assert_eq!(holdout[99], data[199]);
    }

    #[test]
    fn test_holdout_exactly_two_hundred() {
        let data = rows(200);
        let (holdout, source) = select_holdout(&data, 100, 100);
        assert_eq!(source, HoldoutSource::Unseen);
        assert_eq!(holdout[0], data[100]);
    }

    #[test]
    fn test_holdout_falls_back_to_training_rows() {
        let data = rows(150);
        let (holdout, source) = select_holdout(&data, 100, 100);
        assert_eq!(source, HoldoutSource::ReusedTrainingRows);
        assert_eq!(holdout, &data[..100]);
    }

    #[test]
    fn test_accuracy_in_unit_interval_and_counts_add_up() {
        let data = rows(300);
        let model = train(&label_rows(&data), &TrainingSettings::default()).unwrap();
        let report = evaluate(&model, &label_rows(&data[100..200]), HoldoutSource::Unseen);

        assert!((0.0..=1.0).contains(&report.accuracy));
        let total = report.true_positives
            + report.true_negatives
            + report.false_positives
            + report.false_negatives;
        assert_eq!(total, 100);
        assert!(report.accuracy_display.ends_with('%'));
    }

    #[test]
    fn test_empty_holdout_scores_zero() {
        let data = rows(50);
        let model = train(&label_rows(&data), &TrainingSettings::default()).unwrap();
        let report = evaluate(&model, &[], HoldoutSource::Unseen);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.holdout_rows, 0);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.92), "92.0%");
        assert_eq!(format_percent(1.0), "100.0%");
        assert_eq!(format_percent(0.8456), "84.6%");
    }
}
