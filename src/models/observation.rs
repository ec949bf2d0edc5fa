//! Observation model and failure label rule

use serde::Serialize;

/// Required feature columns, in model input order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] =
    ["temperature", "vibration", "pressure", "downtime_hrs"];

pub const FEATURE_COUNT: usize = 4;

/// Label rule thresholds (strictly greater than)
pub const TEMPERATURE_LIMIT: f64 = 85.0;
pub const VIBRATION_LIMIT: f64 = 8.0;
pub const DOWNTIME_LIMIT: f64 = 2.0;

/// One row of machine readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub downtime_hrs: f64,
}

impl Observation {
    pub fn new(temperature: f64, vibration: f64, pressure: f64, downtime_hrs: f64) -> Self {
        Self {
            temperature,
            vibration,
            pressure,
            downtime_hrs,
        }
    }

    /// Features in `FEATURE_COLUMNS` order
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.temperature, self.vibration, self.pressure, self.downtime_hrs]
    }

    /// Ground-truth outcome from the fixed rule
    pub fn rule_outcome(&self) -> Outcome {
        if self.temperature > TEMPERATURE_LIMIT
            || self.vibration > VIBRATION_LIMIT
            || self.downtime_hrs > DOWNTIME_LIMIT
        {
            Outcome::Failure
        } else {
            Outcome::Normal
        }
    }
}

/// Binary outcome, serialized as 0 / 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Normal,
    Failure,
}

impl Outcome {
    pub fn as_u8(self) -> u8 {
        match self {
            Outcome::Normal => 0,
            Outcome::Failure => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_u8())
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Normal => "NORMAL",
            Outcome::Failure => "FAILURE",
        }
    }

    /// Colour cue shown next to the label
    pub fn color(self) -> &'static str {
        match self {
            Outcome::Normal => "green",
            Outcome::Failure => "red",
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Observation with its rule-derived label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledObservation {
    pub observation: Observation,
    pub failure: Outcome,
}

/// Apply the label rule to each row independently
pub fn label_rows(rows: &[Observation]) -> Vec<LabeledObservation> {
    rows.iter()
        .map(|observation| LabeledObservation {
            observation: *observation,
            failure: observation.rule_outcome(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(t: f64, v: f64, d: f64) -> Observation {
        Observation::new(t, v, 100.0, d)
    }

    #[test]
    fn test_all_nominal_is_normal() {
        assert_eq!(obs(75.0, 5.0, 0.0).rule_outcome(), Outcome::Normal);
    }

    #[test]
    fn test_temperature_boundary() {
        assert_eq!(obs(85.0, 0.0, 0.0).rule_outcome(), Outcome::Normal);
        assert_eq!(obs(85.01, 0.0, 0.0).rule_outcome(), Outcome::Failure);
    }

    #[test]
    fn test_vibration_boundary() {
        assert_eq!(obs(60.0, 8.0, 0.0).rule_outcome(), Outcome::Normal);
        assert_eq!(obs(60.0, 8.01, 0.0).rule_outcome(), Outcome::Failure);
    }

    #[test]
    fn test_downtime_boundary() {
        assert_eq!(obs(60.0, 1.0, 2.0).rule_outcome(), Outcome::Normal);
        assert_eq!(obs(60.0, 1.0, 3.0).rule_outcome(), Outcome::Failure);
    }

    #[test]
    fn test_pressure_never_matters() {
        for pressure in [-1000.0, 0.0, 50.0, 150.0, 1e6] {
            let row = Observation::new(70.0, 2.0, pressure, 0.0);
            assert_eq!(row.rule_outcome(), Outcome::Normal);
        }
    }

    #[test]
    fn test_rule_is_logical_or_over_grid() {
        let temps = [84.99, 85.0, 85.01];
        let vibs = [7.99, 8.0, 8.01];
        let downs = [0.0, 1.0, 2.0, 3.0, 4.0];

        for &t in &temps {
            for &v in &vibs {
                for &d in &downs {
                    let expected = t > 85.0 || v > 8.0 || d > 2.0;
                    let got = obs(t, v, d).rule_outcome() == Outcome::Failure;
                    assert_eq!(got, expected, "t={} v={} d={}", t, v, d);
                }
            }
        }
    }

    #[test]
    fn test_label_rows_keeps_order() {
        let rows = vec![obs(90.0, 1.0, 0.0), obs(70.0, 1.0, 0.0)];
        let labeled = label_rows(&rows);
        assert_eq!(labeled.len(), 2);
        assert_eq!(labeled[0].failure, Outcome::Failure);
        assert_eq!(labeled[1].failure, Outcome::Normal);
        assert_eq!(labeled[1].observation, rows[1]);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Failure.label(), "FAILURE");
        assert_eq!(Outcome::Failure.color(), "red");
        assert_eq!(Outcome::Normal.label(), "NORMAL");
        assert_eq!(Outcome::Normal.color(), "green");
        assert_eq!(serde_json::to_string(&Outcome::Failure).unwrap(), "1");
    }
}
