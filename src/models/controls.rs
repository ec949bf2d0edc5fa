//! Live prediction controls (slider inputs)

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::observation::Observation;

pub const TEMPERATURE_RANGE: (f64, f64) = (50.0, 110.0);
pub const VIBRATION_RANGE: (f64, f64) = (0.0, 15.0);
pub const PRESSURE_RANGE: (f64, f64) = (50.0, 150.0);
pub const DOWNTIME_RANGE: (u8, u8) = (0, 4);

/// Slider state sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ControlInput {
    #[validate(range(min = 50.0, max = 110.0))]
    pub temperature: f64,

    #[validate(range(min = 0.0, max = 15.0))]
    pub vibration: f64,

    #[validate(range(min = 50.0, max = 150.0))]
    pub pressure: f64,

    #[validate(range(min = 0, max = 4))]
    pub downtime_hrs: u8,
}

impl Default for ControlInput {
    fn default() -> Self {
        Self {
            temperature: 75.0,
            vibration: 5.0,
            pressure: 100.0,
            downtime_hrs: 0,
        }
    }
}

impl From<ControlInput> for Observation {
    fn from(input: ControlInput) -> Self {
        Observation::new(
            input.temperature,
            input.vibration,
            input.pressure,
            f64::from(input.downtime_hrs),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SliderBounds {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub integer: bool,
}

#[derive(Debug, Serialize)]
pub struct ControlsResponse {
    pub controls: Vec<SliderBounds>,
}

impl ControlsResponse {
    pub fn describe() -> Self {
        let defaults = ControlInput::default();
        Self {
            controls: vec![
                SliderBounds {
                    name: "temperature",
                    min: TEMPERATURE_RANGE.0,
                    max: TEMPERATURE_RANGE.1,
                    default: defaults.temperature,
                    integer: false,
                },
                SliderBounds {
                    name: "vibration",
                    min: VIBRATION_RANGE.0,
                    max: VIBRATION_RANGE.1,
                    default: defaults.vibration,
                    integer: false,
                },
                SliderBounds {
                    name: "pressure",
                    min: PRESSURE_RANGE.0,
                    max: PRESSURE_RANGE.1,
                    default: defaults.pressure,
                    integer: false,
                },
                SliderBounds {
                    name: "downtime_hrs",
                    min: f64::from(DOWNTIME_RANGE.0),
                    max: f64::from(DOWNTIME_RANGE.1),
                    default: f64::from(defaults.downtime_hrs),
                    integer: true,
                },
            ],
        }
    }
}
