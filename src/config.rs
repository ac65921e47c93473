//! Meter configuration

use crate::{ExposureState, FieldSet, Precision, CALIBRATION_CONSTANT};

/// Configuration of a [`LightMeter`](crate::LightMeter).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeterConfig {
    /// Meter calibration constant `K`.
    pub calibration_constant: f32,

    /// The fields offered for editing and solving.
    pub field_set: FieldSet,

    /// Values used at startup and whenever an input is not usable.
    pub defaults: ExposureState,

    /// Decimal places of the readouts.
    pub precision: Precision,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            calibration_constant: CALIBRATION_CONSTANT,
            field_set: FieldSet::Full,
            defaults: ExposureState::default(),
            precision: Precision::default(),
        }
    }
}

impl MeterConfig {
    /// Configuration of the three field meter without exposure compensation.
    pub fn without_compensation() -> Self {
        Self {
            field_set: FieldSet::WithoutCompensation,
            ..Self::default()
        }
    }

    pub fn with_calibration_constant(mut self, calibration_constant: f32) -> Self {
        self.calibration_constant = calibration_constant;
        self
    }

    pub fn with_defaults(mut self, defaults: ExposureState) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}
