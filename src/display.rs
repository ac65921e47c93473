//! Readouts for displaying field values
//!
//! Readouts implement [`core::fmt::Display`] with a fixed number of decimal
//! places, so no allocation is needed to show them.

use core::fmt;

use crate::{ExposureState, SolveTarget};

/// Placeholder shown instead of a value that could not be computed.
pub const UNDEFINED_PLACEHOLDER: &str = "--";

/// Decimal places used per field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Precision {
    pub iso: usize,
    /// Applies to the displayed shutter speed, not the exposure time.
    pub shutter: usize,
    pub aperture: usize,
    pub ec: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            iso: 0,
            shutter: 0,
            aperture: 1,
            ec: 1,
        }
    }
}

impl Precision {
    pub fn for_field(&self, field: SolveTarget) -> usize {
        match field {
            SolveTarget::Iso => self.iso,
            SolveTarget::Shutter => self.shutter,
            SolveTarget::Aperture => self.aperture,
            SolveTarget::Ec => self.ec,
        }
    }
}

/// A displayable value, or the marker for a failed computation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Readout {
    Value(f32),
    Undefined,
}

/// Formatted value of a single field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldReadout {
    pub field: SolveTarget,
    pub readout: Readout,
    precision: usize,
    signed: bool,
}

impl FieldReadout {
    /// Readout of `field` in `state`. The shutter field shows the shutter
    /// speed, i.e. `x` in `1/x` s.
    pub fn new(field: SolveTarget, state: &ExposureState, precision: &Precision) -> Self {
        let value = match field {
            SolveTarget::Shutter => state.shutter_speed(),
            _ => state.get(field),
        };

        let readout = if value.is_finite() {
            Readout::Value(value)
        } else {
            Readout::Undefined
        };

        Self {
            field,
            readout,
            precision: precision.for_field(field),
            signed: false,
        }
    }

    /// Readout showing the placeholder instead of a value.
    pub fn undefined(field: SolveTarget, precision: &Precision) -> Self {
        Self {
            field,
            readout: Readout::Undefined,
            precision: precision.for_field(field),
            signed: false,
        }
    }

    /// Always show the sign, e.g. `+0.7` for exposure compensation.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn value(&self) -> Option<f32> {
        match self.readout {
            Readout::Value(value) => Some(value),
            Readout::Undefined => None,
        }
    }
}

impl fmt::Display for FieldReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.readout {
            Readout::Undefined => f.write_str(UNDEFINED_PLACEHOLDER),
            Readout::Value(value) if self.signed => {
                write!(f, "{:+.*}", self.precision, normalize_zero(value, self.precision))
            }
            Readout::Value(value) => {
                write!(f, "{:.*}", self.precision, normalize_zero(value, self.precision))
            }
        }
    }
}

/// Replaces values shown as zero at `precision` decimal places by 0.0, so
/// small negative values such as -0.04 do not show up as "-0.0".
fn normalize_zero(value: f32, precision: usize) -> f32 {
    let scaled = value as f64 * libm::pow(10.0, precision as f64);

    // Exact halves round to even, i.e. to zero
    if libm::fabs(scaled) <= 0.5 {
        0.0
    } else {
        value
    }
}

/// The most recent light reading, shown as whole lux.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LuxReadout(pub Option<f32>);

impl fmt::Display for LuxReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(lux) if lux.is_finite() => write!(f, "{} lux", libm::truncf(lux) as i64),
            _ => write!(f, "{} lux", UNDEFINED_PLACEHOLDER),
        }
    }
}
