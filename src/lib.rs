//! This crate provides a platform agnostic no_std incident light meter.
//! It turns an ambient light reading in lux into a complete exposure by solving
//! for whichever of ISO, shutter time, aperture or exposure compensation is
//! currently selected, given the other three.
//!
//! Light readings can come from any [`LightSource`]. A driver for the BH1730FVC
//! ambient light sensor, compatible with the [`embedded-hal`](https://crates.io/crates/embedded-hal)
//! traits, is included.
//!
//! ## Supported features
//! * Solving ISO, shutter time, aperture or exposure compensation from lux
//! * Four-field and three-field (no exposure compensation) layouts
//! * Parsing user input with dot or comma decimal separators, with fallback defaults
//! * Fixed precision readouts, including signed exposure compensation
//! * BH1730FVC single-shot and continuous measurement, blocking or async (`async` feature)
//!
//! ## Unsupported features
//! * Persisting settings
//! * Calibration profiles
//! * Combining several sensors
//!
//! ## Usage
//!
//! ### Solving a single exposure parameter
//!
//! ```rust
//! use lightmeter::{solve, ExposureState, SolveTarget, CALIBRATION_CONSTANT};
//!
//! let state = ExposureState::new(100.0, 1.0, 2.8, 0.0);
//! let aperture = solve(273.8, &state, SolveTarget::Aperture, CALIBRATION_CONSTANT).unwrap();
//!
//! assert!((aperture - 10.0).abs() < 1e-4);
//! ```
//!
//! ### Running the meter
//!
//! ```rust
//! use lightmeter::{LightMeter, MeterConfig, Outcome, SensorStatus, SolveTarget};
//!
//! let mut meter = LightMeter::new(MeterConfig::default(), SensorStatus::Available);
//! meter.select(SolveTarget::Iso).unwrap();
//! meter.edit_field(SolveTarget::Shutter, "50").unwrap();
//!
//! // Every new reading recomputes the selected field
//! match meter.on_reading(100.0) {
//!     Outcome::Solved { value, .. } => println!("ISO {}", value),
//!     other => println!("nothing to show: {:?}", other),
//! }
//!
//! println!("ISO readout: {}", meter.readout(SolveTarget::Iso));
//! ```

#![cfg_attr(not(test), no_std)]

pub mod bh1730fvc;
pub mod config;
pub mod display;
pub mod exposure;
pub mod input;
pub mod meter;
pub mod selection;
pub mod source;

#[cfg(feature = "async")]
pub mod asynch;

pub use bh1730fvc::{Bh1730fvc, Gain, Mode, BH1730FVC_ADDR};
pub use config::MeterConfig;
pub use display::{FieldReadout, LuxReadout, Precision, Readout};
pub use exposure::{
    exposure_value, metered_lux, solve, ExposureState, SolveTarget, CALIBRATION_CONSTANT,
};
pub use input::{is_decimal, parse_decimal, parse_or, InputStatus};
pub use meter::{LightMeter, Outcome, SensorStatus};
pub use selection::{FieldSet, Selection};
pub use source::LightSource;

#[cfg(feature = "async")]
pub use asynch::Bh1730fvcAsync;

/// Shorthand for all functions returning an error in this crate.
pub type Result<T> = core::result::Result<T, LightMeterError>;

/// Represents any error that may happen while metering.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum LightMeterError {
    /// The text entered for a field is not a decimal number.
    InvalidNumber,
    /// The requested value involves a division by zero or a non-positive divisor.
    UndefinedResult,
    /// The requested value is outside the domain of the formula, e.g. negative lux.
    DomainError,
    /// No light sensor is present, live metering is not possible.
    SensorUnavailable,
    /// No valid data is available from the light sensor (yet).
    NoDataAvailable,
    /// An error occurred while reading from the sensor.
    ReadI2CError,
    /// An error occurred while writing to the sensor.
    WriteI2CError,
    /// Nothing can be solved because no field is selected.
    NoTargetSelected,
    /// The field is not part of the configured field set.
    TargetUnavailable,
    /// The field is currently solved by the meter and cannot be edited.
    FieldLocked,
}

impl core::fmt::Display for LightMeterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let message = match self {
            Self::InvalidNumber => "incorrect numerical value",
            Self::UndefinedResult => "result is undefined for the current values",
            Self::DomainError => "values are outside the domain of the exposure formula",
            Self::SensorUnavailable => "no light sensor available",
            Self::NoDataAvailable => "no light reading available yet",
            Self::ReadI2CError => "failed to read from the light sensor",
            Self::WriteI2CError => "failed to write to the light sensor",
            Self::NoTargetSelected => "no field selected for solving",
            Self::TargetUnavailable => "field is not part of the configured field set",
            Self::FieldLocked => "field is computed by the meter and cannot be edited",
        };

        f.write_str(message)
    }
}
