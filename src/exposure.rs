//! Exposure solver
//!
//! The solver relates ambient light to the four exposure parameters through
//! the incident-light meter equation
//!
//! ```text
//! lux = K * aperture^2 / (iso * shutter_seconds) * 2^ec
//! ```
//!
//! and inverts it for whichever parameter is selected. Positive exposure
//! compensation asks for more exposure than metered.

use crate::{LightMeterError, Result};

/// Incident-light meter calibration constant (flat diffuser).
pub const CALIBRATION_CONSTANT: f32 = 273.8;

/// ISO used when no valid value is available.
pub const DEFAULT_ISO: f32 = 100.0;

/// Aperture (f-number) used when no valid value is available.
pub const DEFAULT_APERTURE: f32 = 2.8;

/// Shutter time used when no valid value is available.
pub const DEFAULT_SHUTTER_SECONDS: f32 = 0.02; // s, 1/50 s

/// Exposure compensation used when no valid value is available.
pub const DEFAULT_EC: f32 = 0.0;

/// The exposure parameter that is solved for. Also names the corresponding field.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum SolveTarget {
    /// Sensitivity
    Iso,
    /// Exposure time
    Shutter,
    /// f-number
    Aperture,
    /// Exposure compensation in stops
    Ec,
}

impl SolveTarget {
    /// All targets, in display order.
    pub const ALL: [SolveTarget; 4] = [
        SolveTarget::Iso,
        SolveTarget::Shutter,
        SolveTarget::Aperture,
        SolveTarget::Ec,
    ];
}

/// The last known value of each exposure parameter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExposureState {
    /// Sensitivity
    pub iso: f32,

    /// Exposure time in seconds, the reciprocal of the displayed shutter speed.
    pub shutter_seconds: f32,

    /// Aperture as f-number
    pub aperture: f32,

    /// Exposure compensation in stops
    pub ec: f32,
}

impl Default for ExposureState {
    fn default() -> Self {
        Self {
            iso: DEFAULT_ISO,
            shutter_seconds: DEFAULT_SHUTTER_SECONDS,
            aperture: DEFAULT_APERTURE,
            ec: DEFAULT_EC,
        }
    }
}

impl ExposureState {
    pub fn new(iso: f32, shutter_seconds: f32, aperture: f32, ec: f32) -> Self {
        Self {
            iso,
            shutter_seconds,
            aperture,
            ec,
        }
    }

    /// Value of a single field.
    pub fn get(&self, field: SolveTarget) -> f32 {
        match field {
            SolveTarget::Iso => self.iso,
            SolveTarget::Shutter => self.shutter_seconds,
            SolveTarget::Aperture => self.aperture,
            SolveTarget::Ec => self.ec,
        }
    }

    /// Replace a single field, leaving the others untouched.
    pub fn with(mut self, field: SolveTarget, value: f32) -> Self {
        match field {
            SolveTarget::Iso => self.iso = value,
            SolveTarget::Shutter => self.shutter_seconds = value,
            SolveTarget::Aperture => self.aperture = value,
            SolveTarget::Ec => self.ec = value,
        }
        self
    }

    /// The shutter speed as displayed, i.e. `x` in `1/x` s.
    pub fn shutter_speed(&self) -> f32 {
        1.0 / self.shutter_seconds
    }

    /// Returns a copy where every field that can not be fed into the formula
    /// is replaced with the value from `defaults`.
    ///
    /// ISO, shutter time and aperture must be positive and finite, exposure
    /// compensation must be finite.
    pub fn sanitized(self, defaults: &ExposureState) -> Self {
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        Self {
            iso: positive(self.iso, defaults.iso),
            shutter_seconds: positive(self.shutter_seconds, defaults.shutter_seconds),
            aperture: positive(self.aperture, defaults.aperture),
            ec: if self.ec.is_finite() {
                self.ec
            } else {
                defaults.ec
            },
        }
    }

    /// Solve for `target` and return the state with only that field replaced.
    pub fn solved(&self, lux: f32, target: SolveTarget, k: f32) -> Result<Self> {
        let value = solve(lux, self, target, k)?;
        Ok(self.with(target, value))
    }
}

/// Compute the value of `target` from `lux` and the three other fields of `state`.
///
/// The field of `state` named by `target` is ignored. Division by zero (zero lux
/// included) and an ISO, shutter time or aperture that is not a positive
/// finite number yield [`LightMeterError::UndefinedResult`], negative lux or a
/// negative operand of the aperture square root yields
/// [`LightMeterError::DomainError`].
pub fn solve(lux: f32, state: &ExposureState, target: SolveTarget, k: f32) -> Result<f32> {
    check_lux(lux)?;
    let k = divisor(k)?;
    let compensation = libm::exp2f(state.ec);

    let value = match target {
        SolveTarget::Iso => {
            let aperture_sq = state.aperture * state.aperture;
            k * aperture_sq / lux / divisor(state.shutter_seconds)? * compensation
        }
        SolveTarget::Shutter => {
            let aperture_sq = state.aperture * state.aperture;
            k * aperture_sq / lux / divisor(state.iso)? * compensation
        }
        SolveTarget::Aperture => {
            let product = lux / k * state.iso * state.shutter_seconds;
            if product < 0.0 {
                return Err(LightMeterError::DomainError);
            }
            libm::sqrtf(divisor(product)?) / libm::exp2f(state.ec / 2.0)
        }
        SolveTarget::Ec => {
            let aperture_sq = divisor(state.aperture * state.aperture)?;
            let reference = k * aperture_sq / divisor(state.iso)? / divisor(state.shutter_seconds)?;
            libm::log2f(lux / divisor(reference)?)
        }
    };

    match target {
        SolveTarget::Ec => finite(value),
        // ISO, shutter time and aperture must stay positive, an extreme
        // compensation can round them to zero or infinity
        _ => divisor(value),
    }
}

/// The light level (lux) the settings in `state` are correct for.
pub fn metered_lux(state: &ExposureState, k: f32) -> Result<f32> {
    let aperture_sq = divisor(state.aperture * state.aperture)?;
    let lux = divisor(k)? * aperture_sq / divisor(state.iso)? / divisor(state.shutter_seconds)?
        * libm::exp2f(state.ec);

    finite(lux)
}

/// Exposure value of the settings in `state`, normalised to ISO 100 (EV100).
///
/// Exposure compensation is not part of the settings and is ignored.
pub fn exposure_value(state: &ExposureState) -> Result<f32> {
    let aperture_sq = divisor(state.aperture * state.aperture)?;
    let ev = libm::log2f(aperture_sq / divisor(state.shutter_seconds)?)
        - libm::log2f(divisor(state.iso)? / DEFAULT_ISO);

    finite(ev)
}

fn check_lux(lux: f32) -> Result<()> {
    if lux.is_nan() || lux < 0.0 {
        return Err(LightMeterError::DomainError);
    }
    if lux == 0.0 || lux.is_infinite() {
        return Err(LightMeterError::UndefinedResult);
    }
    Ok(())
}

// Divisors have to be positive and finite
fn divisor(value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LightMeterError::UndefinedResult)
    }
}

fn finite(value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LightMeterError::UndefinedResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        let tolerance = 1e-4 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_solve_aperture() {
        let state = ExposureState::new(100.0, 1.0, 0.0, 0.0);
        let aperture = solve(273.8, &state, SolveTarget::Aperture, CALIBRATION_CONSTANT).unwrap();
        assert_close(aperture, 10.0);
    }

    #[test]
    fn test_solve_iso() {
        let state = ExposureState::new(0.0, 0.02, 2.8, 0.0);
        let iso = solve(100.0, &state, SolveTarget::Iso, CALIBRATION_CONSTANT).unwrap();

        // 273.8 * 2.8^2 / 100 / 0.02
        assert_close(iso, 1073.296);
    }

    #[test]
    fn test_solve_shutter() {
        // Sunny 16: bright sun at ISO 100 and f/16 wants roughly 1/100 s
        let state = ExposureState::new(100.0, 0.0, 16.0, 0.0);
        let shutter = solve(
            CALIBRATION_CONSTANT * 256.0 * 100.0 / 100.0,
            &state,
            SolveTarget::Shutter,
            CALIBRATION_CONSTANT,
        )
        .unwrap();
        assert_close(shutter, 0.01);
        assert_close(state.with(SolveTarget::Shutter, shutter).shutter_speed(), 100.0);
    }

    #[test]
    fn test_solve_ec() {
        let state = ExposureState::new(100.0, 1.0, 10.0, 0.0);

        // Twice the light of a metered exposure is one stop over
        let ec = solve(2.0 * 273.8, &state, SolveTarget::Ec, CALIBRATION_CONSTANT).unwrap();
        assert_close(ec, 1.0);

        let ec = solve(273.8 / 4.0, &state, SolveTarget::Ec, CALIBRATION_CONSTANT).unwrap();
        assert_close(ec, -2.0);
    }

    #[test]
    fn test_positive_ec_adds_exposure() {
        let metered = ExposureState::new(0.0, 0.02, 2.8, 0.0);
        let plus_one = ExposureState::new(0.0, 0.02, 2.8, 1.0);

        let iso = solve(100.0, &metered, SolveTarget::Iso, CALIBRATION_CONSTANT).unwrap();
        let iso_plus_one = solve(100.0, &plus_one, SolveTarget::Iso, CALIBRATION_CONSTANT).unwrap();
        assert_close(iso_plus_one, 2.0 * iso);

        let metered = metered.with(SolveTarget::Iso, 400.0);
        let plus_one = plus_one.with(SolveTarget::Iso, 400.0);
        let aperture = solve(100.0, &metered, SolveTarget::Aperture, CALIBRATION_CONSTANT).unwrap();
        let aperture_plus_one =
            solve(100.0, &plus_one, SolveTarget::Aperture, CALIBRATION_CONSTANT).unwrap();
        assert_close(aperture_plus_one, aperture / core::f32::consts::SQRT_2);
    }

    #[test]
    fn test_round_trip() {
        let states = [
            ExposureState::new(100.0, 0.02, 2.8, 0.0),
            ExposureState::new(3200.0, 1.0 / 8000.0, 1.4, -1.7),
            ExposureState::new(50.0, 30.0, 22.0, 2.3),
            ExposureState::new(400.0, 0.5, 5.6, 0.33),
        ];

        for state in states {
            let lux = metered_lux(&state, CALIBRATION_CONSTANT).unwrap();

            for target in SolveTarget::ALL {
                let value = solve(lux, &state, target, CALIBRATION_CONSTANT).unwrap();
                let expected = state.get(target);
                let tolerance = 1e-3 * expected.abs().max(1.0);
                assert!(
                    (value - expected).abs() <= tolerance,
                    "{:?} of {:?}: expected {} but got {}",
                    target,
                    state,
                    expected,
                    value
                );
            }
        }
    }

    #[test]
    fn test_solved_leaves_other_fields() {
        let state = ExposureState::new(100.0, 1.0, 4.0, 0.5);
        let solved = state
            .solved(273.8, SolveTarget::Aperture, CALIBRATION_CONSTANT)
            .unwrap();

        assert_eq!(solved.iso, state.iso);
        assert_eq!(solved.shutter_seconds, state.shutter_seconds);
        assert_eq!(solved.ec, state.ec);
        assert_ne!(solved.aperture, state.aperture);
    }

    #[test]
    fn test_zero_lux_is_undefined() {
        let state = ExposureState::default();
        for target in SolveTarget::ALL {
            assert_eq!(
                solve(0.0, &state, target, CALIBRATION_CONSTANT),
                Err(LightMeterError::UndefinedResult)
            );
        }
    }

    #[test]
    fn test_zero_divisors_are_undefined() {
        let state = ExposureState::new(0.0, 0.0, 2.8, 0.0);
        assert_eq!(
            solve(100.0, &state, SolveTarget::Iso, CALIBRATION_CONSTANT),
            Err(LightMeterError::UndefinedResult)
        );
        assert_eq!(
            solve(100.0, &state, SolveTarget::Shutter, CALIBRATION_CONSTANT),
            Err(LightMeterError::UndefinedResult)
        );
        assert_eq!(
            solve(100.0, &state, SolveTarget::Aperture, CALIBRATION_CONSTANT),
            Err(LightMeterError::UndefinedResult)
        );
        assert_eq!(
            solve(
                100.0,
                &ExposureState::new(100.0, 0.02, 0.0, 0.0),
                SolveTarget::Ec,
                CALIBRATION_CONSTANT
            ),
            Err(LightMeterError::UndefinedResult)
        );
        assert_eq!(
            solve(100.0, &ExposureState::default(), SolveTarget::Iso, 0.0),
            Err(LightMeterError::UndefinedResult)
        );
    }

    #[test]
    fn test_extreme_compensation_is_undefined() {
        // 2^-200 rounds to zero, 2^150 and 2^300 overflow
        let underexposed = ExposureState::new(100.0, 0.02, 2.8, -200.0);
        let overexposed = ExposureState::new(100.0, 0.02, 2.8, 300.0);

        for (state, target) in [
            (underexposed, SolveTarget::Iso),
            (underexposed, SolveTarget::Shutter),
            (overexposed, SolveTarget::Iso),
            (overexposed, SolveTarget::Shutter),
            (overexposed, SolveTarget::Aperture),
        ] {
            assert_eq!(
                solve(100.0, &state, target, CALIBRATION_CONSTANT),
                Err(LightMeterError::UndefinedResult),
                "{:?} of {:?}",
                target,
                state
            );
            assert_eq!(
                state.solved(100.0, target, CALIBRATION_CONSTANT),
                Err(LightMeterError::UndefinedResult)
            );
        }
    }

    #[test]
    fn test_negative_values_are_domain_errors() {
        let state = ExposureState::default();
        for target in SolveTarget::ALL {
            assert_eq!(
                solve(-5.0, &state, target, CALIBRATION_CONSTANT),
                Err(LightMeterError::DomainError)
            );
        }

        let negative_iso = ExposureState::new(-100.0, 0.02, 2.8, 0.0);
        assert_eq!(
            solve(100.0, &negative_iso, SolveTarget::Aperture, CALIBRATION_CONSTANT),
            Err(LightMeterError::DomainError)
        );
        assert_eq!(
            solve(f32::NAN, &state, SolveTarget::Iso, CALIBRATION_CONSTANT),
            Err(LightMeterError::DomainError)
        );
    }

    #[test]
    fn test_sanitized() {
        let defaults = ExposureState::default();
        let state = ExposureState::new(-1.0, 0.0, f32::NAN, f32::INFINITY).sanitized(&defaults);
        assert_eq!(state, defaults);

        let state = ExposureState::new(200.0, 0.5, 8.0, -1.0);
        assert_eq!(state.sanitized(&defaults), state);
    }

    #[test]
    fn test_exposure_value() {
        // f/1.0 at 1 s and ISO 100 is EV 0 by definition
        let ev = exposure_value(&ExposureState::new(100.0, 1.0, 1.0, 0.0)).unwrap();
        assert_close(ev, 0.0);

        // f/16 at 1/125 s and ISO 100
        let ev = exposure_value(&ExposureState::new(100.0, 1.0 / 125.0, 16.0, 0.0)).unwrap();
        assert_close(ev, 14.965784);

        // Doubling the ISO takes one stop off the EV
        let ev = exposure_value(&ExposureState::new(200.0, 1.0, 1.0, 0.0)).unwrap();
        assert_close(ev, -1.0);

        assert_eq!(
            exposure_value(&ExposureState::new(100.0, 0.0, 1.0, 0.0)),
            Err(LightMeterError::UndefinedResult)
        );
    }
}
