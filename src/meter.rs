//! Light meter state
//!
//! [`LightMeter`] owns the exposure values shown to the user, the selection of
//! the solved field and the last light reading. Every new reading solves the
//! selected field and writes the result back, leaving all other fields as the
//! user entered them.

use crate::display::{FieldReadout, LuxReadout};
use crate::input::{self, InputStatus};
use crate::{
    exposure_value, solve, ExposureState, FieldSet, LightMeterError, LightSource, MeterConfig,
    Result, Selection, SolveTarget,
};

/// Whether live metering is possible.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SensorStatus {
    Available,
    Unavailable,
}

/// What happened to the selected field after a reading or an update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The selected field was solved and now holds `value`.
    Solved { target: SolveTarget, value: f32 },
    /// The selected field can not be computed from the current values, its
    /// readout shows a placeholder.
    Undefined {
        target: SolveTarget,
        error: LightMeterError,
    },
    /// No field is selected.
    NoTarget,
    /// No light reading has arrived yet.
    AwaitingReading,
    /// Readings are ignored while paused.
    Paused,
}

/// An incident light meter driven by light readings.
#[derive(Clone, Debug)]
pub struct LightMeter {
    config: MeterConfig,
    state: ExposureState,
    selection: Selection,
    lux: Option<f32>,
    /// Set while the selected field can not be computed.
    undefined: Option<LightMeterError>,
    sensor: SensorStatus,
    unavailable_notice_pending: bool,
    paused: bool,
}

impl LightMeter {
    /// Creates a meter showing the configured defaults with no field selected.
    pub fn new(config: MeterConfig, sensor: SensorStatus) -> Self {
        let mut state = config.defaults.sanitized(&ExposureState::default());
        if config.field_set == FieldSet::WithoutCompensation {
            state.ec = 0.0;
        }

        match sensor {
            SensorStatus::Available => log::info!("Light meter started"),
            SensorStatus::Unavailable => {
                log::warn!("Light meter started without light sensor, live metering disabled")
            }
        }

        Self {
            config: MeterConfig {
                defaults: state,
                ..config
            },
            state,
            selection: Selection::new(config.field_set),
            lux: None,
            undefined: None,
            sensor,
            unavailable_notice_pending: sensor == SensorStatus::Unavailable,
            paused: false,
        }
    }

    /// Select the field solved by the meter. Clears any previous selection.
    pub fn select(&mut self, target: SolveTarget) -> Result<()> {
        self.selection.select(target)?;
        self.undefined = None;
        log::info!("Solving for {:?}", target);
        Ok(())
    }

    /// Select `target`, or deselect it if it is already selected.
    pub fn toggle(&mut self, target: SolveTarget) -> Result<()> {
        self.selection.toggle(target)?;
        self.undefined = None;
        log::info!("Solving for {:?}", self.selection.active());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.undefined = None;
    }

    /// Apply text entered by the user.
    ///
    /// Text that is not a decimal number, or a value ISO, shutter or aperture
    /// can not take, sets the field to its default and reports
    /// [`InputStatus::Invalid`]. The shutter field takes the displayed shutter
    /// speed, i.e. `x` in `1/x` s.
    pub fn edit_field(&mut self, field: SolveTarget, text: &str) -> Result<InputStatus> {
        self.check_editable(field)?;

        let default = self.config.defaults.get(field);
        let (value, status) = match field {
            SolveTarget::Shutter => {
                let (speed, status) = input::parse_or(text, 1.0 / default);
                (1.0 / speed, status)
            }
            _ => input::parse_or(text, default),
        };

        if status.is_valid() && self.is_usable(field, value) {
            self.state = self.state.with(field, value);
            return Ok(InputStatus::Valid);
        }

        if status.is_valid() {
            log::debug!("Unusable {:?} value {}, using default", field, value);
        }
        self.state = self.state.with(field, default);
        Ok(InputStatus::Invalid)
    }

    /// Set a field to a numeric value. Values that can not be used fall back
    /// to the default. The shutter field takes the exposure time in seconds.
    pub fn set_field(&mut self, field: SolveTarget, value: f32) -> Result<InputStatus> {
        self.check_editable(field)?;

        let (value, status) = if self.is_usable(field, value) {
            (value, InputStatus::Valid)
        } else {
            (self.config.defaults.get(field), InputStatus::Invalid)
        };

        log::debug!("Set {:?} to {}", field, value);
        self.state = self.state.with(field, value);
        Ok(status)
    }

    /// Handle a new light reading and solve the selected field.
    ///
    /// Also used to enter a simulated reading when no sensor is available.
    pub fn on_reading(&mut self, lux: f32) -> Outcome {
        if self.paused {
            return Outcome::Paused;
        }

        self.lux = Some(lux);
        self.update()
    }

    /// Read from `source` and handle the reading.
    ///
    /// Source errors are returned as they are; a source reporting
    /// [`LightMeterError::SensorUnavailable`] disables live metering.
    pub fn poll<S: LightSource>(&mut self, mut source: S) -> Result<Outcome> {
        if self.paused {
            return Ok(Outcome::Paused);
        }

        match source.read_lux() {
            Ok(lux) => Ok(self.on_reading(lux)),
            Err(LightMeterError::SensorUnavailable) => {
                if self.sensor == SensorStatus::Available {
                    log::warn!("Light sensor became unavailable");
                    self.sensor = SensorStatus::Unavailable;
                    self.unavailable_notice_pending = true;
                }
                Err(LightMeterError::SensorUnavailable)
            }
            Err(e) => Err(e),
        }
    }

    /// Solve the selected field from the last reading.
    pub fn update(&mut self) -> Outcome {
        let Some(target) = self.selection.active() else {
            return Outcome::NoTarget;
        };
        let Some(lux) = self.lux else {
            return Outcome::AwaitingReading;
        };

        match solve(lux, &self.state, target, self.config.calibration_constant) {
            Ok(value) => {
                log::debug!("Solved {:?} = {} at {} lux", target, value, lux);
                self.state = self.state.with(target, value);
                self.undefined = None;
                Outcome::Solved { target, value }
            }
            Err(error) => {
                log::warn!("Can not solve {:?} at {} lux: {}", target, lux, error);
                self.undefined = Some(error);
                Outcome::Undefined { target, error }
            }
        }
    }

    /// Stop handling readings, e.g. while the application is in background.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Handle readings again. Values entered before pausing are kept.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Readout of a single field. The solved field shows a placeholder while
    /// it can not be computed.
    pub fn readout(&self, field: SolveTarget) -> FieldReadout {
        if self.undefined.is_some() && self.selection.is_selected(field) {
            return FieldReadout::undefined(field, &self.config.precision);
        }

        let readout = FieldReadout::new(field, &self.state, &self.config.precision);
        if field == SolveTarget::Ec {
            readout.signed()
        } else {
            readout
        }
    }

    /// Readout of the last light reading.
    pub fn lux_readout(&self) -> LuxReadout {
        LuxReadout(self.lux)
    }

    /// EV100 of the current values.
    pub fn exposure_value(&self) -> Result<f32> {
        exposure_value(&self.state)
    }

    pub fn state(&self) -> &ExposureState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// The last light reading, if any arrived.
    pub fn last_lux(&self) -> Option<f32> {
        self.lux
    }

    pub fn sensor_status(&self) -> SensorStatus {
        self.sensor
    }

    /// Returns `true` once after the sensor was found unavailable, so the
    /// user can be notified a single time.
    pub fn take_unavailable_notice(&mut self) -> bool {
        core::mem::take(&mut self.unavailable_notice_pending)
    }

    fn check_editable(&self, field: SolveTarget) -> Result<()> {
        if !self.selection.field_set().contains(field) {
            return Err(LightMeterError::TargetUnavailable);
        }
        if self.selection.is_selected(field) {
            return Err(LightMeterError::FieldLocked);
        }
        Ok(())
    }

    fn is_usable(&self, field: SolveTarget, value: f32) -> bool {
        match field {
            SolveTarget::Ec => value.is_finite(),
            _ => value.is_finite() && value > 0.0,
        }
    }
}
