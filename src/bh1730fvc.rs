//! Blocking driver for the BH1730FVC ambient light sensor.
//!
//! The datasheet of the sensor can be found [here](https://fscdn.rohm.com/en/products/databook/datasheet/ic/sensor/light/bh1730fvc-e.pdf).
//!
//! The driver owns the I2C bus and serves as a [`LightSource`] once continuous
//! measurement has been started.
//!
//! ```rust,no_run
//! # fn run<I2C, D>(i2c: I2C, delay: &mut D) -> lightmeter::Result<()>
//! # where
//! #     I2C: embedded_hal::blocking::i2c::Write + embedded_hal::blocking::i2c::WriteRead,
//! #     D: embedded_hal::blocking::delay::DelayMs<u32>,
//! # {
//! use lightmeter::{Bh1730fvc, LightSource};
//!
//! let mut sensor = Bh1730fvc::new(i2c, delay)?;
//! sensor.start_continuous_measurement()?;
//!
//! let lux = sensor.read_lux()?;
//! # Ok(())
//! # }
//! ```

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::{LightMeterError, LightSource, Result};

/// I2C address for the BH1730FVC sensor.
pub const BH1730FVC_ADDR: u8 = 0x29;

/// Special command resetting the sensor.
pub(crate) const RESET_CMD: u8 = 0xE4;

/// Set on the command byte to address a register.
pub(crate) const COMMAND_BIT: u8 = 0x80;

/// ADC_VALID bit of the control register.
pub(crate) const ADC_VALID: u8 = 0x10;

/// The sensor needs more than 2 ms to start up after a reset.
pub(crate) const STARTUP_DELAY_MS: u32 = 10;

/// Integration time after reset.
pub(crate) const DEFAULT_INTEGRATION_TIME_MS: f32 = 102.6;

/// Internal clock interval
const TINT_US: f32 = 2.8; // 2.8 us (typical value)

/// Registers of the BH1730FVC sensor used by the driver.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Register {
    /// Mode control register
    Control = 0x00,
    /// Timing control register
    Timing = 0x01,
    /// Gain control register
    Gain = 0x07,
    /// Part number and revision id
    Id = 0x12,
    /// First of the four data registers (DATA0 low byte)
    Data0Low = 0x14,
}

impl Register {
    pub(crate) fn command(self) -> u8 {
        self as u8 | COMMAND_BIT
    }
}

/// The gain of the BH1730FVC sensor.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Gain {
    X1 = 0x0,
    X2 = 0x1,
    X64 = 0x2,
    X128 = 0x3,
}

impl From<Gain> for f32 {
    fn from(gain: Gain) -> Self {
        match gain {
            Gain::X1 => 1.0,
            Gain::X2 => 2.0,
            Gain::X64 => 64.0,
            Gain::X128 => 128.0,
        }
    }
}

impl Gain {
    /// Decodes the GAIN bits of the gain register.
    pub(crate) fn from_reg_value(value: u8) -> Self {
        match value & 0x03 {
            0x0 => Gain::X1,
            0x1 => Gain::X2,
            0x2 => Gain::X64,
            _ => Gain::X128,
        }
    }
}

/// The mode of the BH1730FVC sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    PowerDown,
    SingleShot,
    Continuous,
}

impl Mode {
    /// ONE_TIME, ADC_EN and POWER bits of the control register.
    pub(crate) fn control_value(self) -> u8 {
        match self {
            Mode::PowerDown => 0x00,
            Mode::SingleShot => 0x0b,
            Mode::Continuous => 0x03,
        }
    }
}

/// Represents an I2C-connected BH1730FVC sensor.
#[derive(Debug)]
pub struct Bh1730fvc<I2C> {
    /// I2C Interface for communicating with the sensor.
    i2c: I2C,

    /// The gain of the sensor.
    gain: Gain,

    /// The integration time of the sensor.
    integration_time_ms: f32,
}

impl<I2C> Bh1730fvc<I2C>
where
    I2C: Write + WriteRead,
{
    /// Resets the sensor and waits for it to start up.
    ///
    /// The sensor keeps its reset configuration for gain and integration time.
    pub fn new<D: DelayMs<u32>>(mut i2c: I2C, delay: &mut D) -> Result<Self> {
        i2c.write(BH1730FVC_ADDR, &[RESET_CMD])
            .map_err(|_| LightMeterError::WriteI2CError)?;

        delay.delay_ms(STARTUP_DELAY_MS);

        Ok(Self {
            i2c,
            gain: Gain::X1,
            integration_time_ms: DEFAULT_INTEGRATION_TIME_MS,
        })
    }

    /// Like [`Bh1730fvc::new`], but reports a sensor that does not respond as
    /// [`LightMeterError::SensorUnavailable`].
    pub fn probe<D: DelayMs<u32>>(i2c: I2C, delay: &mut D) -> Result<Self> {
        Self::new(i2c, delay).map_err(|_| {
            log::warn!("No BH1730FVC found at address 0x{:02X}", BH1730FVC_ADDR);
            LightMeterError::SensorUnavailable
        })
    }

    /// Gives back the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Perform a single-shot measurement of the ambient light intensity in lux.
    ///
    /// Blocks for the duration of the integration time.
    pub fn get_ambient_light_intensity_single_shot<D: DelayMs<u32>>(
        &mut self,
        delay: &mut D,
    ) -> Result<f32> {
        self.set_mode(Mode::SingleShot)?;
        delay.delay_ms(libm::ceilf(self.integration_time_ms) as u32);

        self.read_ambient_light_intensity()
    }

    /// Start continuous measurement mode.
    pub fn start_continuous_measurement(&mut self) -> Result<()> {
        self.set_mode(Mode::Continuous)
    }

    /// Stop continuous measurement mode, the sensor powers down.
    pub fn stop_continuous_measurement(&mut self) -> Result<()> {
        self.set_mode(Mode::PowerDown)
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.write_register(Register::Control, mode.control_value())
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<()> {
        self.write_register(Register::Gain, gain as u8)?;
        self.gain = gain;
        Ok(())
    }

    pub fn read_gain(&mut self) -> Result<Gain> {
        let gain = self.read_register(Register::Gain)?;
        Ok(Gain::from_reg_value(gain))
    }

    pub fn set_integration_time(&mut self, time_ms: f32) -> Result<()> {
        self.write_register(Register::Timing, itime_ms_to_itime(time_ms))?;
        self.integration_time_ms = time_ms;
        Ok(())
    }

    pub fn read_integration_time(&mut self) -> Result<f32> {
        let itime = self.read_register(Register::Timing)?;
        Ok(itime_to_itime_ms(itime))
    }

    /// Reads the last measured ambient light intensity in lux.
    ///
    /// Fails with [`LightMeterError::NoDataAvailable`] until the first
    /// measurement has completed.
    pub fn read_ambient_light_intensity(&mut self) -> Result<f32> {
        if self.read_register(Register::Control)? & ADC_VALID == 0 {
            return Err(LightMeterError::NoDataAvailable);
        }

        let (data0, data1) = self.read_light_raw_values()?;

        Ok(lux_from_raw(data0, data1, self.gain, self.integration_time_ms))
    }

    /// Read all 4 data registers in one write-then-read operation.
    pub fn read_light_raw_values(&mut self) -> Result<(u16, u16)> {
        let mut data = [0; 4];

        self.i2c
            .write_read(BH1730FVC_ADDR, &[Register::Data0Low.command()], &mut data)
            .map_err(|_| LightMeterError::ReadI2CError)?;

        log::debug!("Read raw values: {:?}", data);

        Ok(raw_values(data))
    }

    /// Reads the part number and the revision id of the sensor.
    pub fn read_id(&mut self) -> Result<(u8, u8)> {
        let id = self.read_register(Register::Id)?;

        Ok((id >> 4, id & 0x0F))
    }

    fn write_register(&mut self, register: Register, data: u8) -> Result<()> {
        self.i2c
            .write(BH1730FVC_ADDR, &[register.command(), data])
            .map_err(|_| LightMeterError::WriteI2CError)
    }

    fn read_register(&mut self, register: Register) -> Result<u8> {
        let mut data = [0; 1];

        self.i2c
            .write_read(BH1730FVC_ADDR, &[register.command()], &mut data)
            .map_err(|_| LightMeterError::ReadI2CError)?;

        Ok(data[0])
    }
}

impl<I2C> LightSource for Bh1730fvc<I2C>
where
    I2C: Write + WriteRead,
{
    fn read_lux(&mut self) -> Result<f32> {
        self.read_ambient_light_intensity()
    }
}

/// DATA0 and DATA1 from the four data registers (little endian).
pub(crate) fn raw_values(data: [u8; 4]) -> (u16, u16) {
    (
        u16::from_le_bytes([data[0], data[1]]),
        u16::from_le_bytes([data[2], data[3]]),
    )
}

/// Converts the raw visible (DATA0) and infrared (DATA1) counts into lux.
pub(crate) fn lux_from_raw(data0: u16, data1: u16, gain: Gain, integration_time_ms: f32) -> f32 {
    if data0 == 0 {
        return 0.0;
    }

    let data0 = data0 as f32;
    let data1 = data1 as f32;
    let ratio = data1 / data0;

    let counts = if ratio < 0.26 {
        1.290 * data0 - 2.733 * data1
    } else if ratio < 0.55 {
        0.795 * data0 - 0.859 * data1
    } else if ratio < 1.09 {
        0.510 * data0 - 0.345 * data1
    } else if ratio < 2.13 {
        0.276 * data0 - 0.130 * data1
    } else {
        0.0
    };

    (counts / (f32::from(gain) * DEFAULT_INTEGRATION_TIME_MS / integration_time_ms)).max(0.0)
}

/// Integration time in milliseconds to timing register value.
pub(crate) fn itime_ms_to_itime(itime_ms: f32) -> u8 {
    let itime = 256.0 - (itime_ms * 1000.0 / (TINT_US * 964.0));
    itime as u8
}

/// Timing register value to integration time in milliseconds.
pub(crate) fn itime_to_itime_ms(itime: u8) -> f32 {
    (TINT_US * 964.0 * (256.0 - itime as f32)) / 1000.0
}
