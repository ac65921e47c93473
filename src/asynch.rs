//! Async API
//!
//! This module contains the async API for the BH1730FVC sensor, built on
//! [`embedded-hal-async`](https://crates.io/crates/embedded-hal-async).
//! Readings are handed to the meter with
//! [`LightMeter::on_reading`](crate::LightMeter::on_reading).

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::bh1730fvc::{
    itime_ms_to_itime, itime_to_itime_ms, lux_from_raw, raw_values, Register, ADC_VALID,
    DEFAULT_INTEGRATION_TIME_MS, RESET_CMD, STARTUP_DELAY_MS,
};
use crate::{Gain, LightMeterError, Mode, Result, BH1730FVC_ADDR};

/// Represents an I2C-connected BH1730FVC sensor on an async bus.
#[derive(Debug)]
pub struct Bh1730fvcAsync<I2C> {
    i2c: I2C,
    gain: Gain,
    integration_time_ms: f32,
}

impl<I2C: I2c> Bh1730fvcAsync<I2C> {
    /// Resets the sensor and waits for it to start up.
    pub async fn new<D: DelayNs>(mut i2c: I2C, delay: &mut D) -> Result<Self> {
        i2c.write(BH1730FVC_ADDR, &[RESET_CMD])
            .await
            .map_err(|_| LightMeterError::WriteI2CError)?;

        delay.delay_ms(STARTUP_DELAY_MS).await;

        Ok(Self {
            i2c,
            gain: Gain::X1,
            integration_time_ms: DEFAULT_INTEGRATION_TIME_MS,
        })
    }

    /// Like [`Bh1730fvcAsync::new`], but reports a sensor that does not
    /// respond as [`LightMeterError::SensorUnavailable`].
    pub async fn probe<D: DelayNs>(i2c: I2C, delay: &mut D) -> Result<Self> {
        Self::new(i2c, delay).await.map_err(|_| {
            log::warn!("No BH1730FVC found at address 0x{:02X}", BH1730FVC_ADDR);
            LightMeterError::SensorUnavailable
        })
    }

    /// Gives back the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Perform a single-shot measurement of the ambient light intensity in lux.
    pub async fn get_ambient_light_intensity_single_shot<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<f32> {
        self.set_mode(Mode::SingleShot).await?;
        delay
            .delay_ms(libm::ceilf(self.integration_time_ms) as u32)
            .await;

        self.read_ambient_light_intensity().await
    }

    pub async fn start_continuous_measurement(&mut self) -> Result<()> {
        self.set_mode(Mode::Continuous).await
    }

    pub async fn stop_continuous_measurement(&mut self) -> Result<()> {
        self.set_mode(Mode::PowerDown).await
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.write_register(Register::Control, mode.control_value())
            .await
    }

    pub async fn set_gain(&mut self, gain: Gain) -> Result<()> {
        self.write_register(Register::Gain, gain as u8).await?;
        self.gain = gain;
        Ok(())
    }

    pub async fn read_gain(&mut self) -> Result<Gain> {
        let gain = self.read_register(Register::Gain).await?;
        Ok(Gain::from_reg_value(gain))
    }

    pub async fn set_integration_time(&mut self, time_ms: f32) -> Result<()> {
        self.write_register(Register::Timing, itime_ms_to_itime(time_ms))
            .await?;
        self.integration_time_ms = time_ms;
        Ok(())
    }

    pub async fn read_integration_time(&mut self) -> Result<f32> {
        let itime = self.read_register(Register::Timing).await?;
        Ok(itime_to_itime_ms(itime))
    }

    /// Reads the last measured ambient light intensity in lux.
    pub async fn read_ambient_light_intensity(&mut self) -> Result<f32> {
        if self.read_register(Register::Control).await? & ADC_VALID == 0 {
            return Err(LightMeterError::NoDataAvailable);
        }

        let (data0, data1) = self.read_light_raw_values().await?;

        Ok(lux_from_raw(data0, data1, self.gain, self.integration_time_ms))
    }

    /// Read all 4 data registers in one write-then-read operation.
    pub async fn read_light_raw_values(&mut self) -> Result<(u16, u16)> {
        let mut data = [0; 4];

        self.i2c
            .write_read(BH1730FVC_ADDR, &[Register::Data0Low.command()], &mut data)
            .await
            .map_err(|_| LightMeterError::ReadI2CError)?;

        log::debug!("Read raw values: {:?}", data);

        Ok(raw_values(data))
    }

    /// Reads the part number and the revision id of the sensor.
    pub async fn read_id(&mut self) -> Result<(u8, u8)> {
        let id = self.read_register(Register::Id).await?;

        Ok((id >> 4, id & 0x0F))
    }

    async fn write_register(&mut self, register: Register, data: u8) -> Result<()> {
        self.i2c
            .write(BH1730FVC_ADDR, &[register.command(), data])
            .await
            .map_err(|_| LightMeterError::WriteI2CError)
    }

    async fn read_register(&mut self, register: Register) -> Result<u8> {
        let mut data = [0; 1];

        self.i2c
            .write_read(BH1730FVC_ADDR, &[register.command()], &mut data)
            .await
            .map_err(|_| LightMeterError::ReadI2CError)?;

        Ok(data[0])
    }
}

// embedded-hal-mock 0.8 has no async I2C mock, the tests run the driver
// against a register file and poll it to completion by hand
#[cfg(test)]
mod tests {
    use super::*;
    use core::future::Future;
    use core::pin::pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Debug)]
    struct BusError;

    impl embedded_hal_async::i2c::Error for BusError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Answers like a BH1730FVC: a command byte selects a register, further
    /// written bytes are stored, reads continue from the selected register.
    #[derive(Default)]
    struct RegisterBus {
        registers: [u8; 0x20],
        resets: usize,
        missing: bool,
    }

    impl ErrorType for RegisterBus {
        type Error = BusError;
    }

    impl I2c for RegisterBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> core::result::Result<(), BusError> {
            if self.missing || address != BH1730FVC_ADDR {
                return Err(BusError);
            }

            let mut pointer = 0;
            for operation in operations {
                match operation {
                    Operation::Write([RESET_CMD]) => self.resets += 1,
                    Operation::Write([command, data @ ..]) => {
                        pointer = (*command & 0x7F) as usize;
                        for (offset, byte) in data.iter().enumerate() {
                            self.registers[pointer + offset] = *byte;
                        }
                    }
                    Operation::Write([]) => {}
                    Operation::Read(buffer) => {
                        let len = buffer.len();
                        buffer.copy_from_slice(&self.registers[pointer..pointer + len]);
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        fn raw_waker() -> RawWaker {
            RawWaker::new(core::ptr::null(), &VTABLE)
        }
        unsafe fn clone(_: *const ()) -> RawWaker {
            raw_waker()
        }
        unsafe fn noop(_: *const ()) {}
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);

        // SAFETY: the vtable functions ignore the data pointer
        let waker = unsafe { Waker::from_raw(raw_waker()) };
        let mut context = Context::from_waker(&waker);
        let mut future = pin!(future);
        loop {
            if let Poll::Ready(output) = future.as_mut().poll(&mut context) {
                return output;
            }
        }
    }

    fn sensor(bus: RegisterBus) -> Bh1730fvcAsync<RegisterBus> {
        block_on(Bh1730fvcAsync::new(bus, &mut NoDelay)).unwrap()
    }

    #[test]
    fn test_new_resets_sensor() {
        let sensor = sensor(RegisterBus::default());
        assert_eq!(sensor.release().resets, 1);
    }

    #[test]
    fn test_missing_sensor_is_unavailable() {
        let bus = RegisterBus {
            missing: true,
            ..RegisterBus::default()
        };
        let result = block_on(Bh1730fvcAsync::probe(bus, &mut NoDelay));
        assert!(matches!(result, Err(LightMeterError::SensorUnavailable)));

        let result = block_on(Bh1730fvcAsync::probe(RegisterBus::default(), &mut NoDelay));
        assert!(result.is_ok());
    }

    #[test]
    fn test_gain() {
        let mut sensor = sensor(RegisterBus::default());
        block_on(sensor.set_gain(Gain::X64)).unwrap();
        assert_eq!(block_on(sensor.read_gain()), Ok(Gain::X64));
        assert_eq!(sensor.release().registers[Register::Gain as usize], 0x02);
    }

    #[test]
    fn test_integration_time() {
        let mut sensor = sensor(RegisterBus::default());
        block_on(sensor.set_integration_time(150.0)).unwrap();
        assert_eq!(sensor.integration_time_ms, 150.0);
        assert_eq!(sensor.i2c.registers[Register::Timing as usize], 0xC8);

        let itime_ms = block_on(sensor.read_integration_time()).unwrap();
        assert!((itime_ms - 151.1552).abs() < 1e-3);
    }

    #[test]
    fn test_read_id() {
        let mut bus = RegisterBus::default();
        bus.registers[Register::Id as usize] = 0x71;

        let mut sensor = sensor(bus);
        assert_eq!(block_on(sensor.read_id()), Ok((0x7, 0x1)));
    }

    #[test]
    fn test_continuous_measurement() {
        let mut sensor = sensor(RegisterBus::default());
        block_on(sensor.start_continuous_measurement()).unwrap();
        assert_eq!(
            block_on(sensor.read_ambient_light_intensity()),
            Err(LightMeterError::NoDataAvailable)
        );

        let registers = &mut sensor.i2c.registers;
        assert_eq!(registers[Register::Control as usize], 0x03);
        registers[Register::Control as usize] |= ADC_VALID;
        registers[Register::Data0Low as usize..][..4].copy_from_slice(&[0xE8, 0x03, 0x64, 0x00]);

        assert_eq!(block_on(sensor.read_light_raw_values()), Ok((1000, 100)));

        let lux = block_on(sensor.read_ambient_light_intensity()).unwrap();
        assert_eq!(lux, lux_from_raw(1000, 100, Gain::X1, DEFAULT_INTEGRATION_TIME_MS));
    }
}
