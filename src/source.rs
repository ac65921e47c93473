//! Light reading sources

use crate::Result;

/// Anything that delivers ambient light readings in lux.
///
/// Returning [`LightMeterError::NoDataAvailable`](crate::LightMeterError::NoDataAvailable)
/// means no new reading is available yet and is not fatal.
/// [`LightMeterError::SensorUnavailable`](crate::LightMeterError::SensorUnavailable)
/// means no readings will ever arrive.
pub trait LightSource {
    /// Read the current illuminance in lux.
    fn read_lux(&mut self) -> Result<f32>;
}

impl<T: LightSource + ?Sized> LightSource for &mut T {
    fn read_lux(&mut self) -> Result<f32> {
        (**self).read_lux()
    }
}
