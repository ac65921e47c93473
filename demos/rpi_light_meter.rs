// This example runs the light meter on a Raspberry Pi with a BH1730FVC sensor on /dev/i2c-1,
// solving the shutter speed for ISO 400 at f/5.6.
// On other targets it replays a few simulated readings instead.

use lightmeter::{LightMeter, MeterConfig, Outcome, SensorStatus, SolveTarget};

fn show(meter: &LightMeter, outcome: Outcome) {
    match outcome {
        Outcome::Solved { .. } | Outcome::Undefined { .. } => println!(
            "{:>10} | ISO {} | 1/{} s | f/{} | EC {}",
            meter.lux_readout().to_string(),
            meter.readout(SolveTarget::Iso),
            meter.readout(SolveTarget::Shutter),
            meter.readout(SolveTarget::Aperture),
            meter.readout(SolveTarget::Ec),
        ),
        other => log::info!("Nothing to show: {:?}", other),
    }
}

fn configure(meter: &mut LightMeter) -> lightmeter::Result<()> {
    meter.select(SolveTarget::Shutter)?;
    meter.edit_field(SolveTarget::Iso, "400")?;
    meter.edit_field(SolveTarget::Aperture, "5,6")?;
    Ok(())
}

#[cfg(target_arch = "arm")]
fn main() {
    use embedded_hal::blocking::delay::DelayMs;
    use lightmeter::{Bh1730fvc, LightMeterError};
    use linux_embedded_hal as hal;

    let i2c = hal::I2cdev::new("/dev/i2c-1").unwrap();
    let mut delay = hal::Delay;

    let sensor = Bh1730fvc::probe(i2c, &mut delay);
    let status = match sensor {
        Ok(_) => SensorStatus::Available,
        Err(_) => SensorStatus::Unavailable,
    };

    let mut meter = LightMeter::new(MeterConfig::default(), status);
    configure(&mut meter).unwrap();

    if meter.take_unavailable_notice() {
        println!("No light meter found, enter readings manually");
        return;
    }

    let Ok(mut sensor) = sensor else { return };
    match sensor.read_id() {
        Ok((part, revision)) => log::info!(
            "Device ID: (Part Number: 0x{:02X}, Revision ID: 0x{:02X})",
            part,
            revision
        ),
        Err(e) => log::error!("Error reading device id: {}", e),
    }

    if let Err(e) = sensor.start_continuous_measurement() {
        log::error!("Error starting continuous measurement: {}", e);
        return;
    }

    // Meter for 5 minutes, some readings get skipped given the delay
    for _ in 0..300 {
        match meter.poll(&mut sensor) {
            Ok(outcome) => show(&meter, outcome),
            Err(LightMeterError::NoDataAvailable) => {}
            Err(e) => log::error!("Error reading sensor: {}", e),
        }
        delay.delay_ms(1000u32);
    }

    if let Err(e) = sensor.stop_continuous_measurement() {
        log::error!("Error stopping continuous measurement: {}", e);
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {
    let mut meter = LightMeter::new(MeterConfig::default(), SensorStatus::Unavailable);
    configure(&mut meter).unwrap();

    if meter.take_unavailable_notice() {
        println!("No light meter found, using simulated readings");
    }

    for lux in [0.0, 5.0, 80.0, 400.0, 2_500.0, 32_000.0, 100_000.0] {
        let outcome = meter.on_reading(lux);
        show(&meter, outcome);
    }
}
