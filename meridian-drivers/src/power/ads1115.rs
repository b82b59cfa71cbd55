//! ADS1115 power monitor
//!
//! Three single-ended channels (input voltage, regulated rail, hall
//! current sensor) are converted one at a time. A conversion at 8 SPS
//! outlasts a poll tick, so each channel takes two ticks: one to trigger,
//! one to read. The six phases repeat forever.

use meridian_core::config::CurrentSensor;
use meridian_core::traits::{PowerReadings, SensorError};
use meridian_hal::I2cBus;

/// ADDR pin to ground
pub const ADDRESS: u8 = 0x48;

/// Trigger and read phases for the three channels
pub const PHASE_COUNT: u8 = 6;

const REGISTER_CONVERSION: u8 = 0x00;
const REGISTER_CONFIG: u8 = 0x01;
/// 8 SPS, comparator disabled
const CONFIG_LSB: u8 = 0b0010_0011;

/// Full-scale input of the ±4.096 V range
const FULL_SCALE_V: f64 = 4.096;
/// Input divider on both voltage channels
const VOLTAGE_DIVIDER: f64 = 6.6;

/// Converted channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerChannel {
    /// Supply input (AIN0)
    InputVoltage,
    /// Regulated rail (AIN1)
    RegulatedVoltage,
    /// Hall current sensor output (AIN3)
    TotalCurrent,
}

impl PowerChannel {
    fn for_phase(phase: u8) -> Self {
        match phase / 2 {
            0 => PowerChannel::InputVoltage,
            1 => PowerChannel::RegulatedVoltage,
            _ => PowerChannel::TotalCurrent,
        }
    }

    /// Config MSB: start single shot, input mux, ±4.096 V, single-shot mode
    fn config_msb(self) -> u8 {
        match self {
            PowerChannel::InputVoltage => 0b1100_0011,
            PowerChannel::RegulatedVoltage => 0b1101_0011,
            PowerChannel::TotalCurrent => 0b1011_0011,
        }
    }
}

/// Outcome of one phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerPoll {
    /// Conversion started on the channel
    Triggered(PowerChannel),
    /// Channel read back; the whole group with the new value
    Measured(PowerChannel, PowerReadings),
}

/// Round-robin power monitor
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerMonitor {
    phase: u8,
    sensor: CurrentSensor,
    /// Time between two current samples (s)
    sample_period_s: f64,
    readings: PowerReadings,
    amp_seconds: f64,
    watt_seconds: f64,
}

impl PowerMonitor {
    /// Create a monitor polled every `tick_ms`
    pub fn new(sensor: CurrentSensor, tick_ms: u32) -> Self {
        Self {
            phase: 0,
            sensor,
            sample_period_s: PHASE_COUNT as f64 * tick_ms as f64 / 1_000.0,
            readings: PowerReadings::default(),
            amp_seconds: 0.0,
            watt_seconds: 0.0,
        }
    }

    /// Phase the next poll will run
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Latest values of the whole group
    pub fn readings(&self) -> PowerReadings {
        self.readings
    }

    /// Run the current phase and advance to the next one
    ///
    /// The phase advances even when the bus fails, so a missing device
    /// never stalls the other channels.
    pub fn poll<I: I2cBus>(&mut self, bus: &mut I) -> Result<PowerPoll, SensorError> {
        let phase = self.phase;
        self.phase = (self.phase + 1) % PHASE_COUNT;

        let channel = PowerChannel::for_phase(phase);
        if phase % 2 == 0 {
            bus.write(
                ADDRESS,
                &[REGISTER_CONFIG, channel.config_msb(), CONFIG_LSB],
            )
            .map_err(|_| SensorError::NotFound)?;
            return Ok(PowerPoll::Triggered(channel));
        }

        let raw = Self::read_conversion(bus).map_err(|_| SensorError::Bus)?;
        self.record(channel, raw);
        Ok(PowerPoll::Measured(channel, self.readings))
    }

    fn read_conversion<I: I2cBus>(bus: &mut I) -> Result<i16, I::Error> {
        let mut buf = [0u8; 2];
        bus.write(ADDRESS, &[REGISTER_CONVERSION])?;
        bus.read(ADDRESS, &mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    fn record(&mut self, channel: PowerChannel, raw: i16) {
        let volts = raw as f64 / 32_768.0 * FULL_SCALE_V;
        match channel {
            PowerChannel::InputVoltage => {
                self.readings.input_v = volts * VOLTAGE_DIVIDER;
            }
            PowerChannel::RegulatedVoltage => {
                self.readings.regulated_v = volts * VOLTAGE_DIVIDER;
            }
            PowerChannel::TotalCurrent => {
                let current = volts * self.sensor.amps_per_volt();
                self.readings.current_a = current;
                self.readings.power_w = self.readings.input_v * current;

                // Energy only ever accumulates
                let drawn = current.max(0.0);
                self.amp_seconds += drawn * self.sample_period_s;
                self.watt_seconds += self.readings.input_v.max(0.0) * drawn * self.sample_period_s;
                self.readings.charge_ah = self.amp_seconds / 3_600.0;
                self.readings.energy_wh = self.watt_seconds / 3_600.0;
            }
        }
    }
}
