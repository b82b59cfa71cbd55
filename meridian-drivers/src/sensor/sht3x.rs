//! SHT3x temperature and humidity sensor
//!
//! A single-shot measurement needs about 15 ms of conversion time. The
//! driver splits it in two: [`Sht3x::start`] sends the command, and
//! [`Sht3x::poll`] collects the result on a later tick once the
//! conversion time has passed. Nothing ever sleeps on the polling thread.

use meridian_core::traits::SensorError;
use meridian_hal::I2cBus;

/// Fixed 7-bit bus address (ADDR pin low)
pub const ADDRESS: u8 = 0x44;

/// Single shot, high repeatability, no clock stretching
const MEASURE_COMMAND: [u8; 2] = [0x24, 0x00];

/// Minimum time between command and read
pub const CONVERSION_MS: u64 = 30;

const DEW_A: f64 = 17.271;
const DEW_B: f64 = 237.7;

/// One temperature/humidity sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    /// °C
    pub temperature: f64,
    /// %RH
    pub humidity: f64,
    /// °C
    pub dew_point: f64,
}

impl ClimateReading {
    fn from_raw(raw_temperature: u16, raw_humidity: u16) -> Self {
        let temperature = -45.0 + 175.0 * raw_temperature as f64 / 65_535.0;
        let humidity = 100.0 * raw_humidity as f64 / 65_535.0;
        Self {
            temperature,
            humidity,
            dew_point: dew_point(temperature, humidity),
        }
    }
}

/// Magnus-formula dew point
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    if humidity <= 0.0 {
        return f64::NAN;
    }
    let gamma = DEW_A * temperature / (DEW_B + temperature) + libm::log(humidity / 100.0);
    DEW_B * gamma / (DEW_A - gamma)
}

/// SHT3x driver
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sht3x {
    measurement_started: Option<u64>,
}

impl Sht3x {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a measurement is waiting to be collected
    pub fn is_measuring(&self) -> bool {
        self.measurement_started.is_some()
    }

    /// Send the measurement command
    pub fn start<I: I2cBus>(&mut self, bus: &mut I, now_ms: u64) -> Result<(), SensorError> {
        self.measurement_started = None;
        bus.write(ADDRESS, &MEASURE_COMMAND)
            .map_err(|_| SensorError::NotFound)?;
        self.measurement_started = Some(now_ms);
        Ok(())
    }

    /// Collect the measurement if its conversion time has passed
    ///
    /// `Ok(None)` while still converting or when nothing was started.
    pub fn poll<I: I2cBus>(
        &mut self,
        bus: &mut I,
        now_ms: u64,
    ) -> Result<Option<ClimateReading>, SensorError> {
        let Some(started) = self.measurement_started else {
            return Ok(None);
        };
        if now_ms.saturating_sub(started) < CONVERSION_MS {
            return Ok(None);
        }
        self.measurement_started = None;

        // temperature msb, lsb, crc, humidity msb, lsb, crc
        let mut frame = [0u8; 6];
        bus.read(ADDRESS, &mut frame).map_err(|_| SensorError::Bus)?;
        let raw_temperature = u16::from_be_bytes([frame[0], frame[1]]);
        let raw_humidity = u16::from_be_bytes([frame[3], frame[4]]);
        Ok(Some(ClimateReading::from_raw(raw_temperature, raw_humidity)))
    }
}
