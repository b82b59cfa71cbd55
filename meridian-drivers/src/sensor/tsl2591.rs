//! TSL2591 sky quality sensor
//!
//! A single integration takes 750 ms, far longer than one poll tick, so the
//! driver is a resumable state machine. Each poll does at most one short
//! bus exchange and returns. Channel counts are summed over many
//! integrations until there is enough light for a stable magnitude.

use meridian_core::traits::SensorError;
use meridian_hal::I2cBus;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = 0x29;

const COMMAND_BIT: u8 = 0xA0;
const REGISTER_ENABLE: u8 = 0x00;
const REGISTER_CONTROL: u8 = 0x01;
const REGISTER_CHAN0_LOW: u8 = 0x14;
const REGISTER_CHAN1_LOW: u8 = 0x16;
/// Command, normal operation, device ID register
const IDENTIFY: u8 = 0x80 | 0x20 | 0x12;

const ENABLE_POWEROFF: u8 = 0x00;
const ENABLE_POWERON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const ENABLE_AIEN: u8 = 0x10;
/// Maximum gain, 600 ms ADC time
const CONTROL_GAIN_TIMING: u8 = 0x05 | 0x30;

/// Wait this long after powering on before reading the channels
pub const INTEGRATION_MS: u64 = 750;

/// Counts per lux-equivalent at maximum gain and integration time
const COUNTS_SCALE: f64 = 29_628.0;
const MAGNITUDE_ZERO_POINT: f64 = 12.6;
const MAGNITUDE_SLOPE: f64 = 1.086;
/// Correction for the sensor's IR-cut filter
const FILTER_COEFFICIENT: f64 = -1.2;

const MIN_ITERATIONS: u32 = 5;
const MAX_ITERATIONS: u32 = 150;
const MIN_VISIBLE_COUNTS: i64 = 500;

/// Sensor protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightState {
    /// Not answering; probed on every poll
    Unavailable,
    /// Answered the identify write, not configured yet
    Detected,
    /// Configured and powered down between integrations
    Initialized {
        /// Power-on time of the integration in progress
        integration_started: Option<u64>,
    },
}

/// Running channel sums across integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightAccumulator {
    pub full: u64,
    pub ir: u64,
    pub iterations: u32,
}

impl LightAccumulator {
    /// Visible counts (full spectrum minus IR)
    pub fn visible(&self) -> i64 {
        self.full as i64 - self.ir as i64
    }

    fn ready(&self) -> bool {
        self.iterations >= MIN_ITERATIONS
            && (self.iterations >= MAX_ITERATIONS || self.visible() >= MIN_VISIBLE_COUNTS)
    }
}

/// Outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightPoll {
    /// Bus work done, no channel data this time
    Pending,
    /// Channel data read but rejected (IR above full spectrum, or no light)
    Discarded,
    /// Channel data added to the accumulator
    Accumulated,
    /// Sky brightness in magnitudes per square arcsecond
    Magnitude(f64),
}

/// TSL2591 driver state
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tsl2591 {
    state: LightState,
    accumulator: LightAccumulator,
    offset: f64,
}

impl Tsl2591 {
    /// Create a driver with a calibration offset in magnitudes
    pub fn new(offset: f64) -> Self {
        Self {
            state: LightState::Unavailable,
            accumulator: LightAccumulator::default(),
            offset,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn accumulator(&self) -> LightAccumulator {
        self.accumulator
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Advance the protocol by one step
    ///
    /// An error means the sensor is unavailable; the next poll probes it
    /// again from scratch.
    pub fn poll<I: I2cBus>(&mut self, bus: &mut I, now_ms: u64) -> Result<LightPoll, SensorError> {
        let result = match self.state {
            LightState::Unavailable => self.probe(bus),
            LightState::Detected => self.configure(bus),
            LightState::Initialized {
                integration_started: None,
            } => self.start_integration(bus, now_ms),
            LightState::Initialized {
                integration_started: Some(started),
            } => {
                if now_ms.saturating_sub(started) >= INTEGRATION_MS {
                    self.finish_integration(bus)
                } else {
                    Ok(LightPoll::Pending)
                }
            }
        };
        if result.is_err() {
            self.state = LightState::Unavailable;
        }
        result
    }

    fn probe<I: I2cBus>(&mut self, bus: &mut I) -> Result<LightPoll, SensorError> {
        bus.write(ADDRESS, &[IDENTIFY])
            .map_err(|_| SensorError::NotFound)?;
        self.state = LightState::Detected;
        Ok(LightPoll::Pending)
    }

    fn configure<I: I2cBus>(&mut self, bus: &mut I) -> Result<LightPoll, SensorError> {
        let sequence = [
            [
                COMMAND_BIT | REGISTER_ENABLE,
                ENABLE_POWERON | ENABLE_AEN | ENABLE_AIEN,
            ],
            [COMMAND_BIT | REGISTER_CONTROL, CONTROL_GAIN_TIMING],
            // Stay powered down until the first integration
            [COMMAND_BIT | REGISTER_ENABLE, ENABLE_POWEROFF],
        ];
        for frame in &sequence {
            bus.write(ADDRESS, frame).map_err(|_| SensorError::Bus)?;
        }
        self.state = LightState::Initialized {
            integration_started: None,
        };
        Ok(LightPoll::Pending)
    }

    fn start_integration<I: I2cBus>(
        &mut self,
        bus: &mut I,
        now_ms: u64,
    ) -> Result<LightPoll, SensorError> {
        bus.write(
            ADDRESS,
            &[
                COMMAND_BIT | REGISTER_ENABLE,
                ENABLE_POWERON | ENABLE_AEN | ENABLE_AIEN,
            ],
        )
        .map_err(|_| SensorError::Bus)?;
        self.state = LightState::Initialized {
            integration_started: Some(now_ms),
        };
        Ok(LightPoll::Pending)
    }

    fn finish_integration<I: I2cBus>(&mut self, bus: &mut I) -> Result<LightPoll, SensorError> {
        let ir = bus
            .read_word(ADDRESS, COMMAND_BIT | REGISTER_CHAN1_LOW)
            .map_err(|_| SensorError::Bus)?;
        let full = bus
            .read_word(ADDRESS, COMMAND_BIT | REGISTER_CHAN0_LOW)
            .map_err(|_| SensorError::Bus)?;
        bus.write(ADDRESS, &[COMMAND_BIT | REGISTER_ENABLE, ENABLE_POWEROFF])
            .map_err(|_| SensorError::Bus)?;
        self.state = LightState::Initialized {
            integration_started: None,
        };

        if ir > full {
            return Ok(LightPoll::Discarded);
        }
        if !self.accumulator.ready() {
            self.accumulator.full += full as u64;
            self.accumulator.ir += ir as u64;
            self.accumulator.iterations += 1;
            return Ok(LightPoll::Accumulated);
        }

        let accumulator = core::mem::take(&mut self.accumulator);
        let visible =
            accumulator.visible() as f64 / (COUNTS_SCALE * accumulator.iterations as f64);
        if visible <= 0.0 {
            return Ok(LightPoll::Discarded);
        }
        Ok(LightPoll::Magnitude(self.magnitude(visible)))
    }

    fn magnitude(&self, visible: f64) -> f64 {
        MAGNITUDE_ZERO_POINT - MAGNITUDE_SLOPE * libm::log(visible)
            + self.offset
            + FILTER_COEFFICIENT
    }
}
