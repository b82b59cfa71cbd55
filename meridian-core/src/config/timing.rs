//! Polling intervals

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Periods of the independent polling tasks (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PollTiming {
    /// Scheduler tick; light sensor and power monitor run every tick
    pub tick_ms: u32,
    /// Temperature, humidity, IR and legacy sky quality sensors
    pub environment_ms: u32,
    /// Temperature compensation
    pub compensation_ms: u32,
    /// CPU temperature sampling
    pub system_ms: u32,
    /// Fan duty evaluation
    pub fan_ms: u32,
    /// Delay before the first fan evaluation after connect
    pub fan_initial_delay_ms: u32,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            environment_ms: 5_000,
            compensation_ms: 30_000,
            system_ms: 1_000,
            fan_ms: 20_000,
            fan_initial_delay_ms: 3_000,
        }
    }
}
