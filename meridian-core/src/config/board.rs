//! Board capability and peripheral configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Board hardware generation, selected once at connect
///
/// The generations differ in how the stepper current reference is set
/// and whether the power monitor is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareRevision {
    /// Current reference from an SPI DAC, no power monitor
    RevLegacyDac,
    /// Current reference from a filtered PWM line, power monitor fitted
    RevPwmCurrent,
}

impl HardwareRevision {
    /// Map a detected board revision number
    ///
    /// Boards older than revision 3 are not supported.
    pub fn from_board_revision(revision: u8) -> Option<Self> {
        match revision {
            0..=2 => None,
            3 => Some(HardwareRevision::RevLegacyDac),
            _ => Some(HardwareRevision::RevPwmCurrent),
        }
    }

    /// Whether the ADS1115 power monitor is populated
    pub fn has_power_monitor(self) -> bool {
        matches!(self, HardwareRevision::RevPwmCurrent)
    }
}

/// Hall current sensor fitted to the power input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurrentSensor {
    /// ACS712 20 A variant
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "acs712-20a"))]
    Acs20A,
    /// ACS712 5 A variant
    #[cfg_attr(feature = "serde", serde(rename = "acs712-5a"))]
    Acs5A,
}

impl CurrentSensor {
    /// Amps per volt at the ADC input
    pub fn amps_per_volt(self) -> f64 {
        match self {
            CurrentSensor::Acs20A => 20.0,
            CurrentSensor::Acs5A => 10.8,
        }
    }
}

/// Power monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PowerConfig {
    pub current_sensor: CurrentSensor,
}

/// Sky quality meter calibration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkyQualityConfig {
    /// Added to every computed magnitude, -1.0..=1.0
    pub offset: f64,
}

impl SkyQualityConfig {
    /// Calibration offset limited to its valid range
    pub fn clamped_offset(&self) -> f64 {
        self.offset.clamp(-1.0, 1.0)
    }
}

/// Auxiliary relay and PWM outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OutputsConfig {
    /// Shared carrier frequency for both PWM outputs (Hz)
    pub pwm_frequency_hz: u32,
    /// Relay states applied at connect
    pub relays: [bool; 2],
    /// PWM duty applied at connect (%)
    pub pwm_duty: [u8; 2],
}

impl OutputsConfig {
    /// Valid PWM frequency range (Hz)
    pub const FREQUENCY_RANGE_HZ: (u32, u32) = (10, 1_000);
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 20,
            relays: [false; 2],
            pwm_duty: [0; 2],
        }
    }
}
