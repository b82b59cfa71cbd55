//! Focuser configuration

use crate::motion::Resolution;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Driver current kept while the motor is idle, as a share of the
/// configured drive current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum HoldPower {
    /// Driver disabled while idle
    #[default]
    Off,
    Percent20,
    Percent40,
    Percent60,
    Percent80,
    Full,
}

impl HoldPower {
    /// Hold level in fifths (0-5)
    pub fn fifths(self) -> u32 {
        match self {
            HoldPower::Off => 0,
            HoldPower::Percent20 => 1,
            HoldPower::Percent40 => 2,
            HoldPower::Percent60 => 3,
            HoldPower::Percent80 => 4,
            HoldPower::Full => 5,
        }
    }

    /// Hold level as a percentage
    pub fn percent(self) -> u8 {
        (self.fifths() * 20) as u8
    }

    /// Hold current for a given drive current
    pub fn apply(self, drive_ma: u32) -> u32 {
        drive_ma.saturating_mul(self.fifths()) / 5
    }

    /// Parse a percentage; only multiples of 20 are valid
    pub fn from_percent(percent: u8) -> Option<Self> {
        match percent {
            0 => Some(HoldPower::Off),
            20 => Some(HoldPower::Percent20),
            40 => Some(HoldPower::Percent40),
            60 => Some(HoldPower::Percent60),
            80 => Some(HoldPower::Percent80),
            100 => Some(HoldPower::Full),
            _ => None,
        }
    }
}

impl TryFrom<u8> for HoldPower {
    type Error = &'static str;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        HoldPower::from_percent(percent).ok_or("hold power must be 0, 20, 40, 60, 80 or 100")
    }
}

impl From<HoldPower> for u8 {
    fn from(hold: HoldPower) -> u8 {
        hold.percent()
    }
}

/// Focuser drive configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FocuserConfig {
    /// Maximum travel in full steps
    pub max_position: i32,
    /// Microstep resolution at connect
    pub resolution: Resolution,
    /// Backlash in steps at the configured resolution
    pub backlash: u32,
    /// Delay between step pulses (µs)
    pub step_delay_us: u32,
    /// Invert the direction line
    pub reverse: bool,
    /// Idle hold current
    pub hold_power: HoldPower,
    /// Drive current (mA)
    pub current_ma: u32,
}

impl FocuserConfig {
    /// Valid inter-step delay range (µs)
    pub const STEP_DELAY_RANGE_US: (u32, u32) = (200, 20_000);
    /// Valid drive current range (mA)
    pub const CURRENT_RANGE_MA: (u32, u32) = (200, 2_000);

    /// Clamp the fields that have hardware limits
    pub fn clamped(mut self) -> Self {
        let (lo, hi) = Self::STEP_DELAY_RANGE_US;
        self.step_delay_us = self.step_delay_us.clamp(lo, hi);
        let (lo, hi) = Self::CURRENT_RANGE_MA;
        self.current_ma = self.current_ma.clamp(lo, hi);
        self
    }
}

impl Default for FocuserConfig {
    fn default() -> Self {
        Self {
            max_position: 10_000,
            resolution: Resolution::Full,
            backlash: 0,
            step_delay_us: 2_000,
            reverse: false,
            hold_power: HoldPower::Off,
            current_ma: 400,
        }
    }
}

/// Telescope optics used for the critical focus zone
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OpticsConfig {
    /// Focuser travel over the full range (mm)
    pub travel_mm: f64,
    /// Aperture (mm), 0 if unknown
    pub aperture_mm: f64,
    /// Focal length (mm), 0 if unknown
    pub focal_length_mm: f64,
}

impl Default for OpticsConfig {
    /// Stock 10 mm focuser with unknown optics
    fn default() -> Self {
        Self {
            travel_mm: 10.0,
            aperture_mm: 0.0,
            focal_length_mm: 0.0,
        }
    }
}

/// Temperature compensation settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompensationConfig {
    /// Compensation runs only when enabled
    pub enabled: bool,
    /// Steps per °C at the current resolution
    pub steps_per_degree: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_power_scales_current() {
        assert_eq!(HoldPower::Off.apply(400), 0);
        assert_eq!(HoldPower::Percent40.apply(400), 160);
        assert_eq!(HoldPower::Full.apply(400), 400);
    }

    #[test]
    fn test_hold_power_percent_roundtrip() {
        for percent in [0u8, 20, 40, 60, 80, 100] {
            let hold = HoldPower::from_percent(percent).unwrap();
            assert_eq!(hold.percent(), percent);
        }
        assert!(HoldPower::from_percent(50).is_none());
    }

    #[test]
    fn test_focuser_config_clamps_limits() {
        let config = FocuserConfig {
            step_delay_us: 50,
            current_ma: 5_000,
            ..Default::default()
        }
        .clamped();
        assert_eq!(config.step_delay_us, 200);
        assert_eq!(config.current_ma, 2_000);
    }
}
