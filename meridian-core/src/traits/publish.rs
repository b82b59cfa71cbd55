//! Publish sink trait
//!
//! The client-facing property layer implements [`PublishSink`]. The core
//! calls it for every value it computes and never learns how the value is
//! transported.

use crate::motion::FocusInfo;

/// Status attached to a published value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Idle,
    Ok,
    Busy,
    Alert,
}

/// One power monitor reading group
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerReadings {
    /// Input voltage (V)
    pub input_v: f64,
    /// Regulated rail voltage (V)
    pub regulated_v: f64,
    /// Total current (A)
    pub current_a: f64,
    /// Total power (W)
    pub power_w: f64,
    /// Charge drawn since connect (Ah)
    pub charge_ah: f64,
    /// Energy drawn since connect (Wh)
    pub energy_wh: f64,
}

/// A value surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Focuser position (steps at the current resolution)
    FocuserPosition(i32),
    /// Temperature used for compensation (°C)
    FocuserTemperature(f64),
    /// Critical focus zone figures
    FocusInfo(FocusInfo),
    /// Ambient temperature (°C)
    Temperature(f64),
    /// Relative humidity (%)
    Humidity(f64),
    /// Dew point (°C)
    DewPoint(f64),
    /// IR sky temperature (°C)
    SkyTemperature(f64),
    /// Sky minus ambient temperature (°C)
    SkyDifference(f64),
    /// Sky brightness (mag/arcsec²)
    SkyBrightness(f64),
    Power(PowerReadings),
    /// CPU fan duty (%)
    FanDuty(u8),
    /// CPU temperature (°C)
    CpuTemperature(f64),
    Relay { index: u8, on: bool },
    PwmOutput { index: u8, duty: u8 },
}

impl Reading {
    /// Property name the value is published under
    pub fn name(&self) -> &'static str {
        match self {
            Reading::FocuserPosition(_) => "focuser.position",
            Reading::FocuserTemperature(_) => "focuser.temperature",
            Reading::FocusInfo(_) => "focuser.info",
            Reading::Temperature(_) => "weather.temperature",
            Reading::Humidity(_) => "weather.humidity",
            Reading::DewPoint(_) => "weather.dew_point",
            Reading::SkyTemperature(_) => "weather.sky_temperature",
            Reading::SkyDifference(_) => "weather.sky_difference",
            Reading::SkyBrightness(_) => "weather.sky_brightness",
            Reading::Power(_) => "power",
            Reading::FanDuty(_) => "system.fan",
            Reading::CpuTemperature(_) => "system.cpu_temperature",
            Reading::Relay { index: 0, .. } => "output.relay1",
            Reading::Relay { .. } => "output.relay2",
            Reading::PwmOutput { index: 0, .. } => "output.pwm1",
            Reading::PwmOutput { .. } => "output.pwm2",
        }
    }
}

/// Receiver of published values
///
/// Called from both the polling thread and the step worker.
pub trait PublishSink {
    fn publish(&self, reading: Reading, status: Status);
}
