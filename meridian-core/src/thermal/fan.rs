//! CPU fan bands
//!
//! Three fixed bands with no hysteresis. A temperature sitting on a band
//! edge will flip the duty on every evaluation.

/// Fan duty band selected from the CPU temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanBand {
    Low,
    Medium,
    High,
}

impl FanBand {
    /// PWM carrier frequency of the fan line
    pub const FREQUENCY_HZ: u32 = 100;

    /// Select the band for a CPU temperature in °C
    pub fn for_temperature(celsius: f64) -> Self {
        if celsius >= 70.0 {
            FanBand::High
        } else if celsius >= 65.0 {
            FanBand::Medium
        } else {
            FanBand::Low
        }
    }

    /// Duty cycle (%)
    pub fn duty_percent(self) -> u8 {
        match self {
            FanBand::Low => 33,
            FanBand::Medium => 66,
            FanBand::High => 100,
        }
    }
}
