//! PWM line abstractions

use core::fmt::Debug;

/// Pulse-width modulated output line
pub trait PwmOutput {
    /// Error type for PWM operations
    type Error: Debug;

    /// Start (or update) the waveform
    ///
    /// # Arguments
    /// * `frequency_hz` - Carrier frequency
    /// * `duty_percent` - High time, 0-100 (values above 100 are clamped)
    fn set_pwm(&mut self, frequency_hz: u32, duty_percent: u8) -> Result<(), Self::Error>;

    /// Hold the line low
    fn stop(&mut self, frequency_hz: u32) -> Result<(), Self::Error> {
        self.set_pwm(frequency_hz, 0)
    }
}
