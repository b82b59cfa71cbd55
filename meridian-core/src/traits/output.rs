//! Output line error type

/// Errors from driving output lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// GPIO line write failed
    Line,
    /// PWM line could not be started
    Pwm,
    /// SPI write to the current DAC failed
    Dac,
    /// No output with that index
    InvalidIndex,
}
