//! SoC temperature source

use core::fmt::Debug;

/// CPU / SoC thermometer
pub trait CpuThermometer {
    /// Error type for reads
    type Error: Debug;

    /// Read the temperature in millidegrees Celsius
    fn read_millicelsius(&mut self) -> Result<i32, Self::Error>;
}
