//! Sensor error type

/// Errors from sensor polls
///
/// Any error clears the sensor's availability until its next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device did not acknowledge its address
    NotFound,
    /// Bus transaction failed mid-protocol
    Bus,
    /// Data read back is not plausible
    InvalidReading,
}
