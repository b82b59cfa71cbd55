//! GPIO line abstractions
//!
//! Lines are claimed by constructing the implementing type and released
//! when it is dropped. Every write can fail: on a Linux host the line may
//! have been taken by another process.

use core::fmt::Debug;

/// Digital output line
pub trait OutputPin {
    /// Error type for line writes
    type Error: Debug;

    /// Drive the line high (logic 1)
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low (logic 0)
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Drive the line to a specific level
    fn set_state(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}

/// Digital input line
///
/// Used by board revision probing, which lives outside the controller core.
pub trait InputPin {
    /// Error type for line reads
    type Error: Debug;

    /// Check if the line reads high (logic 1)
    fn is_high(&mut self) -> Result<bool, Self::Error>;

    /// Check if the line reads low (logic 0)
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
