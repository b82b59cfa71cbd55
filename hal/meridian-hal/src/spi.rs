//! SPI bus abstractions
//!
//! The controller only ever writes to SPI peripherals (the current DAC on
//! older boards), so the trait is write-only. Chip select and clock setup
//! belong to the implementation.

use core::fmt::Debug;

/// SPI bus master bound to one device
pub trait SpiBus {
    /// Error type for SPI operations
    type Error: Debug;

    /// Write data without reading
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}
