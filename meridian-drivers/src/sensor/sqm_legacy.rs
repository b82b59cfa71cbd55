//! Legacy sky quality module
//!
//! Older boards carry a microcontroller-based SQM that returns the
//! magnitude directly in a 7-byte frame. It is slow, so it is only read
//! on the environment period and only when the TSL2591 is missing.

use meridian_core::traits::SensorError;
use meridian_hal::I2cBus;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = 0x33;

const FRAME_LEN: usize = 7;

/// Legacy SQM reader
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LegacySqm;

impl LegacySqm {
    pub fn new() -> Self {
        Self
    }

    /// Read the sky brightness (mag/arcsec²)
    pub fn read<I: I2cBus>(&mut self, bus: &mut I) -> Result<f64, SensorError> {
        let mut frame = [0u8; FRAME_LEN];
        bus.read(ADDRESS, &mut frame)
            .map_err(|_| SensorError::NotFound)?;
        let hundredths = u16::from_be_bytes([frame[5], frame[6]]);
        Ok(0.01 * hundredths as f64)
    }
}
