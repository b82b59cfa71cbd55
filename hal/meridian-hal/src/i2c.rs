//! I2C bus abstractions
//!
//! Provides the master operations the sensor drivers need. The address is
//! passed per call so one bus value serves every device on it.

use core::fmt::Debug;

/// I2C bus master
pub trait I2cBus {
    /// Error type for I2C operations
    type Error: Debug;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// SMBus "read word data": command byte, then a little-endian word
    fn read_word(&mut self, address: u8, command: u8) -> Result<u16, Self::Error> {
        let mut buf = [0u8; 2];
        self.write_read(address, &[command], &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
}
