//! MLX90614 IR thermometer pointed at the sky
//!
//! A clear sky reads far colder than ambient, so the sky/ambient
//! difference is the usual cloud indicator.

use meridian_core::traits::SensorError;
use meridian_hal::I2cBus;

/// Factory default SMBus address
pub const ADDRESS: u8 = 0x5A;

const RAM_AMBIENT: u8 = 0x06;
const RAM_OBJECT: u8 = 0x07;

/// Kelvin per LSB of the RAM temperature registers
const KELVIN_PER_LSB: f64 = 0.02;
const ZERO_CELSIUS_K: f64 = 273.15;

/// One IR thermometer sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SkyReading {
    /// Sensor die temperature (°C)
    pub ambient: f64,
    /// Sky temperature (°C)
    pub sky: f64,
    /// Sky minus ambient (°C)
    pub difference: f64,
}

/// MLX90614 reader
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mlx90614;

impl Mlx90614 {
    pub fn new() -> Self {
        Self
    }

    pub fn read<I: I2cBus>(&mut self, bus: &mut I) -> Result<SkyReading, SensorError> {
        let ambient = bus
            .read_word(ADDRESS, RAM_AMBIENT)
            .map_err(|_| SensorError::NotFound)?;
        let object = bus
            .read_word(ADDRESS, RAM_OBJECT)
            .map_err(|_| SensorError::Bus)?;
        // Bit 15 flags an error in the object channel
        if object & 0x8000 != 0 {
            return Err(SensorError::InvalidReading);
        }

        Ok(SkyReading {
            ambient: KELVIN_PER_LSB * ambient as f64 - ZERO_CELSIUS_K,
            sky: KELVIN_PER_LSB * object as f64 - ZERO_CELSIUS_K,
            difference: KELVIN_PER_LSB * (object as f64 - ambient as f64),
        })
    }
}
