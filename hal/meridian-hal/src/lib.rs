//! Meridian Hardware Abstraction Layer
//!
//! This crate defines the bus port traits the controller core is written
//! against. A platform (Linux GPIO character device, a mock board in tests,
//! etc.) implements them once and the same drivers run on top.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  meridian-controller (std runtime)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  meridian-drivers (device protocols)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  meridian-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`pwm::PwmOutput`] - Hardware or software PWM lines
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`spi::SpiBus`] - SPI bus operations
//! - [`delay::DelayUs`] - Microsecond delays for pulse generation
//! - [`thermal::CpuThermometer`] - SoC temperature
//! - [`store::PositionStore`] - Persistent focuser position

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod spi;
pub mod store;
pub mod thermal;

// Re-export key traits at crate root for convenience
pub use delay::DelayUs;
pub use gpio::{InputPin, OutputPin};
pub use i2c::I2cBus;
pub use pwm::PwmOutput;
pub use spi::SpiBus;
pub use store::{PositionStore, StoreError};
pub use thermal::CpuThermometer;
