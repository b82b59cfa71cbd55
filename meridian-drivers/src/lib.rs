//! Hardware driver implementations
//!
//! Device protocols written against the `meridian-hal` bus traits:
//!
//! - Sky quality sensors (TSL2591 state machine, legacy SQM module)
//! - Environment sensors (SHT3x temperature/humidity, MLX90614 IR)
//! - Power monitor (ADS1115 round-robin)
//! - Stepper driver lines (step/direction, microstep mode, current)
//! - Accessories (CPU fan, relays, PWM outputs)
//!
//! Sensor drivers do not own the I2C bus; the polling engine passes it in
//! on every call, so one bus serves all of them.

#![no_std]
#![deny(unsafe_code)]

// Float methods in tests
#[cfg(test)]
extern crate std;

pub mod accessory;
pub mod power;
pub mod sensor;
pub mod stepper;

#[cfg(test)]
mod mock;
