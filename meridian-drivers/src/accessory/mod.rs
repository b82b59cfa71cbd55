//! Accessory outputs
//!
//! - CPU cooling fan on a PWM line
//! - Two relays and two general-purpose PWM outputs (dew heaters, etc.)

pub mod fan;
pub mod outputs;

pub use fan::Fan;
pub use outputs::{AuxOutputs, OUTPUT_COUNT};
