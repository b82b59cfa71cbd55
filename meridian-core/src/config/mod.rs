//! Configuration types
//!
//! Plain data with defaults matching the stock controller. The std runtime
//! deserializes these from its TOML file when the `serde` feature is on.

mod board;
mod focuser;
mod timing;

pub use board::{CurrentSensor, HardwareRevision, OutputsConfig, PowerConfig, SkyQualityConfig};
pub use focuser::{CompensationConfig, FocuserConfig, HoldPower, OpticsConfig};
pub use timing::PollTiming;
