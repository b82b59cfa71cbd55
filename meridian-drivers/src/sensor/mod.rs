//! Environment and sky quality sensors

pub mod mlx90614;
pub mod sht3x;
pub mod sqm_legacy;
pub mod tsl2591;

pub use mlx90614::{Mlx90614, SkyReading};
pub use sht3x::{ClimateReading, Sht3x};
pub use sqm_legacy::LegacySqm;
pub use tsl2591::{LightAccumulator, LightPoll, LightState, Tsl2591};
