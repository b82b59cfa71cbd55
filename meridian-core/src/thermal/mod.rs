//! Fan and stepper current policies

mod current;
mod fan;

pub use current::{CurrentDemand, CurrentPolicy, DacChannel};
pub use fan::FanBand;
