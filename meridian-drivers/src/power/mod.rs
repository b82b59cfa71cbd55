//! Power input monitoring

pub mod ads1115;

pub use ads1115::{PowerChannel, PowerMonitor, PowerPoll, PHASE_COUNT};
