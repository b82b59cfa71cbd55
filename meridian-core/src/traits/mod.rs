//! Interfaces between the core and its collaborators
//!
//! Readings leave the core through [`PublishSink`]; sensor drivers report
//! failures as [`SensorError`], output lines as [`OutputError`].

pub mod output;
pub mod publish;
pub mod sensor;

pub use output::OutputError;
pub use publish::{PowerReadings, PublishSink, Reading, Status};
pub use sensor::SensorError;
