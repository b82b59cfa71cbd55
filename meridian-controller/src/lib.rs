//! Observatory controller runtime
//!
//! Ties the drivers together on a host with threads:
//!
//! - [`engine::Engine`] - connect/disconnect and the per-tick task dispatch
//! - [`motion::MotionController`] - focuser moves on a dedicated step worker
//! - [`tasks::poll`] - the polling loop thread and its command channel
//! - [`config::AppConfig`] - TOML configuration
//! - [`store::FilePositionStore`], [`system`] - host implementations of
//!   the position store, CPU thermometer and delay ports
//!
//! GPIO, PWM, I2C and SPI ports are supplied by the platform through the
//! [`board::Board`] trait.

#![deny(unsafe_code)]

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod motion;
pub mod store;
pub mod system;
pub mod tasks;

#[cfg(test)]
mod mock;

pub use board::{Board, BoardPorts, SharedSink};
pub use config::AppConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use motion::MotionController;
pub use tasks::poll::{Command, PollLoop};
