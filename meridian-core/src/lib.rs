//! Board-agnostic core logic for the observatory controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Configuration type definitions
//! - Focuser state: resolution, ranges, move planning, backlash accounting
//! - Temperature compensation and critical focus zone math
//! - Poll deadline bookkeeping
//! - Fan band and stepper current selection
//! - The publish sink trait readings are surfaced through

#![no_std]
#![deny(unsafe_code)]

// Float methods in tests
#[cfg(test)]
extern crate std;

pub mod config;
pub mod motion;
pub mod scheduler;
pub mod thermal;
pub mod traits;
