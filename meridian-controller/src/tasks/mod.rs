//! Threads of the controller
//!
//! - `poll`: the cooperative polling loop, one tick at a time
//! - `step_worker`: pulse generation for a single focuser move

pub mod poll;
pub mod step_worker;
