//! Focuser motion logic
//!
//! Everything here is pure bookkeeping; the step pulses themselves are
//! generated by the controller's worker thread.

mod compensation;
mod focuser;
mod optics;
mod resolution;
mod stepping;

pub use compensation::TemperatureCompensator;
pub use focuser::{Direction, FocuserState, MotionError, MovePlan, StepRange};
pub use optics::{FocusInfo, FocusQuality};
pub use resolution::{Resolution, CANONICAL_RESOLUTION};
pub use stepping::{MotionState, StepKind, StepTracker};
