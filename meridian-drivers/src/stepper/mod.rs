//! Stepper driver lines
//!
//! The focuser motor sits behind a DRV8825-style step/direction driver:
//! step and direction lines, three microstep mode lines, a sleep/reset
//! line, an active-low enable and a decay mode line. The current
//! reference comes from a DAC or a filtered PWM line depending on the
//! board generation.

pub mod current;
pub mod drv8825;

pub use current::{CurrentDriver, CurrentReference};
pub use drv8825::{ModeLines, StepLines, PULSE_HOLD_US};
