//! Blocking delay abstraction
//!
//! Only the step worker sleeps; everything on the polling thread compares
//! timestamps instead.

/// Microsecond-resolution blocking delay
pub trait DelayUs {
    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}
