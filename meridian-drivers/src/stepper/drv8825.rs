//! Step, direction, mode and reset lines

use meridian_core::motion::{Direction, Resolution};
use meridian_core::traits::OutputError;
use meridian_hal::{DelayUs, OutputPin};

/// Step line high time (µs); the driver needs 1.9 µs minimum
pub const PULSE_HOLD_US: u32 = 10;

/// Step and direction lines
///
/// Owned by the step worker for the duration of a move.
pub struct StepLines<P> {
    step: P,
    direction: P,
}

impl<P: OutputPin> StepLines<P> {
    pub fn new(step: P, direction: P) -> Self {
        Self { step, direction }
    }

    /// Issue one step pulse in `direction`
    pub fn pulse<D: DelayUs>(
        &mut self,
        direction: Direction,
        reverse: bool,
        delay: &mut D,
    ) -> Result<(), OutputError> {
        self.direction
            .set_state(direction.line_level(reverse))
            .map_err(|_| OutputError::Line)?;
        self.step.set_high().map_err(|_| OutputError::Line)?;
        delay.delay_us(PULSE_HOLD_US);
        self.step.set_low().map_err(|_| OutputError::Line)
    }

    /// Give the lines back
    pub fn release(self) -> (P, P) {
        (self.step, self.direction)
    }
}

/// Microstep mode lines and the sleep/reset line
pub struct ModeLines<P> {
    mode: [P; 3],
    reset: P,
}

impl<P: OutputPin> ModeLines<P> {
    pub fn new(mode: [P; 3], reset: P) -> Self {
        Self { mode, reset }
    }

    /// Drive M0..M2 for a resolution; there is no read-back
    pub fn apply(&mut self, resolution: Resolution) -> Result<(), OutputError> {
        for (line, level) in self.mode.iter_mut().zip(resolution.mode_lines()) {
            line.set_state(level).map_err(|_| OutputError::Line)?;
        }
        Ok(())
    }

    /// Bring the driver out of sleep
    pub fn wake(&mut self) -> Result<(), OutputError> {
        self.reset.set_high().map_err(|_| OutputError::Line)
    }

    /// Put the driver to sleep
    pub fn sleep(&mut self) -> Result<(), OutputError> {
        self.reset.set_low().map_err(|_| OutputError::Line)
    }
}
