//! Per-pulse accounting for a move in progress
//!
//! The worker asks the tracker what each pulse does. Backlash pulses are
//! issued first and never touch the position.

use super::focuser::{Direction, MovePlan};

/// Effect of one step pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepKind {
    /// Slack taken up; position unchanged
    Backlash,
    /// Position advanced to the contained value
    Advance(i32),
}

/// Lifecycle of the focuser's single motion context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    #[default]
    Idle,
    Moving,
    /// Abort raised, worker not yet joined
    Aborting,
}

/// Progress of one move
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTracker {
    position: i32,
    target: i32,
    direction: Direction,
    backlash_remaining: u32,
    real_steps: u32,
}

impl StepTracker {
    /// Publish an intermediate position every this many real steps
    pub const PROGRESS_INTERVAL: u32 = 100;

    pub fn new(plan: &MovePlan) -> Self {
        Self {
            position: plan.start,
            target: plan.target,
            direction: plan.direction,
            backlash_remaining: plan.backlash,
            real_steps: 0,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn backlash_remaining(&self) -> u32 {
        self.backlash_remaining
    }

    /// Position-advancing pulses so far
    pub fn real_steps(&self) -> u32 {
        self.real_steps
    }

    pub fn is_done(&self) -> bool {
        self.position == self.target
    }

    /// Account for one pulse that has just been issued
    pub fn pulse(&mut self) -> StepKind {
        if self.backlash_remaining > 0 {
            self.backlash_remaining -= 1;
            return StepKind::Backlash;
        }
        self.position += self.direction.sign();
        self.real_steps += 1;
        StepKind::Advance(self.position)
    }

    /// Whether the last pulse lands on a progress report
    pub fn progress_due(&self) -> bool {
        self.real_steps > 0
            && self.real_steps % Self::PROGRESS_INTERVAL == 0
            && !self.is_done()
    }
}
