//! Focuser state owned by the motion controller
//!
//! Holds the logical position together with everything that is expressed
//! in resolution-dependent steps, so a resolution change rescales it all
//! in one place.

use super::resolution::Resolution;
use crate::config::FocuserConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Focuser travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Toward position 0
    Inward,
    /// Away from position 0
    Outward,
}

impl Direction {
    /// Position delta of one real step
    pub fn sign(self) -> i32 {
        match self {
            Direction::Inward => -1,
            Direction::Outward => 1,
        }
    }

    /// Direction travelled going from `from` to `to`
    pub fn between(from: i32, to: i32) -> Self {
        if to < from {
            Direction::Inward
        } else {
            Direction::Outward
        }
    }

    /// Direction line level
    ///
    /// Outward drives the line high unless the motor is wired reversed.
    pub fn line_level(self, reverse: bool) -> bool {
        (self == Direction::Outward) != reverse
    }
}

/// Inclusive bounds and increment of a step quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl StepRange {
    pub const fn new(min: i32, max: i32, step: i32) -> Self {
        Self { min, max, step }
    }

    /// Check whether a value lies within the bounds
    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    fn rescale(self, to: Resolution, from: Resolution) -> Self {
        Self {
            min: to.rescale(self.min, from),
            max: to.rescale(self.max, from),
            step: to.rescale(self.step, from),
        }
    }
}

/// Motion request errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Target outside the absolute range
    OutOfRange { target: i32, min: i32, max: i32 },
}

/// A move accepted by [`FocuserState::plan_absolute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MovePlan {
    pub start: i32,
    pub target: i32,
    pub direction: Direction,
    /// Slack pulses to issue before the position starts advancing
    pub backlash: u32,
}

/// Position, resolution and the ranges that scale with it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FocuserState {
    position: i32,
    resolution: Resolution,
    absolute: StepRange,
    relative: StepRange,
    max_travel: StepRange,
    backlash: u32,
    reverse: bool,
    step_delay_us: u32,
    last_direction: Option<Direction>,
}

impl FocuserState {
    /// Relative move range at full step
    pub const RELATIVE_RANGE: StepRange = StepRange::new(0, 10_000, 100);
    /// Limits of the maximum position itself at full step
    pub const MAX_TRAVEL_RANGE: StepRange = StepRange::new(1_000, 100_000, 1_000);

    /// Build the state at position 0 and the configured resolution
    pub fn new(config: &FocuserConfig) -> Self {
        let config = config.clamped();
        let max = config.max_position;
        let mut state = Self {
            position: 0,
            resolution: Resolution::Full,
            absolute: StepRange::new(0, max, max / 100),
            relative: Self::RELATIVE_RANGE,
            max_travel: Self::MAX_TRAVEL_RANGE,
            backlash: config.backlash,
            reverse: config.reverse,
            step_delay_us: config.step_delay_us,
            last_direction: None,
        };
        state.apply_resolution(config.resolution);
        state
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn absolute(&self) -> StepRange {
        self.absolute
    }

    pub fn relative(&self) -> StepRange {
        self.relative
    }

    pub fn max_travel(&self) -> StepRange {
        self.max_travel
    }

    pub fn max_position(&self) -> i32 {
        self.absolute.max
    }

    pub fn backlash(&self) -> u32 {
        self.backlash
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn step_delay_us(&self) -> u32 {
        self.step_delay_us
    }

    /// Position expressed at the canonical resolution
    pub fn canonical_position(&self) -> i32 {
        self.resolution.to_canonical(self.position)
    }

    /// Restore a persisted canonical position
    pub fn restore_canonical(&mut self, canonical: i32) {
        self.position = self.resolution.from_canonical(canonical);
    }

    /// Overwrite the position without moving (sync, or the worker's result)
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub fn set_backlash(&mut self, steps: u32) {
        self.backlash = steps;
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    pub fn set_step_delay_us(&mut self, delay_us: u32) {
        self.step_delay_us = delay_us;
    }

    /// Change the upper end of the absolute range
    pub fn set_max_position(&mut self, max: i32) {
        self.absolute.max = max;
        self.absolute.step = max / 100;
    }

    /// Validate a move and work out its direction and backlash
    ///
    /// Returns `Ok(None)` when already at the target. Backlash is taken up
    /// whenever the direction differs from the previous move's.
    pub fn plan_absolute(&mut self, target: i32) -> Result<Option<MovePlan>, MotionError> {
        if !self.absolute.contains(target) {
            return Err(MotionError::OutOfRange {
                target,
                min: self.absolute.min,
                max: self.absolute.max,
            });
        }
        if target == self.position {
            return Ok(None);
        }

        let direction = Direction::between(self.position, target);
        let reversing = self.last_direction.is_some_and(|last| last != direction);
        let backlash = if reversing { self.backlash } else { 0 };
        self.last_direction = Some(direction);

        Ok(Some(MovePlan {
            start: self.position,
            target,
            direction,
            backlash,
        }))
    }

    /// Plan a move relative to the current position
    pub fn plan_relative(
        &mut self,
        direction: Direction,
        ticks: u32,
    ) -> Result<Option<MovePlan>, MotionError> {
        let target = self.position as i64 + direction.sign() as i64 * ticks as i64;
        let target = target.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        self.plan_absolute(target)
    }

    /// Correction that puts the position on a step boundary of `new`
    ///
    /// Going coarser, a position between two steps of the new resolution
    /// would be truncated by the rescale. The correction moves it to the
    /// nearer boundary, half rounding up. Zero when no move is needed.
    pub fn resolution_adjustment(&self, new: Resolution) -> i32 {
        if new >= self.resolution {
            return 0;
        }
        let boundary = self.resolution.divisor() / new.divisor();
        let remainder = self.position.rem_euclid(boundary);
        if remainder == 0 {
            0
        } else if remainder * 2 < boundary {
            -remainder
        } else {
            boundary - remainder
        }
    }

    /// Switch resolution, rescaling position and ranges by `new/old`
    pub fn apply_resolution(&mut self, new: Resolution) {
        let old = self.resolution;
        if new == old {
            return;
        }
        self.position = new.rescale(self.position, old);
        self.absolute = self.absolute.rescale(new, old);
        self.relative = self.relative.rescale(new, old);
        self.max_travel = self.max_travel.rescale(new, old);
        self.resolution = new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state_at(resolution: Resolution, position: i32) -> FocuserState {
        let mut state = FocuserState::new(&FocuserConfig {
            max_position: 100_000,
            resolution,
            ..Default::default()
        });
        state.set_position(position);
        state
    }

    // What a completed corrective move followed by the switch does
    fn switch(state: &mut FocuserState, new: Resolution) {
        let adjustment = state.resolution_adjustment(new);
        let position = state.position() + adjustment;
        state.set_position(position);
        state.apply_resolution(new);
    }

    fn div_round_half_up(value: i64, divisor: i64) -> i64 {
        (2 * value + divisor) / (2 * divisor)
    }

    #[test]
    fn test_new_rescales_ranges_to_configured_resolution() {
        let state = FocuserState::new(&FocuserConfig {
            resolution: Resolution::Quarter,
            ..Default::default()
        });
        assert_eq!(state.absolute(), StepRange::new(0, 40_000, 400));
        assert_eq!(state.relative(), StepRange::new(0, 40_000, 400));
        assert_eq!(state.max_travel(), StepRange::new(4_000, 400_000, 4_000));
    }

    #[test]
    fn test_out_of_range_rejected_without_state_change() {
        let mut state = state_at(Resolution::Full, 50);
        let before = state.clone();
        let err = state.plan_absolute(100_001).unwrap_err();
        assert_eq!(
            err,
            MotionError::OutOfRange {
                target: 100_001,
                min: 0,
                max: 100_000
            }
        );
        assert_eq!(state.plan_absolute(-1).unwrap_err(), MotionError::OutOfRange {
            target: -1,
            min: 0,
            max: 100_000
        });
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_to_current_position_is_noop() {
        let mut state = state_at(Resolution::Full, 50);
        assert_eq!(state.plan_absolute(50), Ok(None));
    }

    #[test]
    fn test_first_move_takes_no_backlash() {
        let mut state = state_at(Resolution::Full, 500);
        state.set_backlash(50);
        let plan = state.plan_absolute(100).unwrap().unwrap();
        assert_eq!(plan.direction, Direction::Inward);
        assert_eq!(plan.backlash, 0);
    }

    #[test]
    fn test_reversal_takes_backlash() {
        let mut state = state_at(Resolution::Full, 0);
        state.set_backlash(50);
        state.plan_absolute(500).unwrap();
        state.set_position(500);

        // Same direction again: no slack
        let plan = state.plan_absolute(600).unwrap().unwrap();
        assert_eq!(plan.backlash, 0);
        state.set_position(600);

        let plan = state.plan_absolute(400).unwrap().unwrap();
        assert_eq!(plan.direction, Direction::Inward);
        assert_eq!(plan.backlash, 50);
    }

    #[test]
    fn test_relative_move_signs() {
        let mut state = state_at(Resolution::Full, 1_000);
        let plan = state.plan_relative(Direction::Inward, 300).unwrap().unwrap();
        assert_eq!(plan.target, 700);
        let plan = state.plan_relative(Direction::Outward, 300).unwrap().unwrap();
        assert_eq!(plan.target, 1_300);
        assert!(state.plan_relative(Direction::Inward, 2_000).is_err());
    }

    #[test]
    fn test_direction_line_level() {
        assert!(Direction::Outward.line_level(false));
        assert!(!Direction::Inward.line_level(false));
        assert!(!Direction::Outward.line_level(true));
        assert!(Direction::Inward.line_level(true));
    }

    #[test]
    fn test_adjustment_snaps_to_nearer_boundary() {
        // 8 microsteps per quarter step going 32 -> 4
        let state = state_at(Resolution::ThirtySecond, 35);
        assert_eq!(state.resolution_adjustment(Resolution::Quarter), -3);
        let state = state_at(Resolution::ThirtySecond, 37);
        assert_eq!(state.resolution_adjustment(Resolution::Quarter), 3);
        // Exactly half rounds up
        let state = state_at(Resolution::ThirtySecond, 36);
        assert_eq!(state.resolution_adjustment(Resolution::Quarter), 4);
        // To full step the boundary is a whole step
        let state = state_at(Resolution::ThirtySecond, 37);
        assert_eq!(state.resolution_adjustment(Resolution::Full), -5);
    }

    #[test]
    fn test_no_adjustment_going_finer() {
        let state = state_at(Resolution::Half, 3);
        assert_eq!(state.resolution_adjustment(Resolution::Sixteenth), 0);
    }

    #[test]
    fn test_apply_resolution_rescales() {
        let mut state = state_at(Resolution::Full, 1_234);
        state.apply_resolution(Resolution::Eighth);
        assert_eq!(state.position(), 9_872);
        assert_eq!(state.max_position(), 800_000);
        assert_eq!(state.canonical_position(), 1_234 * 32);
    }

    #[test]
    fn test_canonical_restore() {
        let mut state = state_at(Resolution::Half, 0);
        state.restore_canonical(3_200);
        assert_eq!(state.position(), 200);
    }

    proptest! {
        #[test]
        fn prop_resolution_round_trip(
            position in 0i32..10_000,
            first in 0usize..6,
            second in 0usize..6,
        ) {
            let r1 = Resolution::ALL[first];
            let r2 = Resolution::ALL[second];
            let mut state = state_at(r1, position);

            switch(&mut state, r2);
            switch(&mut state, r1);

            let (d1, d2) = (r1.divisor() as i64, r2.divisor() as i64);
            let there = div_round_half_up(position as i64 * d2, d1);
            let back = div_round_half_up(there * d1, d2);
            prop_assert_eq!(state.position() as i64, back);
            prop_assert_eq!(state.resolution(), r1);
        }
    }
}
