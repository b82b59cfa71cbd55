//! Stepper driver current selection
//!
//! Idle current is the hold share of the drive current. How the current
//! reference is produced depends on the board generation.

use crate::config::{HardwareRevision, HoldPower};

/// DAC output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacChannel {
    A,
    B,
}

/// Driver line states and current for one motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentDemand {
    /// Level of the active-low enable line
    pub enable_line: bool,
    /// Level of the decay mode line; high selects fast decay
    pub decay_line: bool,
    /// Current reference (mA)
    pub milliamps: u32,
}

/// Current policy for a board generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentPolicy {
    pub revision: HardwareRevision,
    pub drive_ma: u32,
    pub hold: HoldPower,
}

impl CurrentPolicy {
    /// Motor PWM carrier on PWM-current boards
    pub const MOTOR_PWM_HZ: u32 = 5_000;

    pub fn new(revision: HardwareRevision, drive_ma: u32, hold: HoldPower) -> Self {
        Self {
            revision,
            drive_ma,
            hold,
        }
    }

    /// Full current while stepping
    pub fn moving(&self) -> CurrentDemand {
        CurrentDemand {
            enable_line: false,
            decay_line: true,
            milliamps: self.drive_ma,
        }
    }

    /// Hold current while idle; the driver is disabled with zero hold
    pub fn idle(&self) -> CurrentDemand {
        CurrentDemand {
            enable_line: self.hold == HoldPower::Off,
            decay_line: false,
            milliamps: self.hold.apply(self.drive_ma),
        }
    }

    /// 8-bit DAC code for a current (0.1 Ω sense, Vref = I/2)
    pub fn dac_code(milliamps: u32) -> u8 {
        (255u32.saturating_mul(milliamps) / 4096).min(255) as u8
    }

    /// Two-byte DAC write frame
    pub fn dac_frame(channel: DacChannel, code: u8) -> [u8; 2] {
        let command = match channel {
            DacChannel::A => 0x30,
            DacChannel::B => 0xB0,
        };
        [command | ((code >> 4) & 0x0F), (code << 4) & 0xF0]
    }

    /// Motor PWM duty for a current; 100% corresponds to 2 A
    pub fn pwm_duty(milliamps: u32) -> u8 {
        (milliamps / 20).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_uses_full_current() {
        let policy = CurrentPolicy::new(HardwareRevision::RevPwmCurrent, 800, HoldPower::Percent20);
        let demand = policy.moving();
        assert_eq!(demand.milliamps, 800);
        assert!(!demand.enable_line);
        assert!(demand.decay_line);
    }

    #[test]
    fn test_idle_hold_share() {
        let policy = CurrentPolicy::new(HardwareRevision::RevPwmCurrent, 800, HoldPower::Percent60);
        let demand = policy.idle();
        assert_eq!(demand.milliamps, 480);
        assert!(!demand.enable_line);
        assert!(!demand.decay_line);
    }

    #[test]
    fn test_idle_without_hold_disables_driver() {
        let policy = CurrentPolicy::new(HardwareRevision::RevLegacyDac, 800, HoldPower::Off);
        let demand = policy.idle();
        assert_eq!(demand.milliamps, 0);
        assert!(demand.enable_line);
    }

    #[test]
    fn test_dac_encoding() {
        // 400 mA -> code 24 -> 0x30|0x01, 0x80
        let code = CurrentPolicy::dac_code(400);
        assert_eq!(code, 24);
        assert_eq!(CurrentPolicy::dac_frame(DacChannel::A, code), [0x31, 0x80]);
        assert_eq!(CurrentPolicy::dac_frame(DacChannel::B, 0xFF), [0xBF, 0xF0]);
    }

    #[test]
    fn test_huge_current_saturates() {
        assert_eq!(CurrentPolicy::dac_code(u32::MAX), 255);
        assert_eq!(CurrentPolicy::pwm_duty(u32::MAX), 100);
        let policy = CurrentPolicy::new(HardwareRevision::RevLegacyDac, u32::MAX, HoldPower::Percent80);
        assert_eq!(policy.idle().milliamps, u32::MAX / 5);
    }

    #[test]
    fn test_pwm_duty() {
        assert_eq!(CurrentPolicy::pwm_duty(400), 20);
        assert_eq!(CurrentPolicy::pwm_duty(2_000), 100);
        assert_eq!(CurrentPolicy::pwm_duty(5_000), 100);
    }
}
