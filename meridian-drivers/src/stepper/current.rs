//! Stepper current reference and enable/decay lines

use meridian_core::config::{HardwareRevision, HoldPower};
use meridian_core::thermal::{CurrentDemand, CurrentPolicy, DacChannel};
use meridian_core::traits::OutputError;
use meridian_hal::{OutputPin, PwmOutput, SpiBus};

/// Source of the driver's current reference voltage
pub enum CurrentReference<S, W> {
    /// External SPI DAC, channel A
    Dac(S),
    /// RC-filtered PWM line
    Pwm(W),
}

impl<S: SpiBus, W: PwmOutput> CurrentReference<S, W> {
    /// Pick the reference a board generation is built with
    pub fn for_revision(revision: HardwareRevision, dac: S, pwm: W) -> Self {
        match revision {
            HardwareRevision::RevLegacyDac => CurrentReference::Dac(dac),
            HardwareRevision::RevPwmCurrent => CurrentReference::Pwm(pwm),
        }
    }

    fn set(&mut self, milliamps: u32) -> Result<(), OutputError> {
        match self {
            CurrentReference::Dac(spi) => {
                let frame = CurrentPolicy::dac_frame(DacChannel::A, CurrentPolicy::dac_code(milliamps));
                spi.write(&frame).map_err(|_| OutputError::Dac)
            }
            CurrentReference::Pwm(pwm) => pwm
                .set_pwm(CurrentPolicy::MOTOR_PWM_HZ, CurrentPolicy::pwm_duty(milliamps))
                .map_err(|_| OutputError::Pwm),
        }
    }
}

/// Drives the current reference and the enable/decay lines
///
/// Shared between the polling thread (configuration changes) and the step
/// worker (drive current for a move, hold current after it).
pub struct CurrentDriver<P, S, W> {
    policy: CurrentPolicy,
    reference: CurrentReference<S, W>,
    enable: P,
    decay: P,
    moving: bool,
}

impl<P: OutputPin, S: SpiBus, W: PwmOutput> CurrentDriver<P, S, W> {
    pub fn new(policy: CurrentPolicy, reference: CurrentReference<S, W>, enable: P, decay: P) -> Self {
        Self {
            policy,
            reference,
            enable,
            decay,
            moving: false,
        }
    }

    pub fn policy(&self) -> CurrentPolicy {
        self.policy
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Full drive current for a move
    pub fn drive(&mut self) -> Result<CurrentDemand, OutputError> {
        self.moving = true;
        self.apply(self.policy.moving())
    }

    /// Hold current between moves
    pub fn hold(&mut self) -> Result<CurrentDemand, OutputError> {
        self.moving = false;
        self.apply(self.policy.idle())
    }

    /// Change the drive current and re-apply the present state
    pub fn set_drive_current(&mut self, milliamps: u32) -> Result<CurrentDemand, OutputError> {
        self.policy.drive_ma = milliamps;
        self.reapply()
    }

    /// Change the hold share and re-apply the present state
    pub fn set_hold(&mut self, hold: HoldPower) -> Result<CurrentDemand, OutputError> {
        self.policy.hold = hold;
        self.reapply()
    }

    /// Disable the driver outright
    pub fn disable(&mut self) -> Result<(), OutputError> {
        self.moving = false;
        self.enable.set_high().map_err(|_| OutputError::Line)
    }

    fn reapply(&mut self) -> Result<CurrentDemand, OutputError> {
        if self.moving {
            self.apply(self.policy.moving())
        } else {
            self.apply(self.policy.idle())
        }
    }

    fn apply(&mut self, demand: CurrentDemand) -> Result<CurrentDemand, OutputError> {
        self.reference.set(demand.milliamps)?;
        self.enable
            .set_state(demand.enable_line)
            .map_err(|_| OutputError::Line)?;
        self.decay
            .set_state(demand.decay_line)
            .map_err(|_| OutputError::Line)?;
        Ok(demand)
    }
}
