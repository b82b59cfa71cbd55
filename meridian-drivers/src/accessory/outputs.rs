//! Relay and PWM auxiliary outputs

use meridian_core::config::OutputsConfig;
use meridian_core::traits::OutputError;
use meridian_hal::{OutputPin, PwmOutput};

/// Relays and PWM outputs on each board
pub const OUTPUT_COUNT: usize = 2;

/// Two relays and two PWM outputs sharing one carrier frequency
pub struct AuxOutputs<P, W> {
    relays: [P; OUTPUT_COUNT],
    pwm: [W; OUTPUT_COUNT],
    relay_state: [bool; OUTPUT_COUNT],
    duty: [u8; OUTPUT_COUNT],
    frequency_hz: u32,
}

impl<P: OutputPin, W: PwmOutput> AuxOutputs<P, W> {
    pub fn new(relays: [P; OUTPUT_COUNT], pwm: [W; OUTPUT_COUNT], frequency_hz: u32) -> Self {
        let (lo, hi) = OutputsConfig::FREQUENCY_RANGE_HZ;
        Self {
            relays,
            pwm,
            relay_state: [false; OUTPUT_COUNT],
            duty: [0; OUTPUT_COUNT],
            frequency_hz: frequency_hz.clamp(lo, hi),
        }
    }

    pub fn relay(&self, index: usize) -> Option<bool> {
        self.relay_state.get(index).copied()
    }

    pub fn duty(&self, index: usize) -> Option<u8> {
        self.duty.get(index).copied()
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Switch a relay
    pub fn set_relay(&mut self, index: usize, on: bool) -> Result<(), OutputError> {
        let relay = self
            .relays
            .get_mut(index)
            .ok_or(OutputError::InvalidIndex)?;
        relay.set_state(on).map_err(|_| OutputError::Line)?;
        self.relay_state[index] = on;
        Ok(())
    }

    /// Set a PWM output's duty (%)
    pub fn set_duty(&mut self, index: usize, duty: u8) -> Result<(), OutputError> {
        let duty = duty.min(100);
        let pwm = self.pwm.get_mut(index).ok_or(OutputError::InvalidIndex)?;
        pwm.set_pwm(self.frequency_hz, duty)
            .map_err(|_| OutputError::Pwm)?;
        self.duty[index] = duty;
        Ok(())
    }

    /// Change the shared carrier and restart both outputs at their duty
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), OutputError> {
        let (lo, hi) = OutputsConfig::FREQUENCY_RANGE_HZ;
        self.frequency_hz = frequency_hz.clamp(lo, hi);
        for (pwm, duty) in self.pwm.iter_mut().zip(self.duty) {
            pwm.set_pwm(self.frequency_hz, duty)
                .map_err(|_| OutputError::Pwm)?;
        }
        Ok(())
    }

    /// Apply the connect-time states from configuration
    pub fn apply_config(&mut self, config: &OutputsConfig) -> Result<(), OutputError> {
        for index in 0..OUTPUT_COUNT {
            self.set_relay(index, config.relays[index])?;
            self.set_duty(index, config.pwm_duty[index])?;
        }
        Ok(())
    }

    /// Drop both relays and stop both PWM outputs
    pub fn shutdown(&mut self) -> Result<(), OutputError> {
        for index in 0..OUTPUT_COUNT {
            self.set_relay(index, false)?;
            self.set_duty(index, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPin, MockPwm};

    type Outputs = AuxOutputs<MockPin, MockPwm>;

    fn outputs() -> Outputs {
        AuxOutputs::new(
            [MockPin::default(), MockPin::default()],
            [MockPwm::default(), MockPwm::default()],
            20,
        )
    }

    #[test]
    fn test_relays() {
        let mut outputs = outputs();
        outputs.set_relay(1, true).unwrap();
        assert_eq!(outputs.relay(1), Some(true));
        assert!(outputs.relays[1].high);
        assert_eq!(outputs.set_relay(2, true), Err(OutputError::InvalidIndex));
    }

    #[test]
    fn test_frequency_change_keeps_each_duty() {
        let mut outputs = outputs();
        outputs.set_duty(0, 30).unwrap();
        outputs.set_duty(1, 70).unwrap();
        outputs.set_frequency(500).unwrap();
        assert_eq!(outputs.pwm[0].duty, 30);
        assert_eq!(outputs.pwm[1].duty, 70);
        assert_eq!(outputs.pwm[1].frequency_hz, 500);
    }

    #[test]
    fn test_frequency_clamped() {
        let mut outputs = outputs();
        outputs.set_frequency(5_000).unwrap();
        assert_eq!(outputs.frequency_hz(), 1_000);
    }

    #[test]
    fn test_apply_config() {
        let mut outputs = outputs();
        outputs
            .apply_config(&OutputsConfig {
                pwm_frequency_hz: 20,
                relays: [true, false],
                pwm_duty: [0, 40],
            })
            .unwrap();
        assert_eq!(outputs.relay(0), Some(true));
        assert_eq!(outputs.duty(1), Some(40));
    }
}
