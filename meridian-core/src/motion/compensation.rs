//! Temperature compensation
//!
//! Focus drifts as the tube contracts when the night cools down. The
//! compensator turns a temperature change into a step correction, and
//! ignores changes smaller than half the critical focus zone.

use crate::config::CompensationConfig;

/// Decides corrective moves from temperature drift
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureCompensator {
    config: CompensationConfig,
}

impl TemperatureCompensator {
    pub fn new(config: CompensationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CompensationConfig {
        self.config
    }

    pub fn set_config(&mut self, config: CompensationConfig) {
        self.config = config;
    }

    /// Steps to move for the drift from `baseline` to `temperature`
    ///
    /// `None` when disabled, when there is no drift, or when the drift is
    /// within half the critical focus zone (`cfz_steps`).
    pub fn correction(&self, temperature: f64, baseline: f64, cfz_steps: f64) -> Option<i32> {
        if !self.config.enabled || temperature == baseline {
            return None;
        }
        let delta_steps = self.config.steps_per_degree * (temperature - baseline);
        if libm::fabs(delta_steps) > cfz_steps / 2.0 {
            Some(libm::round(delta_steps) as i32)
        } else {
            None
        }
    }
}
