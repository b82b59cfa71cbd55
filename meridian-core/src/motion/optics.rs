//! Critical focus zone and step size

use crate::config::OpticsConfig;

/// How well one step resolves the critical focus zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FocusQuality {
    /// Four or more steps per CFZ
    Good,
    /// Between two and four steps per CFZ
    Marginal,
    /// Two or fewer steps per CFZ, or unknown optics
    Poor,
}

/// Derived focuser optics figures
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FocusInfo {
    /// Focal ratio, 0 when the optics are unknown
    pub focal_ratio: f64,
    /// Travel per step (µm)
    pub step_size_um: f64,
    /// Critical focus zone width (µm)
    pub cfz_um: f64,
    /// Steps across the critical focus zone
    pub steps_per_cfz: f64,
    pub quality: FocusQuality,
}

impl FocusInfo {
    /// CFZ coefficient for 520 nm light
    const CFZ_FACTOR: f64 = 4.88 * 0.520;

    /// Compute the figures for a focuser with `max_position` steps of travel
    pub fn compute(optics: &OpticsConfig, max_position: i32) -> Self {
        let focal_ratio = if optics.aperture_mm > 0.0 && optics.focal_length_mm > 0.0 {
            optics.focal_length_mm / optics.aperture_mm
        } else {
            0.0
        };
        let cfz_um = Self::CFZ_FACTOR * libm::pow(focal_ratio, 2.0);
        let step_size_um = if max_position > 0 {
            1000.0 * optics.travel_mm / max_position as f64
        } else {
            0.0
        };
        let steps_per_cfz = if step_size_um > 0.0 {
            libm::trunc(cfz_um) / step_size_um
        } else {
            0.0
        };
        let quality = if steps_per_cfz >= 4.0 {
            FocusQuality::Good
        } else if steps_per_cfz > 2.0 {
            FocusQuality::Marginal
        } else {
            FocusQuality::Poor
        };

        Self {
            focal_ratio,
            step_size_um,
            cfz_um,
            steps_per_cfz,
            quality,
        }
    }
}
