//! CPU cooling fan

use meridian_core::thermal::FanBand;
use meridian_core::traits::OutputError;
use meridian_hal::PwmOutput;

/// Fan on a PWM line, driven by CPU temperature band
pub struct Fan<W> {
    pwm: W,
    band: Option<FanBand>,
}

impl<W: PwmOutput> Fan<W> {
    pub fn new(pwm: W) -> Self {
        Self { pwm, band: None }
    }

    /// Band applied by the last successful update
    pub fn band(&self) -> Option<FanBand> {
        self.band
    }

    /// Apply the band for a CPU temperature (°C)
    ///
    /// The line is rewritten every time so a failed write is retried on the
    /// next evaluation.
    pub fn update(&mut self, cpu_celsius: f64) -> Result<FanBand, OutputError> {
        let band = FanBand::for_temperature(cpu_celsius);
        self.pwm
            .set_pwm(FanBand::FREQUENCY_HZ, band.duty_percent())
            .map_err(|_| OutputError::Pwm)?;
        self.band = Some(band);
        Ok(band)
    }

    /// Stop the fan
    pub fn stop(&mut self) -> Result<(), OutputError> {
        self.band = None;
        self.pwm
            .stop(FanBand::FREQUENCY_HZ)
            .map_err(|_| OutputError::Pwm)
    }
}
