//! Board port bundle
//!
//! A platform implements [`Board`] to name its port types and hands the
//! claimed lines over in a [`BoardPorts`] at connect. Lines are released
//! when the engine is dropped.

use std::sync::Arc;

use meridian_core::traits::PublishSink;
use meridian_drivers::stepper::CurrentDriver;
use meridian_hal::{CpuThermometer, DelayUs, I2cBus, OutputPin, PositionStore, PwmOutput, SpiBus};

/// Port types of a board
///
/// Everything the step worker touches crosses threads and must be `Send`.
pub trait Board: 'static {
    type Pin: OutputPin + Send + 'static;
    type Pwm: PwmOutput + Send + 'static;
    type I2c: I2cBus + Send + 'static;
    type Spi: SpiBus + Send + 'static;
    type Delay: DelayUs + Send + 'static;
    type Store: PositionStore + Send + 'static;
    type Thermometer: CpuThermometer + Send + 'static;
}

/// Publish sink shared by the polling thread and the step worker
pub type SharedSink = Arc<dyn PublishSink + Send + Sync>;

/// Stepper current driver on a board
pub type BoardCurrent<B> = CurrentDriver<<B as Board>::Pin, <B as Board>::Spi, <B as Board>::Pwm>;

/// Claimed ports of one board
pub struct BoardPorts<B: Board> {
    /// Shared sensor bus
    pub i2c: B::I2c,
    /// Current DAC (legacy boards)
    pub dac: B::Spi,
    /// Delay used by the step worker
    pub delay: B::Delay,
    pub store: B::Store,
    pub thermometer: B::Thermometer,
    pub step: B::Pin,
    pub direction: B::Pin,
    /// M0, M1, M2
    pub mode: [B::Pin; 3],
    /// Driver sleep/reset, high = awake
    pub reset: B::Pin,
    /// Active-low driver enable
    pub enable: B::Pin,
    pub decay: B::Pin,
    /// Current reference PWM (newer boards)
    pub motor_pwm: B::Pwm,
    pub fan: B::Pwm,
    pub relays: [B::Pin; 2],
    pub pwm_outputs: [B::Pwm; 2],
}
