//! Polling engine
//!
//! One [`Engine`] per connected board. [`Engine::tick`] is called on every
//! scheduler tick from the polling thread and runs whichever tasks are due.
//! Nothing in here sleeps: slow sensors are split into phases and simply
//! report "not yet" until their data is ready.

use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use meridian_core::config::{
    CompensationConfig, HardwareRevision, HoldPower, OpticsConfig, PollTiming,
};
use meridian_core::motion::{
    Direction, FocusInfo, FocusQuality, FocuserState, Resolution, TemperatureCompensator,
};
use meridian_core::scheduler::{PollScheduler, Task};
use meridian_core::thermal::CurrentPolicy;
use meridian_core::traits::{OutputError, Reading, Status};
use meridian_drivers::accessory::{AuxOutputs, Fan};
use meridian_drivers::power::{PowerMonitor, PowerPoll};
use meridian_drivers::sensor::{LegacySqm, LightPoll, Mlx90614, Sht3x, SkyReading, Tsl2591};
use meridian_drivers::stepper::{CurrentDriver, CurrentReference, ModeLines, StepLines};
use meridian_hal::CpuThermometer;

use crate::board::{Board, BoardCurrent, BoardPorts, SharedSink};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::motion::MotionController;

/// Controller core for one connected board
pub struct Engine<B: Board> {
    revision: HardwareRevision,
    scheduler: PollScheduler,
    motion: MotionController<B>,
    current: Arc<Mutex<BoardCurrent<B>>>,
    i2c: B::I2c,
    light: Tsl2591,
    legacy_sqm: LegacySqm,
    climate: Sht3x,
    sky: Mlx90614,
    /// IR reading of the environment pass awaiting the SHT result
    sky_reading: Option<SkyReading>,
    power: Option<PowerMonitor>,
    thermometer: B::Thermometer,
    cpu_temperature: Option<f64>,
    fan: Fan<B::Pwm>,
    outputs: AuxOutputs<B::Pin, B::Pwm>,
    compensator: TemperatureCompensator,
    optics: OpticsConfig,
    focus_info: FocusInfo,
    sink: SharedSink,
}

impl<B: Board> Engine<B> {
    /// Bring up a board
    ///
    /// Refuses boards older than revision 3. Lines are driven to their
    /// idle levels, the stored position is loaded and all deadlines are
    /// armed relative to `now_ms`.
    pub fn connect(
        ports: BoardPorts<B>,
        config: &AppConfig,
        sink: SharedSink,
        board_revision: u8,
        now_ms: u64,
    ) -> Result<Self> {
        let revision = HardwareRevision::from_board_revision(board_revision)
            .ok_or(Error::UnsupportedRevision(board_revision))?;
        info!("Connecting board revision {} ({:?})", board_revision, revision);

        let focuser = config.focuser.clamped();
        let policy = CurrentPolicy::new(revision, focuser.current_ma, focuser.hold_power);
        let reference = CurrentReference::for_revision(revision, ports.dac, ports.motor_pwm);
        let current = Arc::new(Mutex::new(CurrentDriver::new(
            policy,
            reference,
            ports.enable,
            ports.decay,
        )));
        current.lock().hold()?;

        let mut motion = MotionController::new(
            FocuserState::new(&focuser),
            StepLines::new(ports.step, ports.direction),
            ModeLines::new(ports.mode, ports.reset),
            ports.delay,
            Arc::clone(&current),
            ports.store,
            Arc::clone(&sink),
        );
        motion.restore()?;

        let mut outputs = AuxOutputs::new(
            ports.relays,
            ports.pwm_outputs,
            config.outputs.pwm_frequency_hz,
        );
        if let Err(e) = outputs.apply_config(&config.outputs) {
            warn!("Failed to apply auxiliary outputs: {:?}", e);
        }

        let power = revision
            .has_power_monitor()
            .then(|| PowerMonitor::new(config.power.current_sensor, config.timing.tick_ms));

        let mut engine = Self {
            revision,
            scheduler: PollScheduler::new(config.timing, now_ms),
            motion,
            current,
            i2c: ports.i2c,
            light: Tsl2591::new(config.sky_quality.clamped_offset()),
            legacy_sqm: LegacySqm::new(),
            climate: Sht3x::new(),
            sky: Mlx90614::new(),
            sky_reading: None,
            power,
            thermometer: ports.thermometer,
            cpu_temperature: None,
            fan: Fan::new(ports.fan),
            outputs,
            compensator: TemperatureCompensator::new(config.compensation),
            optics: config.optics,
            focus_info: FocusInfo::compute(&config.optics, focuser.max_position),
            sink,
        };
        engine.refresh_focus_info();
        Ok(engine)
    }

    pub fn revision(&self) -> HardwareRevision {
        self.revision
    }

    pub fn timing(&self) -> &PollTiming {
        self.scheduler.timing()
    }

    pub fn motion(&self) -> &MotionController<B> {
        &self.motion
    }

    pub fn focus_info(&self) -> FocusInfo {
        self.focus_info
    }

    pub fn outputs(&self) -> &AuxOutputs<B::Pin, B::Pwm> {
        &self.outputs
    }

    /// Run every task that is due at `now_ms`
    pub fn tick(&mut self, now_ms: u64) {
        if let Err(e) = self.motion.reap() {
            warn!("Step worker ended abnormally: {}", e);
        }

        let due = self.scheduler.due(now_ms);
        let environment_due = due.contains(&Task::Environment);
        for task in due {
            match task {
                Task::Light => self.poll_light(now_ms, environment_due),
                Task::Environment => self.poll_environment(now_ms),
                Task::Compensation => self.compensate(),
                Task::System => self.poll_system(),
                Task::Fan => self.update_fan(),
                Task::Power => self.poll_power(),
            }
        }

        self.collect_climate(now_ms);
    }

    // Sky quality: TSL2591 every tick, legacy module as a slow fallback
    fn poll_light(&mut self, now_ms: u64, environment_due: bool) {
        match self.light.poll(&mut self.i2c, now_ms) {
            Ok(LightPoll::Magnitude(magnitude)) => {
                self.sink
                    .publish(Reading::SkyBrightness(magnitude), Status::Ok);
            }
            Ok(_) => {}
            Err(e) => {
                if !environment_due {
                    return;
                }
                debug!("TSL2591 unavailable ({:?}), trying legacy SQM", e);
                match self.legacy_sqm.read(&mut self.i2c) {
                    Ok(magnitude) => self
                        .sink
                        .publish(Reading::SkyBrightness(magnitude), Status::Ok),
                    Err(_) => self.sink.publish(Reading::SkyBrightness(0.0), Status::Alert),
                }
            }
        }
    }

    // IR sensor is read now; the SHT3x result is collected on a later tick
    fn poll_environment(&mut self, now_ms: u64) {
        self.sky_reading = match self.sky.read(&mut self.i2c) {
            Ok(reading) => {
                self.sink
                    .publish(Reading::SkyTemperature(reading.sky), Status::Ok);
                self.sink
                    .publish(Reading::SkyDifference(reading.difference), Status::Ok);
                Some(reading)
            }
            Err(e) => {
                debug!("MLX90614 unavailable: {:?}", e);
                self.sink.publish(Reading::SkyTemperature(0.0), Status::Alert);
                self.sink.publish(Reading::SkyDifference(0.0), Status::Alert);
                None
            }
        };

        if let Err(e) = self.climate.start(&mut self.i2c, now_ms) {
            debug!("SHT3x unavailable: {:?}", e);
            self.climate_unavailable();
        }
    }

    fn collect_climate(&mut self, now_ms: u64) {
        if !self.climate.is_measuring() {
            return;
        }
        match self.climate.poll(&mut self.i2c, now_ms) {
            Ok(Some(reading)) => {
                self.sink
                    .publish(Reading::Temperature(reading.temperature), Status::Ok);
                self.sink
                    .publish(Reading::Humidity(reading.humidity), Status::Ok);
                self.sink
                    .publish(Reading::DewPoint(reading.dew_point), Status::Ok);
                self.update_focuser_temperature(Some(reading.temperature));
            }
            Ok(None) => {}
            Err(e) => {
                debug!("SHT3x read failed: {:?}", e);
                self.climate_unavailable();
            }
        }
    }

    fn climate_unavailable(&mut self) {
        self.sink.publish(Reading::Temperature(0.0), Status::Alert);
        self.sink.publish(Reading::Humidity(0.0), Status::Alert);
        self.sink.publish(Reading::DewPoint(0.0), Status::Alert);
        self.update_focuser_temperature(None);
    }

    // SHT3x first, IR sensor ambient second
    fn update_focuser_temperature(&mut self, climate: Option<f64>) {
        let temperature = climate.or(self.sky_reading.map(|reading| reading.ambient));
        self.motion.set_temperature(temperature);
        match temperature {
            Some(celsius) => self
                .sink
                .publish(Reading::FocuserTemperature(celsius), Status::Ok),
            None => self
                .sink
                .publish(Reading::FocuserTemperature(0.0), Status::Alert),
        }
    }

    // A lost sensor reads as 0 °C, like every other unavailable value
    fn compensate(&mut self) {
        if self.motion.is_moving() {
            return;
        }
        let Some(baseline) = self.motion.baseline() else {
            return;
        };
        let temperature = self.motion.temperature().unwrap_or(0.0);
        let Some(steps) =
            self.compensator
                .correction(temperature, baseline, self.focus_info.steps_per_cfz)
        else {
            return;
        };

        let target = self.motion.position().saturating_add(steps);
        info!(
            "Temperature compensation: {:.2} -> {:.2} C, moving {} steps to {}",
            baseline, temperature, steps, target
        );
        if let Err(e) = self.motion.move_absolute(target) {
            warn!("Compensation move rejected: {}", e);
        }
    }

    fn poll_system(&mut self) {
        match self.thermometer.read_millicelsius() {
            Ok(millicelsius) => {
                let celsius = millicelsius as f64 / 1_000.0;
                self.cpu_temperature = Some(celsius);
                self.sink
                    .publish(Reading::CpuTemperature(celsius), Status::Ok);
            }
            Err(e) => {
                debug!("CPU temperature unavailable: {:?}", e);
                self.cpu_temperature = None;
                self.sink
                    .publish(Reading::CpuTemperature(0.0), Status::Alert);
            }
        }
    }

    fn update_fan(&mut self) {
        let celsius = self.cpu_temperature.unwrap_or(0.0);
        match self.fan.update(celsius) {
            Ok(band) => self
                .sink
                .publish(Reading::FanDuty(band.duty_percent()), Status::Ok),
            Err(e) => {
                warn!("Fan line unavailable: {:?}", e);
                self.sink.publish(Reading::FanDuty(0), Status::Alert);
            }
        }
    }

    fn poll_power(&mut self) {
        let Some(monitor) = self.power.as_mut() else {
            return;
        };
        match monitor.poll(&mut self.i2c) {
            Ok(PowerPoll::Measured(_, readings)) => {
                self.sink.publish(Reading::Power(readings), Status::Ok);
            }
            Ok(PowerPoll::Triggered(_)) => {}
            Err(e) => {
                debug!("Power monitor unavailable: {:?}", e);
                self.sink
                    .publish(Reading::Power(monitor.readings()), Status::Alert);
            }
        }
    }

    fn refresh_focus_info(&mut self) {
        self.focus_info = FocusInfo::compute(&self.optics, self.motion.state().max_position());
        let status = match self.focus_info.quality {
            FocusQuality::Good => Status::Ok,
            FocusQuality::Marginal => Status::Busy,
            FocusQuality::Poor => Status::Alert,
        };
        self.sink.publish(Reading::FocusInfo(self.focus_info), status);
    }

    // Operations

    pub fn move_absolute(&mut self, target: i32) -> Result<()> {
        self.motion.move_absolute(target)
    }

    pub fn move_relative(&mut self, direction: Direction, ticks: u32) -> Result<()> {
        self.motion.move_relative(direction, ticks)
    }

    pub fn abort(&mut self) -> Result<()> {
        self.motion.abort()
    }

    pub fn sync(&mut self, ticks: i32) -> Result<()> {
        self.motion.sync(ticks)
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.motion.set_resolution(resolution)?;
        self.refresh_focus_info();
        Ok(())
    }

    pub fn set_backlash(&mut self, steps: u32) {
        self.motion.set_backlash(steps);
    }

    pub fn set_max_position(&mut self, ticks: i32) {
        self.motion.set_max_position(ticks);
        self.refresh_focus_info();
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.motion.set_reverse(reverse);
    }

    pub fn set_step_delay_us(&mut self, delay_us: u32) {
        self.motion.set_step_delay_us(delay_us);
    }

    pub fn set_hold_power(&mut self, hold: HoldPower) -> Result<()> {
        self.current.lock().set_hold(hold)?;
        info!("Hold power set to {}%", hold.percent());
        Ok(())
    }

    pub fn set_drive_current(&mut self, milliamps: u32) -> Result<()> {
        self.current.lock().set_drive_current(milliamps)?;
        info!("Stepper current set to {} mA", milliamps);
        Ok(())
    }

    pub fn set_compensation(&mut self, config: CompensationConfig) {
        self.compensator.set_config(config);
        info!(
            "Temperature compensation {} ({} steps/C)",
            if config.enabled { "enabled" } else { "disabled" },
            config.steps_per_degree
        );
    }

    pub fn set_optics(&mut self, optics: OpticsConfig) {
        self.optics = optics;
        self.refresh_focus_info();
    }

    pub fn set_sky_quality_offset(&mut self, offset: f64) {
        self.light.set_offset(offset.clamp(-1.0, 1.0));
    }

    pub fn set_relay(&mut self, index: usize, on: bool) -> Result<()> {
        let result = self.outputs.set_relay(index, on);
        let status = publish_status(&result);
        self.sink.publish(
            Reading::Relay {
                index: index as u8,
                on: self.outputs.relay(index).unwrap_or(false),
            },
            status,
        );
        Ok(result?)
    }

    pub fn set_pwm_output(&mut self, index: usize, duty: u8) -> Result<()> {
        let result = self.outputs.set_duty(index, duty);
        let status = publish_status(&result);
        self.sink.publish(
            Reading::PwmOutput {
                index: index as u8,
                duty: self.outputs.duty(index).unwrap_or(0),
            },
            status,
        );
        Ok(result?)
    }

    pub fn set_pwm_frequency(&mut self, frequency_hz: u32) -> Result<()> {
        self.outputs.set_frequency(frequency_hz)?;
        info!("PWM outputs at {} Hz", self.outputs.frequency_hz());
        Ok(())
    }

    /// Stop the motor, release the driver and switch outputs off
    pub fn disconnect(mut self) -> Result<()> {
        info!("Disconnecting");
        self.motion.shutdown()?;
        if let Err(e) = self.fan.stop() {
            warn!("Failed to stop fan: {:?}", e);
        }
        if let Err(e) = self.outputs.shutdown() {
            warn!("Failed to switch outputs off: {:?}", e);
        }
        Ok(())
    }
}

fn publish_status(result: &std::result::Result<(), OutputError>) -> Status {
    if result.is_ok() {
        Status::Ok
    } else {
        Status::Alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBoard, MockHandles, RecordingSink};

    fn connect(config: &AppConfig, revision: u8) -> (Engine<MockBoard>, MockHandles, Arc<RecordingSink>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let (ports, handles) = MockBoard::ports(false);
        let (recording, sink) = RecordingSink::shared();
        let engine = Engine::connect(ports, config, sink, revision, 0).unwrap();
        (engine, handles, recording)
    }

    fn sky_sensor_present(handles: &MockHandles) {
        let mut words = handles.words.lock();
        // 15 °C ambient, -20 °C sky
        words.insert((0x5A, 0x06), 14_408);
        words.insert((0x5A, 0x07), 12_658);
    }

    #[test]
    fn test_refuses_old_boards() {
        let (ports, _handles) = MockBoard::ports(false);
        let (_recording, sink) = RecordingSink::shared();
        let result = Engine::connect(ports, &AppConfig::default(), sink, 2, 0);
        assert!(matches!(result, Err(Error::UnsupportedRevision(2))));
    }

    #[test]
    fn test_connect_publishes_initial_state() {
        let (engine, handles, sink) = connect(&AppConfig::default(), 4);

        assert_eq!(engine.revision(), HardwareRevision::RevPwmCurrent);
        assert_eq!(sink.positions(), vec![(0, Status::Ok)]);
        assert!(sink.last("focuser.info").is_some());
        let lines = handles.lines.lock();
        assert_eq!(lines.level("reset"), Some(true));
        assert_eq!(lines.level("relay0"), Some(false));
    }

    #[test]
    fn test_absent_sensors_publish_alerts() {
        let (mut engine, _handles, sink) = connect(&AppConfig::default(), 4);

        engine.tick(5_000);

        for name in [
            "weather.sky_brightness",
            "weather.sky_temperature",
            "weather.temperature",
            "weather.humidity",
            "focuser.temperature",
        ] {
            let (_, status) = sink.last(name).unwrap();
            assert_eq!(status, Status::Alert, "{}", name);
        }
        assert!(matches!(
            sink.last("power"),
            Some((Reading::Power(_), Status::Alert))
        ));
        assert_eq!(engine.motion().temperature(), None);
    }

    #[test]
    fn test_sky_ambient_stands_in_for_focuser_temperature() {
        let (mut engine, handles, sink) = connect(&AppConfig::default(), 4);
        sky_sensor_present(&handles);

        engine.tick(5_000);

        let Some((Reading::FocuserTemperature(celsius), Status::Ok)) =
            sink.last("focuser.temperature")
        else {
            panic!("no focuser temperature");
        };
        assert!((celsius - 15.01).abs() < 0.01);
        assert_eq!(engine.motion().temperature(), Some(celsius));
        assert_eq!(engine.motion().baseline(), Some(celsius));
        assert!(matches!(
            sink.last("weather.sky_temperature"),
            Some((_, Status::Ok))
        ));
    }

    #[test]
    fn test_fan_follows_cpu_temperature() {
        let (mut engine, handles, sink) = connect(&AppConfig::default(), 4);

        engine.tick(5_000);

        assert_eq!(
            sink.last("system.cpu_temperature"),
            Some((Reading::CpuTemperature(45.0), Status::Ok))
        );
        assert_eq!(
            sink.last("system.fan"),
            Some((Reading::FanDuty(33), Status::Ok))
        );
        assert_eq!(handles.lines.lock().pwm.get("fan"), Some(&(100, 33)));
    }

    #[test]
    fn test_legacy_board_has_no_power_monitor() {
        let (mut engine, _handles, sink) = connect(&AppConfig::default(), 3);

        engine.tick(0);
        engine.tick(200);

        assert_eq!(engine.revision(), HardwareRevision::RevLegacyDac);
        assert!(sink.last("power").is_none());
    }

    #[test]
    fn test_compensation_moves_by_drift() {
        let mut config = AppConfig::default();
        config.compensation = CompensationConfig {
            enabled: true,
            steps_per_degree: 10.0,
        };
        let (mut engine, handles, _sink) = connect(&config, 4);
        engine.motion.set_temperature(Some(10.0));
        engine.motion.set_temperature(Some(12.0));

        engine.compensate();
        engine.motion.wait().unwrap();

        assert_eq!(engine.motion().position(), 20);
        assert_eq!(handles.lines.lock().steps.len(), 20);
        // The finished move re-baselines
        assert_eq!(engine.motion().baseline(), Some(12.0));
    }

    #[test]
    fn test_lost_sensor_compensates_toward_zero() {
        let mut config = AppConfig::default();
        config.compensation = CompensationConfig {
            enabled: true,
            steps_per_degree: 10.0,
        };
        let (mut engine, handles, _sink) = connect(&config, 4);
        engine.sync(1_000).unwrap();
        engine.motion.set_temperature(Some(10.0));
        engine.motion.set_temperature(None);

        engine.compensate();
        engine.motion.wait().unwrap();

        assert_eq!(engine.motion().position(), 900);
        assert_eq!(handles.lines.lock().steps.len(), 100);
        assert_eq!(engine.motion().baseline(), Some(0.0));
    }

    #[test]
    fn test_runaway_correction_is_rejected() {
        let mut config = AppConfig::default();
        config.compensation = CompensationConfig {
            enabled: true,
            steps_per_degree: 1e12,
        };
        let (mut engine, handles, sink) = connect(&config, 4);
        engine.sync(5_000).unwrap();
        engine.motion.set_temperature(Some(10.0));
        engine.motion.set_temperature(Some(30.0));

        engine.compensate();

        assert!(!engine.motion().is_moving());
        assert!(handles.lines.lock().steps.is_empty());
        assert_eq!(sink.positions().last(), Some(&(5_000, Status::Alert)));
        engine.set_drive_current(u32::MAX).unwrap();
    }

    #[test]
    fn test_compensation_needs_a_temperature() {
        let mut config = AppConfig::default();
        config.compensation.enabled = true;
        let (mut engine, handles, _sink) = connect(&config, 4);

        engine.compensate();

        assert!(!engine.motion().is_moving());
        assert!(handles.lines.lock().steps.is_empty());
    }

    #[test]
    fn test_relay_and_pwm_outputs() {
        let (mut engine, handles, sink) = connect(&AppConfig::default(), 4);

        engine.set_relay(1, true).unwrap();
        engine.set_pwm_output(0, 40).unwrap();

        assert_eq!(
            sink.last("output.relay2"),
            Some((Reading::Relay { index: 1, on: true }, Status::Ok))
        );
        let lines = handles.lines.lock();
        assert_eq!(lines.level("relay1"), Some(true));
        assert_eq!(lines.duty("pwm0"), Some(40));
        drop(lines);

        assert!(engine.set_relay(5, true).is_err());
        assert!(matches!(sink.last("output.relay2"), Some((_, Status::Alert))));
    }

    #[test]
    fn test_disconnect_releases_driver() {
        let (mut engine, handles, _sink) = connect(&AppConfig::default(), 4);
        engine.set_relay(0, true).unwrap();

        engine.disconnect().unwrap();

        let lines = handles.lines.lock();
        assert_eq!(lines.level("reset"), Some(false));
        assert_eq!(lines.level("enable"), Some(true));
        assert_eq!(lines.level("relay0"), Some(false));
        assert_eq!(lines.duty("fan"), Some(0));
    }
}
