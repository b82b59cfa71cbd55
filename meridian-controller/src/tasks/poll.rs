//! Polling loop
//!
//! Runs the [`Engine`] on its own thread. Client operations arrive as
//! [`Command`]s over a channel and are applied between ticks, so the
//! engine only ever runs on this thread.

use std::iter;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use meridian_core::config::{CompensationConfig, HoldPower, OpticsConfig};
use meridian_core::motion::{Direction, Resolution};

use crate::board::Board;
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Client operation for the polling thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveAbsolute(i32),
    MoveRelative(Direction, u32),
    Abort,
    Sync(i32),
    SetResolution(Resolution),
    SetBacklash(u32),
    SetMaxPosition(i32),
    SetReverse(bool),
    SetStepDelay(u32),
    SetHoldPower(HoldPower),
    /// Drive current (mA)
    SetCurrent(u32),
    SetCompensation(CompensationConfig),
    SetOptics(OpticsConfig),
    SetSkyQualityOffset(f64),
    SetRelay(usize, bool),
    SetPwmOutput(usize, u8),
    SetPwmFrequency(u32),
    /// Disconnect the board and end the loop
    Shutdown,
}

impl<B: Board> Engine<B> {
    /// Apply one client command
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::MoveAbsolute(target) => self.move_absolute(target),
            Command::MoveRelative(direction, ticks) => self.move_relative(direction, ticks),
            Command::Abort => self.abort(),
            Command::Sync(ticks) => self.sync(ticks),
            Command::SetResolution(resolution) => self.set_resolution(resolution),
            Command::SetBacklash(steps) => {
                self.set_backlash(steps);
                Ok(())
            }
            Command::SetMaxPosition(ticks) => {
                self.set_max_position(ticks);
                Ok(())
            }
            Command::SetReverse(reverse) => {
                self.set_reverse(reverse);
                Ok(())
            }
            Command::SetStepDelay(delay_us) => {
                self.set_step_delay_us(delay_us);
                Ok(())
            }
            Command::SetHoldPower(hold) => self.set_hold_power(hold),
            Command::SetCurrent(milliamps) => self.set_drive_current(milliamps),
            Command::SetCompensation(config) => {
                self.set_compensation(config);
                Ok(())
            }
            Command::SetOptics(optics) => {
                self.set_optics(optics);
                Ok(())
            }
            Command::SetSkyQualityOffset(offset) => {
                self.set_sky_quality_offset(offset);
                Ok(())
            }
            Command::SetRelay(index, on) => self.set_relay(index, on),
            Command::SetPwmOutput(index, duty) => self.set_pwm_output(index, duty),
            Command::SetPwmFrequency(frequency_hz) => self.set_pwm_frequency(frequency_hz),
            // Handled by the loop, which owns the engine by value
            Command::Shutdown => Ok(()),
        }
    }
}

/// Handle to a running polling thread
pub struct PollLoop {
    commands: Sender<Command>,
    handle: JoinHandle<Result<()>>,
}

impl PollLoop {
    /// Start polling `engine` on a new thread
    ///
    /// `epoch` is the instant the engine's millisecond clock counts from,
    /// i.e. the instant `now_ms` passed to [`Engine::connect`] refers to.
    pub fn spawn<B: Board>(engine: Engine<B>, epoch: Instant) -> Result<Self> {
        let (commands, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("poll".into())
            .spawn(move || run(engine, receiver, epoch))?;
        Ok(Self { commands, handle })
    }

    /// Queue a command for the next pass of the loop
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Stopped)
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Disconnect the board and wait for the loop to finish
    pub fn shutdown(self) -> Result<()> {
        // The loop may already have ended on its own
        let _ = self.commands.send(Command::Shutdown);
        self.handle.join().map_err(|_| Error::WorkerPanicked)?
    }
}

/// Queued commands applied in one pass before a due tick runs
const MAX_COMMANDS_PER_PASS: usize = 16;

fn run<B: Board>(mut engine: Engine<B>, commands: Receiver<Command>, epoch: Instant) -> Result<()> {
    let tick = Duration::from_millis(u64::from(engine.timing().tick_ms.max(1)));
    info!("Poll loop started, tick {:?}", tick);

    let mut next_tick = Instant::now();
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            Ok(command) => {
                let queued = commands.try_iter().take(MAX_COMMANDS_PER_PASS - 1);
                if !apply(&mut engine, iter::once(command).chain(queued)) {
                    break;
                }
                if Instant::now() < next_tick {
                    continue;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        engine.tick(epoch.elapsed().as_millis() as u64);

        next_tick += tick;
        let now = Instant::now();
        if next_tick < now {
            // Fell behind; the scheduler skips missed periods itself
            next_tick = now + tick;
        }
    }

    info!("Poll loop stopping");
    engine.disconnect()
}

/// Apply a batch of commands; false once shutdown is requested
fn apply<B: Board>(engine: &mut Engine<B>, batch: impl Iterator<Item = Command>) -> bool {
    for command in batch {
        if command == Command::Shutdown {
            return false;
        }
        debug!("Command: {:?}", command);
        if let Err(e) = engine.execute(command) {
            warn!("Command failed: {}", e);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::mock::{MockBoard, RecordingSink};
    use meridian_core::traits::{Reading, Status};

    #[test]
    fn test_commands_run_on_poll_thread() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (ports, handles) = MockBoard::ports(false);
        let (recording, sink) = RecordingSink::shared();
        let mut config = AppConfig::default();
        config.timing.tick_ms = 10;
        let epoch = Instant::now();
        let engine = Engine::connect(ports, &config, sink, 4, 0).unwrap();

        let poll = PollLoop::spawn(engine, epoch).unwrap();
        poll.send(Command::MoveAbsolute(20)).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(poll.is_running());
        poll.shutdown().unwrap();

        assert_eq!(recording.positions().last(), Some(&(20, Status::Idle)));
        assert_eq!(*handles.store.saved.lock(), Some(Resolution::Full.to_canonical(20)));
        // Driver asleep after disconnect
        assert_eq!(handles.lines.lock().level("reset"), Some(false));
    }

    #[test]
    fn test_failed_command_keeps_loop_running() {
        let (ports, _handles) = MockBoard::ports(false);
        let (recording, sink) = RecordingSink::shared();
        let engine = Engine::connect(ports, &AppConfig::default(), sink, 4, 0).unwrap();
        let poll = PollLoop::spawn(engine, Instant::now()).unwrap();

        poll.send(Command::MoveAbsolute(50_000)).unwrap();
        poll.send(Command::Sync(7)).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(poll.is_running());
        poll.shutdown().unwrap();

        let positions = recording.positions();
        assert!(positions.contains(&(0, Status::Alert)));
        assert_eq!(positions.last(), Some(&(7, Status::Ok)));
    }

    #[test]
    fn test_command_backlog_does_not_starve_ticks() {
        let (ports, _handles) = MockBoard::ports(false);
        let (recording, sink) = RecordingSink::shared();
        let engine = Engine::connect(ports, &AppConfig::default(), sink, 4, 0).unwrap();

        let (sender, receiver) = unbounded();
        for _ in 0..1_000 {
            sender.send(Command::SetBacklash(1)).unwrap();
        }
        sender.send(Command::Shutdown).unwrap();
        drop(sender);

        run(engine, receiver, Instant::now()).unwrap();

        // Power monitor is polled on every tick; absent here, so it alerts
        assert!(matches!(
            recording.last("power"),
            Some((Reading::Power(_), Status::Alert))
        ));
    }
}
