//! Focuser motion controller
//!
//! Owns the [`FocuserState`] and at most one step worker. Every operation
//! that reads or rewrites the position first cancels and joins the
//! running worker, so the state is authoritative whenever this type
//! touches it.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};
use parking_lot::Mutex;

use meridian_core::motion::{Direction, FocuserState, MotionState, MovePlan, Resolution};
use meridian_core::traits::{Reading, Status};
use meridian_drivers::stepper::{ModeLines, StepLines};
use meridian_hal::PositionStore;

use crate::board::{Board, BoardCurrent, SharedSink};
use crate::error::{Error, Result};
use crate::tasks::step_worker::{MotionShared, StepHardware, StepJob};

/// Motion controller for one focuser
pub struct MotionController<B: Board> {
    state: FocuserState,
    mode: ModeLines<B::Pin>,
    /// Step hardware while no worker holds it
    idle: Option<StepHardware<B>>,
    worker: Option<JoinHandle<StepHardware<B>>>,
    shared: Arc<MotionShared>,
    current: Arc<Mutex<BoardCurrent<B>>>,
    store: Arc<Mutex<B::Store>>,
    sink: SharedSink,
}

impl<B: Board> MotionController<B> {
    pub fn new(
        state: FocuserState,
        lines: StepLines<B::Pin>,
        mode: ModeLines<B::Pin>,
        delay: B::Delay,
        current: Arc<Mutex<BoardCurrent<B>>>,
        store: B::Store,
        sink: SharedSink,
    ) -> Self {
        Self {
            state,
            mode,
            idle: Some(StepHardware { lines, delay }),
            worker: None,
            shared: Arc::new(MotionShared::default()),
            current,
            store: Arc::new(Mutex::new(store)),
            sink,
        }
    }

    /// Load the persisted position and drive the mode lines
    ///
    /// A missing or unreadable position starts the focuser at 0.
    pub fn restore(&mut self) -> Result<()> {
        let loaded = self.store.lock().load();
        match loaded {
            Ok(canonical) => self.state.restore_canonical(canonical),
            Err(e) => {
                warn!("No stored focuser position ({:?}), starting at 0", e);
                self.state.set_position(0);
            }
        }
        self.mode.wake()?;
        self.mode.apply(self.state.resolution())?;
        info!(
            "Focuser at {} ({}x microstepping)",
            self.state.position(),
            self.state.resolution().divisor()
        );
        self.sink
            .publish(Reading::FocuserPosition(self.state.position()), Status::Ok);
        Ok(())
    }

    /// Focuser state as of the last joined move
    pub fn state(&self) -> &FocuserState {
        &self.state
    }

    /// Current position, live while a move runs
    pub fn position(&self) -> i32 {
        if self.worker.is_some() {
            self.shared.position.load(Ordering::Acquire)
        } else {
            self.state.position()
        }
    }

    pub fn motion_state(&self) -> MotionState {
        match &self.worker {
            Some(handle) if !handle.is_finished() => {
                if self.shared.abort.load(Ordering::Acquire) {
                    MotionState::Aborting
                } else {
                    MotionState::Moving
                }
            }
            _ => MotionState::Idle,
        }
    }

    /// Whether a worker is still stepping
    pub fn is_moving(&self) -> bool {
        self.motion_state() != MotionState::Idle
    }

    /// Latest focuser temperature
    pub fn temperature(&self) -> Option<f64> {
        *self.shared.temperature.lock()
    }

    /// Temperature at the end of the last move
    pub fn baseline(&self) -> Option<f64> {
        *self.shared.baseline.lock()
    }

    /// Record the focuser temperature, `None` when no sensor answered
    ///
    /// The first real reading seeds the compensation baseline when no move
    /// has set one yet. A lost sensor leaves an existing baseline alone.
    pub fn set_temperature(&self, temperature: Option<f64>) {
        *self.shared.temperature.lock() = temperature;
        let mut baseline = self.shared.baseline.lock();
        if baseline.is_none() && temperature.is_some() {
            *baseline = temperature;
        }
    }

    /// Move to an absolute position
    pub fn move_absolute(&mut self, target: i32) -> Result<()> {
        let range = self.state.absolute();
        if !range.contains(target) {
            warn!(
                "Rejected move to {}: outside [{}, {}]",
                target, range.min, range.max
            );
            self.sink
                .publish(Reading::FocuserPosition(self.position()), Status::Alert);
            return Err(Error::OutOfRange {
                target,
                min: range.min,
                max: range.max,
            });
        }

        self.cancel()?;
        match self.state.plan_absolute(target)? {
            Some(plan) => self.start(plan),
            None => {
                self.sink
                    .publish(Reading::FocuserPosition(target), Status::Ok);
                Ok(())
            }
        }
    }

    /// Move relative to the current position
    pub fn move_relative(&mut self, direction: Direction, ticks: u32) -> Result<()> {
        self.cancel()?;
        let target = self.state.position() as i64 + direction.sign() as i64 * ticks as i64;
        let target = target.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        self.move_absolute(target)
    }

    /// Stop the running move where it is
    pub fn abort(&mut self) -> Result<()> {
        if self.worker.is_some() {
            info!("Aborting focuser move at {}", self.position());
        }
        self.cancel()
    }

    /// Declare the current position to be `ticks` without moving
    pub fn sync(&mut self, ticks: i32) -> Result<()> {
        self.cancel()?;
        self.state.set_position(ticks);
        self.persist();
        info!("Focuser synced to {}", ticks);
        self.sink
            .publish(Reading::FocuserPosition(ticks), Status::Ok);
        Ok(())
    }

    /// Change microstep resolution
    ///
    /// Going coarser, the focuser first moves to the nearest step of the
    /// new resolution and that move completes before the lines switch.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.cancel()?;
        let old = self.state.resolution();
        let adjustment = self.state.resolution_adjustment(resolution);
        if adjustment != 0 {
            let target = self.state.position() + adjustment;
            match self.move_absolute(target) {
                Ok(()) => self.join()?,
                Err(e) => warn!("Resolution alignment move to {} failed: {}", target, e),
            }
        }

        self.state.apply_resolution(resolution);
        self.mode.apply(resolution)?;
        info!(
            "Resolution {}x -> {}x, position {}",
            old.divisor(),
            resolution.divisor(),
            self.state.position()
        );
        self.sink
            .publish(Reading::FocuserPosition(self.state.position()), Status::Ok);
        Ok(())
    }

    pub fn set_backlash(&mut self, steps: u32) {
        self.state.set_backlash(steps);
        info!("Backlash set to {} steps", steps);
    }

    pub fn set_max_position(&mut self, ticks: i32) {
        self.state.set_max_position(ticks);
        info!("Max position set to {}", ticks);
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.state.set_reverse(reverse);
        info!("Reverse direction {}", if reverse { "on" } else { "off" });
    }

    pub fn set_step_delay_us(&mut self, delay_us: u32) {
        self.state.set_step_delay_us(delay_us);
        info!("Step delay set to {} us", delay_us);
    }

    /// Join the worker if it has finished on its own
    pub fn reap(&mut self) -> Result<()> {
        if self.worker.as_ref().is_some_and(|handle| handle.is_finished()) {
            self.join()?;
        }
        Ok(())
    }

    /// Block until the running move completes
    pub fn wait(&mut self) -> Result<()> {
        self.join()
    }

    /// Abort any move and put the driver to sleep
    pub fn shutdown(&mut self) -> Result<()> {
        self.cancel()?;
        self.current.lock().disable()?;
        self.mode.sleep()?;
        Ok(())
    }

    fn start(&mut self, plan: MovePlan) -> Result<()> {
        let hardware = self.idle.take().ok_or(Error::StepLinesUnavailable)?;
        if let Err(e) = self.current.lock().drive() {
            self.idle = Some(hardware);
            return Err(e.into());
        }

        info!("Moving focuser {} -> {}", plan.start, plan.target);
        self.shared.abort.store(false, Ordering::Release);
        self.shared.position.store(plan.start, Ordering::Release);
        self.sink
            .publish(Reading::FocuserPosition(plan.start), Status::Busy);

        let job = StepJob::<B> {
            hardware,
            plan,
            reverse: self.state.reverse(),
            step_delay_us: self.state.step_delay_us(),
            resolution: self.state.resolution(),
            shared: Arc::clone(&self.shared),
            current: Arc::clone(&self.current),
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        };
        let handle = thread::Builder::new()
            .name("step-worker".into())
            .spawn(move || job.run())?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Raise the abort flag and join
    fn cancel(&mut self) -> Result<()> {
        if self.worker.is_some() {
            self.shared.abort.store(true, Ordering::Release);
            self.join()?;
        }
        Ok(())
    }

    fn join(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        let joined = handle.join();
        self.state
            .set_position(self.shared.position.load(Ordering::Acquire));
        match joined {
            Ok(hardware) => {
                self.idle = Some(hardware);
                Ok(())
            }
            Err(_) => {
                error!("Step worker panicked; step lines lost");
                Err(Error::WorkerPanicked)
            }
        }
    }

    fn persist(&self) {
        let canonical = self.state.canonical_position();
        if let Err(e) = self.store.lock().save(canonical) {
            warn!("Failed to persist focuser position: {:?}", e);
        }
    }
}

impl<B: Board> Drop for MotionController<B> {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            error!("Failed to stop step worker: {}", e);
        }
    }
}
