//! Step pulse worker
//!
//! One worker thread runs per move. It owns the step and direction lines
//! while it runs and hands them back through its join handle. The only
//! thing it shares with the polling thread is [`MotionShared`] plus the
//! current driver, store and sink, each behind its own lock.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use parking_lot::Mutex;

use meridian_core::motion::{MovePlan, Resolution, StepKind, StepTracker};
use meridian_core::traits::{Reading, Status};
use meridian_drivers::stepper::StepLines;
use meridian_hal::{DelayUs, PositionStore};

use crate::board::{Board, BoardCurrent, SharedSink};

/// State visible to both the polling thread and the worker
#[derive(Debug, Default)]
pub struct MotionShared {
    /// Set to stop the worker after its current pulse
    pub abort: AtomicBool,
    /// Live position while a worker runs
    pub position: AtomicI32,
    /// Latest focuser temperature, if any sensor provides one
    pub temperature: Mutex<Option<f64>>,
    /// Temperature when the last move ended
    pub baseline: Mutex<Option<f64>>,
}

/// Lines and delay the worker needs for pulse generation
pub struct StepHardware<B: Board> {
    pub lines: StepLines<B::Pin>,
    pub delay: B::Delay,
}

/// Everything one move needs, moved into the worker thread
pub struct StepJob<B: Board> {
    pub hardware: StepHardware<B>,
    pub plan: MovePlan,
    pub reverse: bool,
    pub step_delay_us: u32,
    pub resolution: Resolution,
    pub shared: Arc<MotionShared>,
    pub current: Arc<Mutex<BoardCurrent<B>>>,
    pub store: Arc<Mutex<B::Store>>,
    pub sink: SharedSink,
}

impl<B: Board> StepJob<B> {
    /// Step until the target is reached or the abort flag is raised
    pub fn run(self) -> StepHardware<B> {
        let StepJob {
            mut hardware,
            plan,
            reverse,
            step_delay_us,
            resolution,
            shared,
            current,
            store,
            sink,
        } = self;

        debug!(
            "Step worker: {} -> {} ({:?}, backlash {})",
            plan.start, plan.target, plan.direction, plan.backlash
        );

        let mut tracker = StepTracker::new(&plan);
        while !tracker.is_done() && !shared.abort.load(Ordering::Acquire) {
            if let Err(e) = hardware
                .lines
                .pulse(plan.direction, reverse, &mut hardware.delay)
            {
                error!("Step pulse failed: {:?}", e);
                break;
            }
            if let StepKind::Advance(position) = tracker.pulse() {
                shared.position.store(position, Ordering::Release);
                if tracker.progress_due() {
                    sink.publish(Reading::FocuserPosition(position), Status::Busy);
                }
            }
            hardware.delay.delay_us(step_delay_us);
        }

        let position = tracker.position();
        sink.publish(Reading::FocuserPosition(position), Status::Idle);

        if let Err(e) = store.lock().save(resolution.to_canonical(position)) {
            warn!("Failed to persist focuser position {}: {:?}", position, e);
        }

        // Unavailable reads as 0 °C
        let temperature = shared.temperature.lock().unwrap_or(0.0);
        *shared.baseline.lock() = Some(temperature);

        if let Err(e) = current.lock().hold() {
            warn!("Failed to restore hold current: {:?}", e);
        }

        debug!(
            "Step worker done at {} after {} steps",
            position,
            tracker.real_steps()
        );
        hardware
    }
}
