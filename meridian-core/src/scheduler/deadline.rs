//! Per-task deadlines

use heapless::Vec;

use crate::config::PollTiming;

/// Number of independent polling tasks
pub const TASK_COUNT: usize = 6;

/// Tasks due on one tick, in dispatch order
pub type DueTasks = Vec<Task, TASK_COUNT>;

/// Independent polling tasks, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Task {
    /// Sky quality sensor state machine
    Light,
    /// Temperature/humidity and IR sensors, legacy sky quality sensor
    Environment,
    /// Temperature compensation
    Compensation,
    /// CPU temperature
    System,
    /// Fan duty
    Fan,
    /// Power monitor round-robin
    Power,
}

impl Task {
    const ALL: [Task; TASK_COUNT] = [
        Task::Light,
        Task::Environment,
        Task::Compensation,
        Task::System,
        Task::Fan,
        Task::Power,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn period_ms(self, timing: &PollTiming) -> u64 {
        let period = match self {
            Task::Light | Task::Power => timing.tick_ms,
            Task::Environment => timing.environment_ms,
            Task::Compensation => timing.compensation_ms,
            Task::System => timing.system_ms,
            Task::Fan => timing.fan_ms,
        };
        period.max(1) as u64
    }

    fn first_delay_ms(self, timing: &PollTiming) -> u64 {
        match self {
            Task::Light | Task::Power => 0,
            Task::Fan => timing.fan_initial_delay_ms as u64,
            other => other.period_ms(timing),
        }
    }
}

/// Deadline table for the polling tasks
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollScheduler {
    timing: PollTiming,
    deadlines: [u64; TASK_COUNT],
}

impl PollScheduler {
    /// Arm every task relative to `now_ms`
    pub fn new(timing: PollTiming, now_ms: u64) -> Self {
        let mut deadlines = [0; TASK_COUNT];
        for task in Task::ALL {
            deadlines[task.index()] = now_ms + task.first_delay_ms(&timing);
        }
        Self { timing, deadlines }
    }

    pub fn timing(&self) -> &PollTiming {
        &self.timing
    }

    /// Next time `task` will be due
    pub fn deadline(&self, task: Task) -> u64 {
        self.deadlines[task.index()]
    }

    /// Collect the tasks whose deadline has passed and re-arm them
    ///
    /// Each deadline advances by its period. After a stall the missed
    /// periods are skipped rather than replayed.
    pub fn due(&mut self, now_ms: u64) -> DueTasks {
        let mut due = Vec::new();
        for task in Task::ALL {
            let deadline = &mut self.deadlines[task.index()];
            if now_ms < *deadline {
                continue;
            }
            let period = task.period_ms(&self.timing);
            *deadline += period;
            if *deadline <= now_ms {
                *deadline = now_ms + period;
            }
            // Capacity equals the task count
            let _ = due.push(task);
        }
        due
    }
}
