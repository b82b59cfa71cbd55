//! Cooperative poll scheduling
//!
//! The scheduler never sleeps: the caller passes the current monotonic
//! time in and gets back the tasks that are due.

mod deadline;

pub use deadline::{DueTasks, PollScheduler, Task, TASK_COUNT};
