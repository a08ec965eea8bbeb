//! Cancellable single-shot timers driven by an explicit clock.
//!
//! Nothing here spawns threads: the owner calls [`TimerSlot::take_due`]
//! from its event loop with the current `Instant`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Shared cancel flag for one scheduled task.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    deadline: Instant,
    payload: T,
    handle: TaskHandle,
}

/// Holds at most one outstanding task. Scheduling cancels the previous one.
#[derive(Debug)]
pub struct TimerSlot<T> {
    pending: Option<Scheduled<T>>,
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> TimerSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TaskHandle {
        self.cancel();
        let handle = TaskHandle::default();
        self.pending = Some(Scheduled {
            deadline: now + delay,
            payload,
            handle: handle.clone(),
        });
        handle
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.handle.cancel();
        }
    }

    /// Deadline of the live task, if one is outstanding.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .filter(|t| !t.handle.is_cancelled())
            .map(|t| t.deadline)
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline().is_some()
    }

    /// Remove and return the payload once its deadline has passed.
    /// A task cancelled through its handle is dropped silently.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        let task = self.pending.as_ref()?;
        if task.handle.is_cancelled() {
            self.pending = None;
            return None;
        }
        if now < task.deadline {
            return None;
        }
        self.pending.take().map(|t| t.payload)
    }
}

impl<T> Drop for TimerSlot<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
