//! Cyclic step counter for progress animations.
//!
//! The ticker owns its interval task and shares nothing with calculator
//! state; dropping it stops the task.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Advances `step = (step + 1) % steps` once per `period`.
pub struct StepTicker {
    step: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl StepTicker {
    /// Starts ticking on the current tokio runtime. A `steps` of zero is
    /// treated as one.
    pub fn new(
        steps: usize,
        period: Duration,
    ) -> Self {
        let steps = steps.max(1);
        let (tx, step) = watch::channel(0);

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tx.send_modify(|step| *step = (*step + 1) % steps);
            }
        });

        Self { step, task }
    }

    pub fn step(&self) -> usize {
        *self.step.borrow()
    }

    /// Receiver notified on every step.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.step.clone()
    }
}

impl Drop for StepTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
