//! Once-per-second countdown to a lesson release.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use lesson_core::countdown::Countdown;

use crate::Clock;

/// Spawns countdown tasks that publish the remaining time on a watch channel.
///
/// The wall-clock reading is taken once at [`CountdownTicker::start`]; later
/// ticks add the elapsed monotonic time, so a fixed clock still counts down.
#[derive(Debug, Clone, Copy)]
pub struct CountdownTicker {
    clock: Clock,
    period: Duration,
}

impl CountdownTicker {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            period: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start counting down to `target`. Must be called inside a tokio runtime.
    ///
    /// The task stops once the countdown reaches zero, when every receiver is
    /// gone, or when the returned handle is cancelled or dropped.
    #[must_use]
    pub fn start(&self, target: DateTime<Utc>) -> CountdownHandle {
        let started_at = self.clock.now();
        let started = Instant::now();
        let initial = Countdown::between(started_at, target);
        let (tx, rx) = watch::channel(initial);
        let period = self.period;

        let task = tokio::spawn(async move {
            if initial.is_finished() {
                return;
            }
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let elapsed = chrono::Duration::from_std(started.elapsed())
                    .unwrap_or(chrono::Duration::zero());
                let remaining = Countdown::between(started_at + elapsed, target);
                if tx.send(remaining).is_err() {
                    tracing::debug!("countdown receiver dropped, stopping");
                    break;
                }
                if remaining.is_finished() {
                    tracing::debug!(%target, "countdown reached release");
                    break;
                }
            }
        });

        CountdownHandle { rx, task }
    }
}

/// Receiving end of a running countdown. Dropping it stops the task.
#[derive(Debug)]
pub struct CountdownHandle {
    rx: watch::Receiver<Countdown>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Latest published value.
    #[must_use]
    pub fn current(&self) -> Countdown {
        *self.rx.borrow()
    }

    /// Wait for the next tick. Returns `None` once the task has stopped.
    pub async fn changed(&mut self) -> Option<Countdown> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
