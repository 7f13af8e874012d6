//! Scoped autoplay timer.
//!
//! An [`AutoplayTimer`] owns a tokio task that calls its callback once per
//! period, first after one full period. Dropping the timer aborts the task,
//! so a carousel can never leak a running timer.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[derive(Debug)]
pub struct AutoplayTimer {
    handle: JoinHandle<()>,
}

impl AutoplayTimer {
    /// Start calling `on_tick` every `period`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                on_tick();
            }
        });
        tracing::trace!(?period, "autoplay timer armed");
        Self { handle }
    }

    /// Stop the timer. Equivalent to dropping it.
    pub fn cancel(self) {}
}

impl Drop for AutoplayTimer {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::trace!("autoplay timer released");
    }
}
