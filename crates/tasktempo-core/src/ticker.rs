//! Cancelable periodic callback source.
//!
//! A [`Ticker`] owns a tokio task that fires a callback once per period.
//! Missed periods (process suspended, runtime starved) are skipped rather
//! than replayed in a burst, so a resumed countdown does not fast-forward.
//! Dropping the ticker cancels it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a ticker on the current tokio runtime.
    ///
    /// The first callback fires one full `period` after the call. Panics if
    /// called outside a runtime, like `tokio::spawn`.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                on_tick();
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let _ticker = Ticker::start(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_callbacks() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let mut ticker = Ticker::start(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(1500)).await;
        ticker.cancel();
        assert!(!ticker.is_active());
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
