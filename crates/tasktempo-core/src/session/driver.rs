//! Async pump around a [`FocusCoordinator`].
//!
//! Two tickers feed one channel: a countdown ticker that exists only
//! while a timer is running, and an alert ticker that runs for as long as
//! the session is open. The owner drains the channel and hands every
//! tick back to [`SessionDriver::handle_tick`], so all state mutation
//! stays on one task.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::coordinator::FocusCoordinator;
use crate::events::Event;
use crate::storage::SettingsSource;
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverTick {
    Countdown,
    Alerts,
}

pub struct SessionDriver {
    coordinator: FocusCoordinator,
    countdown_period: Duration,
    alert_period: Duration,
    countdown: Option<Ticker>,
    alerts: Option<Ticker>,
    ticks: UnboundedSender<DriverTick>,
}

impl SessionDriver {
    pub fn new(
        coordinator: FocusCoordinator,
        countdown_period: Duration,
        alert_period: Duration,
    ) -> (Self, UnboundedReceiver<DriverTick>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let driver = Self {
            coordinator,
            countdown_period,
            alert_period,
            countdown: None,
            alerts: None,
            ticks,
        };
        (driver, rx)
    }

    /// Periods come from `timer.tick_interval_ms` and
    /// `alerts.evaluation_interval_secs`.
    pub fn from_settings(
        coordinator: FocusCoordinator,
        settings: &dyn SettingsSource,
    ) -> (Self, UnboundedReceiver<DriverTick>) {
        let countdown = Duration::from_millis(settings.timer().tick_interval_ms.max(1));
        let alerts = Duration::from_secs(settings.alerts().evaluation_interval_secs.max(1));
        Self::new(coordinator, countdown, alerts)
    }

    pub fn coordinator(&self) -> &FocusCoordinator {
        &self.coordinator
    }

    pub fn is_countdown_ticking(&self) -> bool {
        self.countdown.as_ref().is_some_and(Ticker::is_active)
    }

    pub fn is_open(&self) -> bool {
        self.alerts.as_ref().is_some_and(Ticker::is_active)
    }

    /// Start the periodic alert ticker. Must be called inside a tokio
    /// runtime.
    pub fn open(&mut self) {
        if self.alerts.is_none() {
            let tx = self.ticks.clone();
            self.alerts = Some(Ticker::start(self.alert_period, move || {
                let _ = tx.send(DriverTick::Alerts);
            }));
        }
        self.sync_tickers();
    }

    /// Run a command against the coordinator, then start or stop the
    /// countdown ticker to match the new timer states.
    pub fn run<R>(&mut self, command: impl FnOnce(&mut FocusCoordinator) -> R) -> R {
        let result = command(&mut self.coordinator);
        self.sync_tickers();
        result
    }

    pub fn handle_tick(&mut self, tick: DriverTick) -> Vec<Event> {
        let mut events = self.coordinator.sync_tasks();
        match tick {
            // A countdown tick queued before the ticker was cancelled is a
            // no-op: the coordinator only ticks running timers.
            DriverTick::Countdown => events.extend(self.coordinator.tick_countdown()),
            DriverTick::Alerts => events.extend(self.coordinator.tick_alerts()),
        }
        self.sync_tickers();
        events
    }

    pub fn shutdown(&mut self) {
        self.countdown = None;
        self.alerts = None;
        debug!("session driver shut down");
    }

    fn sync_tickers(&mut self) {
        let running =
            self.coordinator.is_focus_running(None) || self.coordinator.is_break_running(None);
        match (running, self.countdown.is_some()) {
            (true, false) => {
                let tx = self.ticks.clone();
                self.countdown = Some(Ticker::start(self.countdown_period, move || {
                    let _ = tx.send(DriverTick::Countdown);
                }));
                debug!("countdown ticker started");
            }
            (false, true) => {
                self.countdown = None;
                debug!("countdown ticker stopped");
            }
            _ => {}
        }
    }
}
