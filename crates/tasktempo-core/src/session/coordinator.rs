//! The one owner of all session state.
//!
//! `FocusCoordinator` wires the focus and break timers, the completion
//! detector, the alert monitor and the task sync guard to the task and
//! settings collaborators. UI handlers call into it; it answers with the
//! events that resulted. Completion decisions are additionally published
//! on a channel with a single consumer.
//!
//! Task writes go through the collaborator synchronously but never gate
//! a local transition: a failed write is logged, reported as
//! `TaskWriteFailed`, and the timer change happens anyway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::completion::{Completion, SessionCompletionDetector};
use super::decision::{BreakChoice, DecisionChoice, DecisionRequest, FocusChoice};
use crate::alerts::{AlertKind, AlertMonitor, AlertThresholds};
use crate::clock::Clock;
use crate::error::{DecisionError, Result};
use crate::events::{Event, Snapshot};
use crate::storage::SettingsSource;
use crate::task::{TaskId, TaskStatus, TaskStore};
use crate::timer::{BreakTimerEngine, FocusTimerEngine, TimerKind, TimerTaskSyncGuard};

/// A visible alert, with the task it concerns when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBanner {
    pub alert: AlertKind,
    pub task_id: Option<TaskId>,
    pub task_title: Option<String>,
}

pub struct FocusCoordinator {
    focus: FocusTimerEngine,
    rest: BreakTimerEngine,
    alerts: AlertMonitor,
    detector: SessionCompletionDetector,
    guard: TimerTaskSyncGuard,
    tasks: Arc<dyn TaskStore>,
    settings: Arc<dyn SettingsSource>,
    clock: Arc<dyn Clock>,
    decisions: UnboundedSender<DecisionRequest>,
    pending_focus: Option<DecisionRequest>,
    pending_break: Option<DecisionRequest>,
}

impl FocusCoordinator {
    /// Build the coordinator. The returned receiver is the only consumer
    /// of completion decisions.
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        settings: Arc<dyn SettingsSource>,
        clock: Arc<dyn Clock>,
    ) -> (Self, UnboundedReceiver<DecisionRequest>) {
        let (decisions, rx) = mpsc::unbounded_channel();
        let focus = FocusTimerEngine::new(settings.clone(), clock.clone());
        let rest = BreakTimerEngine::new(settings.clone(), clock.clone());

        let mut detector = SessionCompletionDetector::new();
        detector.observe_focus(focus.state());
        detector.observe_break(rest.state());

        let coordinator = Self {
            focus,
            rest,
            alerts: AlertMonitor::new(AlertThresholds::from_config(&settings.alerts())),
            detector,
            guard: TimerTaskSyncGuard::subscribe(tasks.as_ref()),
            tasks,
            settings,
            clock,
            decisions,
            pending_focus: None,
            pending_break: None,
        };
        (coordinator, rx)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn focus(&self) -> &FocusTimerEngine {
        &self.focus
    }

    pub fn break_timer(&self) -> &BreakTimerEngine {
        &self.rest
    }

    pub fn alerts(&self) -> &AlertMonitor {
        &self.alerts
    }

    pub fn tasks(&self) -> &Arc<dyn TaskStore> {
        &self.tasks
    }

    pub fn is_focus_active(&self, task_id: Option<&str>) -> bool {
        self.focus.is_active(task_id)
    }

    pub fn is_focus_running(&self, task_id: Option<&str>) -> bool {
        self.focus.is_running(task_id)
    }

    pub fn focus_remaining(&self) -> u64 {
        self.focus.remaining_time()
    }

    pub fn is_break_active(&self, task_id: Option<&str>) -> bool {
        self.rest.is_active(task_id)
    }

    pub fn is_break_running(&self, task_id: Option<&str>) -> bool {
        self.rest.is_running(task_id)
    }

    pub fn break_remaining(&self) -> u64 {
        self.rest.remaining_time()
    }

    pub fn is_excessive_time_alert_visible(&self) -> bool {
        self.alerts.is_excessive_time_alert_visible()
    }

    pub fn is_missing_break_alert_visible(&self) -> bool {
        self.alerts.is_missing_break_alert_visible()
    }

    pub fn is_prolonged_navigation_alert_visible(&self) -> bool {
        self.alerts.is_prolonged_navigation_alert_visible()
    }

    pub fn pending_focus_decision(&self) -> Option<&DecisionRequest> {
        self.pending_focus.as_ref()
    }

    pub fn pending_break_decision(&self) -> Option<&DecisionRequest> {
        self.pending_break.as_ref()
    }

    pub fn alert_banners(&self) -> Vec<AlertBanner> {
        let visibility = self.alerts.visibility();
        AlertKind::ALL
            .into_iter()
            .filter(|kind| visibility.get(*kind))
            .map(|alert| {
                let task_id = match alert {
                    AlertKind::ExcessiveTime => self
                        .alerts
                        .excessive_time()
                        .tracked_task_id()
                        .map(str::to_string),
                    _ => None,
                };
                let task_title = task_id
                    .as_deref()
                    .and_then(|id| self.tasks.get_task(id))
                    .map(|task| task.title);
                AlertBanner {
                    alert,
                    task_id,
                    task_title,
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            focus: self.focus.state().clone(),
            break_timer: self.rest.state().clone(),
            alerts: self.alerts.visibility(),
            pending_focus_decision: self.pending_focus.clone(),
            pending_break_decision: self.pending_break.clone(),
            at: self.now(),
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start focusing on `task_id`. Ends any break, hands the "in progress"
    /// status over from the previously focused task, and counts as a user
    /// action.
    pub fn start_focus(&mut self, task_id: &str) -> Vec<Event> {
        let now = self.now();
        let mut events = Vec::new();

        events.extend(self.rest.stop_break());

        let replaced = self
            .focus
            .active_task_id()
            .filter(|previous| *previous != task_id)
            .map(str::to_string);
        if let Some(previous) = replaced {
            if self.tasks.get_task(&previous).is_some_and(|t| t.is_in_progress()) {
                self.write_status(&previous, TaskStatus::Todo, now, &mut events);
            }
        }
        self.write_status(task_id, TaskStatus::InProgress, now, &mut events);
        if self.tasks.has_other_task_in_progress(task_id) {
            warn!(task_id, "other tasks are still marked in progress");
        }

        events.extend(self.alerts.record_user_action(now));
        events.extend(self.focus.start_timer(task_id));
        self.after_change(&mut events);
        events
    }

    pub fn stop_focus(&mut self) -> Vec<Event> {
        let mut events: Vec<Event> = self.focus.stop_timer().into_iter().collect();
        self.after_change(&mut events);
        events
    }

    pub fn start_break(&mut self, task_id: Option<&str>) -> Vec<Event> {
        let mut events: Vec<Event> = self.rest.start_break(task_id).into_iter().collect();
        self.after_change(&mut events);
        events
    }

    pub fn stop_break(&mut self) -> Vec<Event> {
        let mut events: Vec<Event> = self.rest.stop_break().into_iter().collect();
        self.after_change(&mut events);
        events
    }

    /// Mark a subtask done. Counts as a user action and may unlock the
    /// finish option of a pending focus decision.
    pub fn complete_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<Vec<Event>> {
        self.tasks.set_subtask_completed(task_id, subtask_id, true)?;
        let now = self.now();
        let mut events = self.alerts.record_user_action(now);

        let reoffer = self
            .pending_focus
            .as_ref()
            .filter(|request| request.task_id() == Some(task_id))
            .is_some_and(|request| !request.offers(FocusChoice::FinishTask.into()));
        if reoffer && self.can_finish(task_id) {
            debug!(task_id, "subtasks complete, offering finish");
            self.publish(DecisionRequest::focus_complete(task_id, true), now, &mut events);
        }
        Ok(events)
    }

    /// One second of countdown for whichever timers are running.
    pub fn tick_countdown(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.focus.is_running(None) {
            events.extend(self.focus.tick());
        }
        if self.rest.is_running(None) {
            events.extend(self.rest.tick());
        }
        if !events.is_empty() {
            self.after_change(&mut events);
        }
        events
    }

    /// Periodic alert re-evaluation and dismissal expiry.
    pub fn tick_alerts(&mut self) -> Vec<Event> {
        self.evaluate_alerts()
    }

    /// Drain task-collection changes and stop timers whose task went away
    /// or left the "in progress" state.
    pub fn sync_tasks(&mut self) -> Vec<Event> {
        let now = self.now();
        let mut events = self
            .guard
            .poll(self.tasks.as_ref(), &mut self.focus, &mut self.rest, now);
        if !events.is_empty() {
            self.after_change(&mut events);
        }
        events
    }

    // ── Alerts ───────────────────────────────────────────────────────

    pub fn dismiss(&mut self, alert: AlertKind) -> Vec<Event> {
        let now = self.now();
        self.alerts.dismiss(alert, now)
    }

    pub fn dismiss_excessive_time_alert(&mut self) -> Vec<Event> {
        self.dismiss(AlertKind::ExcessiveTime)
    }

    pub fn dismiss_missing_break_alert(&mut self) -> Vec<Event> {
        self.dismiss(AlertKind::MissingBreak)
    }

    pub fn dismiss_prolonged_navigation_alert(&mut self) -> Vec<Event> {
        self.dismiss(AlertKind::ProlongedNavigation)
    }

    pub fn record_focus_session_complete(&mut self) -> Vec<Event> {
        let now = self.now();
        self.alerts.record_focus_session_complete(now)
    }

    pub fn record_break_complete(&mut self) -> Vec<Event> {
        let now = self.now();
        self.alerts.record_break_complete(now)
    }

    pub fn record_task_finished(&mut self) -> Vec<Event> {
        let now = self.now();
        self.alerts.record_task_finished(now)
    }

    pub fn record_user_action(&mut self) -> Vec<Event> {
        let now = self.now();
        self.alerts.record_user_action(now)
    }

    // ── Decisions ────────────────────────────────────────────────────

    pub fn resolve_focus(&mut self, choice: FocusChoice) -> Result<Vec<Event>> {
        let request = self
            .pending_focus
            .as_ref()
            .ok_or(DecisionError::NoPendingDecision)?;
        if !request.offers(choice.into()) {
            return Err(DecisionError::OptionUnavailable(choice.into()).into());
        }
        let task_id = request.task_id().unwrap_or_default().to_string();
        self.pending_focus = None;

        let now = self.now();
        info!(%task_id, choice = %DecisionChoice::from(choice), "focus decision resolved");
        let mut events = vec![Event::DecisionResolved {
            choice: choice.into(),
            task_id: Some(task_id.clone()),
            at: now,
        }];

        match choice {
            FocusChoice::StartBreak => {
                events.extend(self.focus.stop_timer());
                events.extend(self.rest.start_break(Some(&task_id)));
            }
            FocusChoice::ContinueFocus => {
                events.extend(self.focus.start_timer(&task_id));
                events.extend(self.alerts.record_focus_session_complete(now));
                events.extend(self.alerts.record_user_action(now));
            }
            FocusChoice::FinishTask => {
                self.write_status(&task_id, TaskStatus::Done, now, &mut events);
                events.extend(self.focus.stop_timer());
                events.extend(self.alerts.record_task_finished(now));
            }
        }

        self.after_change(&mut events);
        Ok(events)
    }

    pub fn resolve_break(&mut self, choice: BreakChoice) -> Result<Vec<Event>> {
        let request = self
            .pending_break
            .take()
            .ok_or(DecisionError::NoPendingDecision)?;
        let task_id = request.task_id().map(str::to_string);

        let now = self.now();
        info!(task_id = task_id.as_deref(), choice = %DecisionChoice::from(choice), "break decision resolved");
        let mut events = vec![Event::DecisionResolved {
            choice: choice.into(),
            task_id: task_id.clone(),
            at: now,
        }];

        match choice {
            BreakChoice::StartFocus => {
                events.extend(self.rest.stop_break());
                match task_id.as_deref() {
                    Some(id) => events.extend(self.start_focus(id)),
                    None => events.extend(self.alerts.record_user_action(now)),
                }
                events.extend(self.alerts.record_break_complete(now));
            }
            BreakChoice::EndSession => {
                if let Some(id) = task_id.as_deref() {
                    self.write_status(id, TaskStatus::Todo, now, &mut events);
                }
                events.extend(self.rest.stop_break());
                events.extend(self.focus.stop_timer());
                events.extend(self.alerts.record_task_finished(now));
            }
        }

        self.after_change(&mut events);
        Ok(events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Run after every state change: feed the completion detector, drop
    /// decisions that no longer apply, and re-evaluate alerts.
    fn after_change(&mut self, events: &mut Vec<Event>) {
        let now = self.now();

        if let Some(completion) = self.detector.observe_focus(self.focus.state()) {
            self.raise(completion, now, events);
        }
        if let Some(completion) = self.detector.observe_break(self.rest.state()) {
            self.raise(completion, now, events);
        }

        let focus_still_waiting = self.pending_focus.as_ref().is_some_and(|request| {
            !self.focus.is_running(None) && self.focus.active_task_id() == request.task_id()
        });
        if self.pending_focus.is_some() && !focus_still_waiting {
            self.pending_focus = None;
            events.push(Event::DecisionWithdrawn {
                timer: TimerKind::Focus,
                at: now,
            });
        }
        if self.pending_break.is_some() && !self.rest.has_ended() {
            self.pending_break = None;
            events.push(Event::DecisionWithdrawn {
                timer: TimerKind::Break,
                at: now,
            });
        }

        events.extend(self.evaluate_alerts());
    }

    fn evaluate_alerts(&mut self) -> Vec<Event> {
        let now = self.now();
        self.alerts
            .set_thresholds(AlertThresholds::from_config(&self.settings.alerts()));
        let focus_duration_min = self.settings.timer().focus_duration;
        self.alerts
            .evaluate(self.focus.active_task_id(), focus_duration_min, now)
    }

    fn raise(&mut self, completion: Completion, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let request = match completion {
            Completion::Focus { task_id } => {
                let can_finish = self.can_finish(&task_id);
                DecisionRequest::focus_complete(task_id, can_finish)
            }
            Completion::Break { task_id } => DecisionRequest::break_complete(task_id),
        };
        self.publish(request, now, events);
    }

    fn publish(&mut self, request: DecisionRequest, now: DateTime<Utc>, events: &mut Vec<Event>) {
        info!(task_id = request.task_id(), "decision requested");
        if self.decisions.send(request.clone()).is_err() {
            debug!("no decision consumer attached");
        }
        events.push(Event::DecisionRequested {
            request: request.clone(),
            at: now,
        });
        match request {
            DecisionRequest::FocusComplete { .. } => self.pending_focus = Some(request),
            DecisionRequest::BreakComplete { .. } => self.pending_break = Some(request),
        }
    }

    /// Whether "finish task" may be offered. A task that cannot be found
    /// locally or remotely cannot be finished.
    fn can_finish(&self, task_id: &str) -> bool {
        let task = match self.tasks.get_task(task_id) {
            Some(task) => Ok(task),
            None => self.tasks.refresh_task(task_id),
        };
        match task {
            Ok(task) => !task.has_pending_subtasks(),
            Err(e) => {
                warn!(task_id, error = %e, "task lookup failed, not offering finish");
                false
            }
        }
    }

    fn write_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        now: DateTime<Utc>,
        events: &mut Vec<Event>,
    ) {
        if self.tasks.get_task(task_id).is_some_and(|t| t.status == status) {
            return;
        }
        match self.tasks.update_task_status(task_id, status) {
            Ok(()) => events.push(Event::TaskStatusChanged {
                task_id: task_id.to_string(),
                status,
                at: now,
            }),
            Err(e) => {
                warn!(task_id, %status, error = %e, "task status update failed, continuing");
                events.push(Event::TaskWriteFailed {
                    task_id: task_id.to_string(),
                    message: e.to_string(),
                    at: now,
                });
            }
        }
    }
}
