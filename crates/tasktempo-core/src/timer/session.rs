//! Generic countdown state machine shared by the focus and break timers.
//!
//! The machine is tick-driven: it owns no thread and never reads the
//! clock for countdown arithmetic. Each [`SessionCommand::Tick`] removes
//! exactly one second, whatever wall time actually passed. A tick carries
//! the currently configured length so a focus timer that finishes is
//! refilled from the settings in force at that moment.
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──start──► Running ──tick (remaining hits 0)──► terminal
//!   ▲                │                                    │
//!   └──────stop──────┴────────────────stop────────────────┘
//! ```
//!
//! The terminal state depends on the [`TerminalPolicy`]: the focus timer
//! returns to `Idle` but keeps its task, the break timer parks in `Ended`
//! (also keeping its task) until stopped. In both cases the surviving
//! task id is what lets observers tell "a session just finished for this
//! task" apart from "nothing is going on".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimerKind;
use crate::events::Event;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    /// Countdown reached zero and is waiting to be cleared. Break timer only.
    Ended,
}

/// What a timer does when its countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Go back to `Idle`, keep the task, refill the countdown to the
    /// configured default.
    ReturnToIdle,
    /// Park in `Ended` with the countdown at zero until explicitly stopped.
    HoldEnded,
}

impl TerminalPolicy {
    pub fn terminal_phase(self) -> SessionPhase {
        match self {
            TerminalPolicy::ReturnToIdle => SessionPhase::Idle,
            TerminalPolicy::HoldEnded => SessionPhase::Ended,
        }
    }

    fn remaining_after_completion(self, default_secs: u64) -> u64 {
        match self {
            TerminalPolicy::ReturnToIdle => default_secs,
            TerminalPolicy::HoldEnded => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub active_task_id: Option<TaskId>,
    pub phase: SessionPhase,
    pub remaining_secs: u64,
    /// Set only while running. Diagnostic; never used for the countdown.
    pub started_at: Option<DateTime<Utc>>,
    /// Length the current (or next) session was started with.
    pub session_secs: u64,
}

impl SessionState {
    pub fn idle(default_secs: u64) -> Self {
        Self {
            active_task_id: None,
            phase: SessionPhase::Idle,
            remaining_secs: default_secs,
            started_at: None,
            session_secs: default_secs,
        }
    }

    /// True if a session is associated with `task_id`, or with anything
    /// at all when `task_id` is `None`.
    pub fn is_active(&self, task_id: Option<&str>) -> bool {
        match task_id {
            Some(id) => self.active_task_id.as_deref() == Some(id),
            None => self.active_task_id.is_some() || self.phase != SessionPhase::Idle,
        }
    }

    /// True only while counting down (and bound to `task_id` if given).
    pub fn is_running(&self, task_id: Option<&str>) -> bool {
        self.phase == SessionPhase::Running
            && task_id.map_or(true, |id| self.active_task_id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start {
        task_id: Option<TaskId>,
        duration_secs: u64,
    },
    Tick {
        default_secs: u64,
    },
    Stop {
        default_secs: u64,
    },
}

/// Pure transition function. `Tick` outside `Running` leaves the state
/// untouched.
pub fn transition(
    state: &SessionState,
    command: &SessionCommand,
    policy: TerminalPolicy,
    now: DateTime<Utc>,
) -> SessionState {
    match command {
        SessionCommand::Start {
            task_id,
            duration_secs,
        } => SessionState {
            active_task_id: task_id.clone(),
            phase: SessionPhase::Running,
            remaining_secs: *duration_secs,
            started_at: Some(now),
            session_secs: *duration_secs,
        },
        SessionCommand::Tick { default_secs } => {
            if state.phase != SessionPhase::Running {
                return state.clone();
            }
            let remaining = state.remaining_secs.saturating_sub(1);
            if remaining == 0 {
                SessionState {
                    active_task_id: state.active_task_id.clone(),
                    phase: policy.terminal_phase(),
                    remaining_secs: policy.remaining_after_completion(*default_secs),
                    started_at: None,
                    session_secs: *default_secs,
                }
            } else {
                SessionState {
                    remaining_secs: remaining,
                    ..state.clone()
                }
            }
        }
        SessionCommand::Stop { default_secs } => SessionState::idle(*default_secs),
    }
}

/// A [`SessionState`] plus the policy it runs under. Every command that
/// changes something observable returns the matching [`Event`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    kind: TimerKind,
    policy: TerminalPolicy,
    state: SessionState,
}

impl SessionTimer {
    pub fn new(kind: TimerKind, policy: TerminalPolicy, default_secs: u64) -> Self {
        Self {
            kind,
            policy,
            state: SessionState::idle(default_secs),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn apply(&mut self, command: SessionCommand, now: DateTime<Utc>) -> Option<Event> {
        let next = transition(&self.state, &command, self.policy, now);
        let prev = std::mem::replace(&mut self.state, next);
        let state = &self.state;

        match command {
            SessionCommand::Start { duration_secs, .. } => Some(Event::TimerStarted {
                timer: self.kind,
                task_id: state.active_task_id.clone(),
                duration_secs,
                at: now,
            }),
            SessionCommand::Tick { .. } => {
                let completed =
                    prev.phase == SessionPhase::Running && state.phase != SessionPhase::Running;
                completed.then(|| Event::TimerCompleted {
                    timer: self.kind,
                    task_id: state.active_task_id.clone(),
                    at: now,
                })
            }
            SessionCommand::Stop { .. } => {
                prev.is_active(None).then(|| Event::TimerStopped {
                    timer: self.kind,
                    task_id: prev.active_task_id.clone(),
                    remaining_secs: prev.remaining_secs,
                    at: now,
                })
            }
        }
    }
}
