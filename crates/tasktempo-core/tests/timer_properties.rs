//! Property tests for the countdown machines.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use tasktempo_core::timer::{
    FocusTimerEngine, SessionCommand, SessionPhase, SessionTimer, TerminalPolicy,
};
use tasktempo_core::{Config, Event, ManualClock, SharedSettings, TimerKind};

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Tick,
    Stop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0usize..3).prop_map(Op::Start),
        6 => Just(Op::Tick),
        1 => Just(Op::Stop),
    ]
}

const TASKS: [&str; 3] = ["task-1", "task-2", "task-3"];

proptest! {
    #[test]
    fn at_most_one_task_runs(ops in prop::collection::vec(op(), 0..200)) {
        let mut config = Config::default();
        config.timer.focus_duration = 1;
        let mut engine = FocusTimerEngine::new(
            Arc::new(SharedSettings::new(config)),
            Arc::new(ManualClock::default()),
        );

        for op in ops {
            match op {
                Op::Start(i) => { engine.start_timer(TASKS[i]); }
                Op::Tick => {
                    if engine.is_running(None) {
                        engine.tick();
                    }
                }
                Op::Stop => { engine.stop_timer(); }
            }
            let running = TASKS.iter().filter(|&&t| engine.is_running(Some(t))).count();
            prop_assert!(running <= 1);
        }
    }

    #[test]
    fn countdown_completes_exactly_once(duration in 1u64..600, extra in 0usize..20) {
        let now = Utc::now();
        let mut timer = SessionTimer::new(TimerKind::Focus, TerminalPolicy::ReturnToIdle, 1500);
        timer.apply(
            SessionCommand::Start { task_id: Some("t".into()), duration_secs: duration },
            now,
        );

        let mut completions = 0;
        for i in 0..duration {
            let before = timer.state().remaining_secs;
            let event = timer.apply(SessionCommand::Tick { default_secs: 1500 }, now);
            if matches!(event, Some(Event::TimerCompleted { .. })) {
                completions += 1;
                prop_assert_eq!(i, duration - 1);
            } else {
                prop_assert_eq!(timer.state().remaining_secs, before - 1);
            }
        }
        for _ in 0..extra {
            let event = timer.apply(SessionCommand::Tick { default_secs: 1500 }, now);
            prop_assert!(event.is_none());
        }

        prop_assert_eq!(completions, 1);
        prop_assert_eq!(timer.state().phase, SessionPhase::Idle);
        prop_assert_eq!(timer.state().active_task_id.as_deref(), Some("t"));
        prop_assert_eq!(timer.state().remaining_secs, 1500);
    }
}
