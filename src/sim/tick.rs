//! Tick driver
//!
//! The host calls `tick` once per animation frame with the current input and
//! wall-clock time. Every deadline and fixed-rate task that fell due since the
//! last call runs first, each at its own due time, then the frame update runs.

use serde::{Deserialize, Serialize};

use super::session::GameSession;
use crate::consts::MAX_CATCHUP_STEPS;

/// Input signals for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Hold control pressed
    pub holding: bool,
    /// Left/right tilt in degrees; `None` when no tilt source is available
    pub roll: Option<f32>,
    /// Front/back tilt in degrees (debug readout only)
    pub pitch: Option<f32>,
}

/// Scheduled work. Ordering breaks ties between tasks due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    DangerCue,
    PreTurnEnd,
    DangerGraceEnd,
    /// 20ms: danger check and hold-to-progress
    Control,
    /// 60ms: zone oscillation
    Zone,
    /// 1000ms: HUD countdown
    Countdown,
}

/// Advance the session to `now` (ms)
pub fn tick(session: &mut GameSession, input: &TickInput, now: f64) {
    session.ensure_timers(now);

    let mut steps = 0;
    while let Some((task, at)) = session.next_task(now) {
        if steps >= MAX_CATCHUP_STEPS {
            log::warn!("Tick fell {} steps behind at {:.0}ms, skipping missed tasks", steps, now);
            session.skip_missed(now);
            break;
        }
        session.run_task(task, at, input);
        steps += 1;
    }

    session.frame(input, now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::schedule::FixedDelays;
    use crate::sim::state::GameState;
    use crate::tuning::GameConfig;
    use proptest::prelude::*;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn session_with_cue(delay: f64) -> GameSession {
        GameSession::with_config(GameConfig::default(), Box::new(FixedDelays::new(vec![delay])))
            .expect("default config is valid")
    }

    #[test]
    fn test_tick_idle_runs_zone_only() {
        let mut session = session_with_cue(3000.0);
        tick(&mut session, &TickInput::default(), 0.0);
        tick(&mut session, &TickInput::default(), 600.0);
        assert_eq!(session.state(), GameState::Idle);
        assert!((session.zone_phase() - 0.2).abs() < 1e-5);
        assert_eq!(session.status().timer, 60);
    }

    #[test]
    fn test_tick_cue_sequence() {
        let mut session = session_with_cue(3000.0);
        session.start(0.0);
        let idle = TickInput {
            roll: Some(0.0),
            ..Default::default()
        };

        tick(&mut session, &idle, 2999.0);
        assert_eq!(session.state(), GameState::Safe);
        tick(&mut session, &idle, 3000.0);
        assert_eq!(session.state(), GameState::PreTurn);
        tick(&mut session, &idle, 3699.0);
        assert_eq!(session.state(), GameState::PreTurn);

        // Pre-turn ends and the control task at the same instant sees a frozen player
        tick(&mut session, &idle, 3700.0);
        assert_eq!(session.state(), GameState::Balance);
    }

    #[test]
    fn test_tick_catches_up_in_order() {
        let mut session = session_with_cue(3000.0);
        session.start(0.0);
        let still = TickInput {
            roll: Some(0.0),
            ..Default::default()
        };
        let holding = TickInput {
            holding: true,
            ..still
        };

        tick(&mut session, &still, 3650.0);
        assert_eq!(session.state(), GameState::PreTurn);

        // One long frame across the pre-turn end: danger starts, the control task
        // at the same instant catches the hold, then Safe progress resumes
        tick(&mut session, &holding, 3800.0);
        assert_eq!(session.status().life, 2);
        assert_eq!(session.state(), GameState::Safe);
        assert!((session.status().progress - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_countdown_counts_seconds() {
        let mut session = session_with_cue(100_000.0);
        session.start(0.0);
        let mut t = 0.0;
        while t <= 5010.0 {
            tick(&mut session, &TickInput::default(), t);
            t += FRAME_MS;
        }
        assert_eq!(session.status().timer, 55);
    }

    #[test]
    fn test_long_stall_is_bounded() {
        let mut session = session_with_cue(1e12);
        session.start(0.0);
        tick(&mut session, &TickInput::default(), 10_000_000.0);
        // Missed fixed-rate work was dropped, not replayed
        assert!(session.next_task(10_000_000.0).is_none());
        tick(&mut session, &TickInput::default(), 10_000_001.0);
        assert_eq!(session.state(), GameState::Safe);
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let mut session = GameSession::new(seed);
            session.start(0.0);
            let mut t = 0.0;
            let mut trace = Vec::new();
            for i in 0..2400 {
                let input = TickInput {
                    holding: (i / 90) % 2 == 0,
                    roll: Some(((i % 180) as f32) - 90.0),
                    pitch: None,
                };
                tick(&mut session, &input, t);
                trace.extend(session.drain_events());
                t += FRAME_MS;
            }
            (trace, session.status().clone())
        };
        assert_eq!(run(7), run(7));
    }

    proptest! {
        #[test]
        fn resources_stay_in_range(
            seed in any::<u64>(),
            steps in proptest::collection::vec((any::<bool>(), -180.0f32..180.0, 1.0f64..400.0), 1..300),
        ) {
            let mut session = GameSession::new(seed);
            session.start(0.0);
            let mut t = 0.0;
            let mut last_life = session.status().life;
            let mut finished: Option<(u8, f32, f32)> = None;

            for (holding, roll, dt) in steps {
                t += dt;
                tick(&mut session, &TickInput { holding, roll: Some(roll), pitch: None }, t);
                let status = session.status();

                prop_assert!(status.life <= 3);
                prop_assert!(status.life <= last_life);
                prop_assert!((0.0..=1000.0).contains(&status.distance));
                prop_assert!((0.0..=100.0).contains(&status.progress));
                last_life = status.life;

                match finished {
                    Some(frozen) => {
                        prop_assert_eq!(session.state(), GameState::Finish);
                        prop_assert_eq!(frozen, (status.life, status.distance, status.progress));
                    }
                    None if session.state() == GameState::Finish => {
                        finished = Some((status.life, status.distance, status.progress));
                    }
                    None => {}
                }
            }
        }
    }
}
