//! Game state and core session types
//!
//! The discrete state machine lives in `transition`: every legal move is one
//! match arm, anything else is rejected.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PROGRESS;
use crate::tuning::{Mode, Rules};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Created, waiting for start
    #[default]
    Idle,
    /// Moving is allowed and rewarded
    Safe,
    /// Warning window before danger (cosmetic only)
    PreTurn,
    /// Moving is punished, stopping starts the balance challenge
    Danger,
    /// Balance challenge running
    Balance,
    /// Run ended
    Finish,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Safe => "safe",
            GameState::PreTurn => "preturn",
            GameState::Danger => "danger",
            GameState::Balance => "balance",
            GameState::Finish => "finish",
        }
    }

    /// Whether gameplay mutations are allowed in this state
    pub fn is_live(&self) -> bool {
        !matches!(self, GameState::Idle | GameState::Finish)
    }
}

/// Things that can move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Restart,
    /// Randomized danger cue fired
    DangerCue,
    PreTurnElapsed,
    /// Danger window ran out without a check resolving it
    DangerGraceElapsed,
    /// Player was holding during a danger check
    CaughtMoving,
    /// Player had released during a danger check
    Froze,
    BalanceResolved,
    /// Life ran out or the goal was reached
    Terminal,
}

/// Transition table: `None` means the trigger does not apply in `state`
pub fn transition(state: GameState, trigger: Trigger) -> Option<GameState> {
    use GameState::*;
    use Trigger::*;

    match (state, trigger) {
        (_, Restart) => Some(Safe),
        (Finish, _) => None,
        (Idle, Terminal) => None,
        (_, Terminal) => Some(Finish),
        (Idle, Start) => Some(Safe),
        (Safe, DangerCue) => Some(PreTurn),
        (PreTurn, PreTurnElapsed) => Some(Danger),
        (Danger, DangerGraceElapsed) => Some(Safe),
        (Danger, CaughtMoving) => Some(Safe),
        (Danger, Froze) => Some(Balance),
        (Balance, BalanceResolved) => Some(Safe),
        _ => None,
    }
}

/// HUD badge derived from the state and the last balance outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Idle,
    Safe,
    Warning,
    Danger,
    Balance,
    Success,
    Failure,
    Finish,
}

/// Discrete outcomes for sound, haptics and animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    StateChanged { from: GameState, to: GameState },
    /// Caught moving during danger; carries the remaining life
    DangerPenalty { life: u8 },
    BalanceSuccess,
    BalanceFailure,
    Finished,
    ModeChanged { mode: Mode },
    HiddenModeUnlocked,
}

/// Player resources. All mutators clamp to the documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub life: u8,
    /// Remaining distance to the goal, in `[0, max_distance]`
    pub distance: f32,
    /// Alternate completion metric, in `[0, 100]`
    pub progress: f32,
    /// HUD countdown (seconds)
    pub timer: u32,
}

impl PlayerStatus {
    pub fn new(rules: &Rules) -> Self {
        Self {
            life: rules.start_life,
            distance: rules.start_distance.clamp(0.0, rules.max_distance),
            progress: 0.0,
            timer: rules.start_timer,
        }
    }

    pub fn lose_life(&mut self) {
        self.life = self.life.saturating_sub(1);
    }

    /// Move toward the goal
    pub fn advance(&mut self, amount: f32) {
        self.distance = (self.distance - amount).max(0.0);
    }

    /// Move away from the goal
    pub fn fall_back(&mut self, amount: f32, max_distance: f32) {
        self.distance = (self.distance + amount).min(max_distance);
    }

    pub fn add_progress(&mut self, amount: f32) {
        self.progress = (self.progress + amount).clamp(0.0, MAX_PROGRESS);
    }

    /// One countdown second; stops at zero
    pub fn count_down(&mut self) {
        self.timer = self.timer.saturating_sub(1);
    }

    pub fn is_exhausted(&self) -> bool {
        self.life == 0
    }

    pub fn reached_goal(&self) -> bool {
        self.distance <= 0.0 || self.progress >= MAX_PROGRESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_happy_path() {
        let mut state = GameState::Idle;
        for (trigger, expected) in [
            (Trigger::Start, GameState::Safe),
            (Trigger::DangerCue, GameState::PreTurn),
            (Trigger::PreTurnElapsed, GameState::Danger),
            (Trigger::Froze, GameState::Balance),
            (Trigger::BalanceResolved, GameState::Safe),
        ] {
            state = transition(state, trigger).expect("legal transition");
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_transition_rejects_out_of_order() {
        assert_eq!(transition(GameState::Safe, Trigger::Froze), None);
        assert_eq!(transition(GameState::PreTurn, Trigger::DangerCue), None);
        assert_eq!(transition(GameState::Balance, Trigger::DangerGraceElapsed), None);
        assert_eq!(transition(GameState::Idle, Trigger::DangerCue), None);
    }

    #[test]
    fn test_finish_is_terminal() {
        let all = [
            Trigger::Start,
            Trigger::DangerCue,
            Trigger::PreTurnElapsed,
            Trigger::DangerGraceElapsed,
            Trigger::CaughtMoving,
            Trigger::Froze,
            Trigger::BalanceResolved,
            Trigger::Terminal,
        ];
        for trigger in all {
            assert_eq!(transition(GameState::Finish, trigger), None);
        }
        assert_eq!(
            transition(GameState::Finish, Trigger::Restart),
            Some(GameState::Safe)
        );
    }

    #[test]
    fn test_terminal_overrides_every_live_state() {
        for state in [
            GameState::Safe,
            GameState::PreTurn,
            GameState::Danger,
            GameState::Balance,
        ] {
            assert_eq!(transition(state, Trigger::Terminal), Some(GameState::Finish));
        }
    }

    #[test]
    fn test_status_clamps() {
        let rules = Rules::default();
        let mut status = PlayerStatus::new(&rules);
        assert_eq!(status.life, 3);
        assert_eq!(status.distance, 100.0);

        for _ in 0..5 {
            status.lose_life();
        }
        assert_eq!(status.life, 0);

        status.advance(250.0);
        assert_eq!(status.distance, 0.0);
        status.fall_back(5000.0, rules.max_distance);
        assert_eq!(status.distance, 1000.0);

        status.add_progress(140.0);
        assert_eq!(status.progress, 100.0);
        assert!(status.reached_goal());

        status.timer = 1;
        status.count_down();
        status.count_down();
        assert_eq!(status.timer, 0);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&GameEvent::StateChanged {
            from: GameState::Danger,
            to: GameState::Balance,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"type":"state_changed","from":"danger","to":"balance"}"#);
    }
}
