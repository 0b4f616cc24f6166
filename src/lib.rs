//! Hold Still - a red-light/green-light reflex game with a tilt balance challenge
//!
//! Core modules:
//! - `sim`: Deterministic game session (state machine, balance challenge, scheduling)
//! - `tuning`: Data-driven difficulty profiles and timing rules
//! - `input`: Input providers (hold button, tilt sensors, keyboard fallback, autopilot)
//! - `platform`: Browser facade (wasm32 only)

pub mod input;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use input::{Autopilot, InputProvider, KeyboardTilt, SensorTilt};
pub use sim::{GameEvent, GameSession, GameState, PlayerStatus, TickInput, tick};
pub use tuning::{ConfigError, DifficultyProfile, GameConfig, Mode, ModeError};

/// Game configuration constants
pub mod consts {
    /// Tilt range accepted by the tracker mapping (degrees)
    pub const ROLL_MIN: f32 = -90.0;
    pub const ROLL_MAX: f32 = 90.0;

    /// Player resources at session start
    pub const START_LIFE: u8 = 3;
    pub const START_DISTANCE: f32 = 100.0;
    pub const MAX_DISTANCE: f32 = 1000.0;
    pub const MAX_PROGRESS: f32 = 100.0;
    /// Countdown shown on the HUD (seconds)
    pub const START_TIMER: u32 = 60;

    /// Distance covered per frame while holding in Safe
    pub const MOVE_STEP: f32 = 0.1;
    /// Progress gained per control tick while holding in Safe (before mode bonus)
    pub const PROGRESS_STEP: f32 = 0.6;

    /// Warning window before danger (ms)
    pub const PRETURN_MS: f64 = 700.0;
    /// Danger window before it reverts to Safe on its own (ms)
    pub const DANGER_GRACE_MS: f64 = 800.0;
    /// Minimum spacing between two danger checks (ms)
    pub const DANGER_DEBOUNCE_MS: f64 = 300.0;
    /// Danger cue delay range, half-open (ms)
    pub const CUE_DELAY_MIN_MS: f64 = 3000.0;
    pub const CUE_DELAY_MAX_MS: f64 = 5800.0;

    /// Extra time after the challenge duration before a run fails (ms)
    pub const BALANCE_GRACE_MS: f64 = 1200.0;
    pub const SUCCESS_REWARD: f32 = 20.0;
    pub const FAILURE_PENALTY: f32 = 10.0;

    /// Zone oscillation advance per zone tick (radians)
    pub const ZONE_PHASE_STEP: f32 = 0.02;
    /// Default tracking-space width (px)
    pub const TRACK_WIDTH: f32 = 320.0;
    /// Half width of the tracker marker (px)
    pub const MARKER_HALF_WIDTH: f32 = 16.0;

    /// Fixed-rate task periods (ms)
    pub const COUNTDOWN_PERIOD_MS: f64 = 1000.0;
    pub const CONTROL_PERIOD_MS: f64 = 20.0;
    pub const ZONE_PERIOD_MS: f64 = 60.0;
    /// Maximum deadlines processed in one tick call to prevent spiral of death
    pub const MAX_CATCHUP_STEPS: u32 = 4096;

    /// How long the outcome badge stays up after a balance run (ms)
    pub const SUCCESS_BADGE_MS: f64 = 1500.0;
    pub const FAILURE_BADGE_MS: f64 = 1600.0;
}

/// Clamp a tilt reading into the tracker range; NaN reads as level
#[inline]
pub fn clamp_roll(roll: f32) -> f32 {
    if roll.is_nan() {
        0.0
    } else {
        roll.clamp(consts::ROLL_MIN, consts::ROLL_MAX)
    }
}

/// Map a tilt angle onto the tracking space `[0, track_width]`
#[inline]
pub fn roll_to_track(roll: f32, track_width: f32) -> f32 {
    (clamp_roll(roll) - consts::ROLL_MIN) / (consts::ROLL_MAX - consts::ROLL_MIN) * track_width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_mapping_endpoints() {
        assert_eq!(roll_to_track(-90.0, 180.0), 0.0);
        assert_eq!(roll_to_track(0.0, 180.0), 90.0);
        assert_eq!(roll_to_track(90.0, 180.0), 180.0);
    }

    #[test]
    fn test_roll_out_of_range_is_clamped() {
        assert_eq!(roll_to_track(400.0, 320.0), 320.0);
        assert_eq!(roll_to_track(-1e9, 320.0), 0.0);
        assert_eq!(clamp_roll(f32::NAN), 0.0);
    }
}
