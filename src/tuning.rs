//! Data-driven game balance
//!
//! Difficulty profiles keyed by mode, plus the timing rules the session runs on.
//! Everything here is plain serde data so a host can ship its own JSON table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Difficulty mode selected by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Easy,
    #[default]
    Normal,
    Hard,
    /// Hidden until the host reports the unlock gesture
    Hell,
}

impl Mode {
    /// Modes that are always selectable, in menu order
    pub const VISIBLE: [Mode; 3] = [Mode::Easy, Mode::Normal, Mode::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Easy => "easy",
            Mode::Normal => "normal",
            Mode::Hard => "hard",
            Mode::Hell => "hell",
        }
    }

    /// Whether this mode needs the hidden-mode unlock
    pub fn is_hidden(&self) -> bool {
        matches!(self, Mode::Hell)
    }

    /// Adjustment on top of the base progress step
    pub fn progress_bonus(&self) -> f32 {
        match self {
            Mode::Easy => 1.0,
            Mode::Hard => -0.3,
            Mode::Normal | Mode::Hell => 0.0,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Mode::Easy),
            "normal" => Ok(Mode::Normal),
            "hard" => Ok(Mode::Hard),
            "hell" => Ok(Mode::Hell),
            _ => Err(ModeError::Unknown(s.to_string())),
        }
    }
}

/// Errors raised when selecting a difficulty mode
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("unknown difficulty mode `{0}`")]
    Unknown(String),
    #[error("mode `{0}` has not been unlocked")]
    Locked(Mode),
}

/// Balance-challenge parameters for one mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Width of the target zone in tracking-space pixels
    pub safe_zone_size: f32,
    /// Tracker speed factor, reported to the presentation layer
    pub tracker_speed: f32,
    /// Time the tracker must be held before a run can succeed (ms)
    pub challenge_duration_ms: f64,
}

impl DifficultyProfile {
    pub const fn new(safe_zone_size: f32, tracker_speed: f32, challenge_duration_ms: f64) -> Self {
        Self {
            safe_zone_size,
            tracker_speed,
            challenge_duration_ms,
        }
    }

    /// Debug override for the challenge duration; negative or NaN reads as zero
    pub fn override_duration(&mut self, ms: f64) {
        let clamped = if ms.is_nan() { 0.0 } else { ms.max(0.0) };
        if clamped != ms {
            log::warn!("Challenge duration override {} clamped to {}", ms, clamped);
        }
        self.challenge_duration_ms = clamped;
    }

    /// Debug override for the zone width; negative or NaN reads as zero
    pub fn override_zone_size(&mut self, px: f32) {
        let clamped = if px.is_nan() { 0.0 } else { px.max(0.0) };
        if clamped != px {
            log::warn!("Safe zone override {} clamped to {}", px, clamped);
        }
        self.safe_zone_size = clamped;
    }
}

/// Profiles for every mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub easy: DifficultyProfile,
    pub normal: DifficultyProfile,
    pub hard: DifficultyProfile,
    pub hell: DifficultyProfile,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: DifficultyProfile::new(120.0, 0.5, 2500.0),
            normal: DifficultyProfile::new(80.0, 1.0, 2500.0),
            hard: DifficultyProfile::new(40.0, 1.8, 2000.0),
            hell: DifficultyProfile::new(28.0, 3.2, 1200.0),
        }
    }
}

impl DifficultyTable {
    pub fn get(&self, mode: Mode) -> &DifficultyProfile {
        match mode {
            Mode::Easy => &self.easy,
            Mode::Normal => &self.normal,
            Mode::Hard => &self.hard,
            Mode::Hell => &self.hell,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut DifficultyProfile {
        match mode {
            Mode::Easy => &mut self.easy,
            Mode::Normal => &mut self.normal,
            Mode::Hard => &mut self.hard,
            Mode::Hell => &mut self.hell,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Mode, &DifficultyProfile)> {
        [Mode::Easy, Mode::Normal, Mode::Hard, Mode::Hell]
            .into_iter()
            .map(move |mode| (mode, self.get(mode)))
    }
}

/// Timing and resource rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub start_life: u8,
    pub start_distance: f32,
    pub max_distance: f32,
    /// HUD countdown start (seconds)
    pub start_timer: u32,
    /// Distance per frame while holding in Safe
    pub move_step: f32,
    /// Progress per control tick while holding in Safe (before mode bonus)
    pub progress_step: f32,
    pub preturn_ms: f64,
    pub danger_grace_ms: f64,
    pub danger_debounce_ms: f64,
    pub cue_delay_min_ms: f64,
    pub cue_delay_max_ms: f64,
    pub balance_grace_ms: f64,
    pub success_reward: f32,
    pub failure_penalty: f32,
    /// Zone oscillation advance per zone tick (radians)
    pub zone_phase_step: f32,
    pub countdown_period_ms: f64,
    pub control_period_ms: f64,
    pub zone_period_ms: f64,
    pub success_badge_ms: f64,
    pub failure_badge_ms: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            start_life: START_LIFE,
            start_distance: START_DISTANCE,
            max_distance: MAX_DISTANCE,
            start_timer: START_TIMER,
            move_step: MOVE_STEP,
            progress_step: PROGRESS_STEP,
            preturn_ms: PRETURN_MS,
            danger_grace_ms: DANGER_GRACE_MS,
            danger_debounce_ms: DANGER_DEBOUNCE_MS,
            cue_delay_min_ms: CUE_DELAY_MIN_MS,
            cue_delay_max_ms: CUE_DELAY_MAX_MS,
            balance_grace_ms: BALANCE_GRACE_MS,
            success_reward: SUCCESS_REWARD,
            failure_penalty: FAILURE_PENALTY,
            zone_phase_step: ZONE_PHASE_STEP,
            countdown_period_ms: COUNTDOWN_PERIOD_MS,
            control_period_ms: CONTROL_PERIOD_MS,
            zone_period_ms: ZONE_PERIOD_MS,
            success_badge_ms: SUCCESS_BADGE_MS,
            failure_badge_ms: FAILURE_BADGE_MS,
        }
    }
}

impl Rules {
    /// Progress gained per control tick in the given mode
    pub fn progress_step_for(&self, mode: Mode) -> f32 {
        (self.progress_step + mode.progress_bonus()).max(0.0)
    }
}

/// Errors raised when a configuration violates its invariants
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} range invalid (min {min:.2} >= max {max:.2})")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{mode} safe zone {zone:.1}px is wider than the {track:.1}px track")]
    ZoneWiderThanTrack { mode: Mode, zone: f32, track: f32 },
}

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: Rules,
    /// Width of the tracking space the tilt is mapped onto (px)
    pub track_width: f32,
    pub difficulty: DifficultyTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            track_width: TRACK_WIDTH,
            difficulty: DifficultyTable::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!("Loaded game config (track width {})", config.track_width);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.rules;
        if self.track_width <= 0.0 || self.track_width.is_nan() {
            return Err(ConfigError::MinViolation {
                field: "track_width",
                min: f64::EPSILON,
                value: self.track_width as f64,
            });
        }
        if r.start_life == 0 {
            return Err(ConfigError::MinViolation {
                field: "rules.start_life",
                min: 1.0,
                value: 0.0,
            });
        }
        if r.start_distance <= 0.0 || r.start_distance.is_nan() {
            return Err(ConfigError::MinViolation {
                field: "rules.start_distance",
                min: f64::EPSILON,
                value: r.start_distance as f64,
            });
        }
        if r.start_distance > r.max_distance {
            return Err(ConfigError::InvertedRange {
                field: "rules.start_distance",
                min: r.start_distance as f64,
                max: r.max_distance as f64,
            });
        }
        if r.cue_delay_min_ms >= r.cue_delay_max_ms {
            return Err(ConfigError::InvertedRange {
                field: "rules.cue_delay_ms",
                min: r.cue_delay_min_ms,
                max: r.cue_delay_max_ms,
            });
        }
        if r.danger_debounce_ms >= r.danger_grace_ms {
            return Err(ConfigError::InvertedRange {
                field: "rules.danger_debounce_ms",
                min: r.danger_debounce_ms,
                max: r.danger_grace_ms,
            });
        }
        let non_negative = [
            ("rules.preturn_ms", r.preturn_ms),
            ("rules.danger_debounce_ms", r.danger_debounce_ms),
            ("rules.cue_delay_min_ms", r.cue_delay_min_ms),
            ("rules.balance_grace_ms", r.balance_grace_ms),
            ("rules.success_reward", r.success_reward as f64),
            ("rules.failure_penalty", r.failure_penalty as f64),
            ("rules.move_step", r.move_step as f64),
            ("rules.progress_step", r.progress_step as f64),
        ];
        for (field, value) in non_negative {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        let periods = [
            ("rules.countdown_period_ms", r.countdown_period_ms),
            ("rules.control_period_ms", r.control_period_ms),
            ("rules.zone_period_ms", r.zone_period_ms),
        ];
        for (field, value) in periods {
            // Zero periods would never let the scheduler advance
            if value < 1.0 || value.is_nan() {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1.0,
                    value,
                });
            }
        }
        for (mode, profile) in self.difficulty.iter() {
            if profile.challenge_duration_ms < 0.0 || profile.challenge_duration_ms.is_nan() {
                return Err(ConfigError::MinViolation {
                    field: "difficulty.challenge_duration_ms",
                    min: 0.0,
                    value: profile.challenge_duration_ms,
                });
            }
            if profile.safe_zone_size > self.track_width {
                return Err(ConfigError::ZoneWiderThanTrack {
                    mode,
                    zone: profile.safe_zone_size,
                    track: self.track_width,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let table = DifficultyTable::default();
        assert_eq!(*table.get(Mode::Normal), DifficultyProfile::new(80.0, 1.0, 2500.0));
        assert_eq!(table.get(Mode::Easy).safe_zone_size, 120.0);
        assert_eq!(table.get(Mode::Hard).challenge_duration_ms, 2000.0);

        // Hell is the tightest and shortest
        let hell = table.get(Mode::Hell);
        for mode in Mode::VISIBLE {
            assert!(hell.safe_zone_size < table.get(mode).safe_zone_size);
            assert!(hell.challenge_duration_ms < table.get(mode).challenge_duration_ms);
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Easy".parse::<Mode>(), Ok(Mode::Easy));
        assert_eq!(" hell ".parse::<Mode>(), Ok(Mode::Hell));
        assert_eq!(
            "nightmare".parse::<Mode>(),
            Err(ModeError::Unknown("nightmare".to_string()))
        );
        assert_eq!(Mode::Hard.to_string(), "hard");
    }

    #[test]
    fn test_progress_step_per_mode() {
        let rules = Rules::default();
        assert!((rules.progress_step_for(Mode::Normal) - 0.6).abs() < 1e-6);
        assert!((rules.progress_step_for(Mode::Easy) - 1.6).abs() < 1e-6);
        assert!((rules.progress_step_for(Mode::Hard) - 0.3).abs() < 1e-6);
        assert!((rules.progress_step_for(Mode::Hell) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_overrides_clamp() {
        let mut profile = DifficultyProfile::new(80.0, 1.0, 2500.0);
        profile.override_duration(-50.0);
        assert_eq!(profile.challenge_duration_ms, 0.0);
        profile.override_zone_size(f32::NAN);
        assert_eq!(profile.safe_zone_size, 0.0);
        profile.override_zone_size(64.0);
        profile.override_zone_size(64.0);
        assert_eq!(profile.safe_zone_size, 64.0);
    }

    #[test]
    fn test_config_json_partial() {
        let config = GameConfig::from_json(r#"{ "track_width": 400.0, "rules": { "preturn_ms": 500.0 } }"#)
            .expect("partial config should parse");
        assert_eq!(config.track_width, 400.0);
        assert_eq!(config.rules.preturn_ms, 500.0);
        assert_eq!(config.rules.danger_grace_ms, DANGER_GRACE_MS);
        assert_eq!(config.difficulty, DifficultyTable::default());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = GameConfig::default();
        let json = config.to_json().expect("serialize");
        let back = GameConfig::from_json(&json).expect("parse");
        assert_eq!(config, back);
    }

    #[test]
    fn test_config_validation() {
        let mut config = GameConfig::default();
        config.track_width = 100.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZoneWiderThanTrack { mode: Mode::Easy, .. })
        ));

        let mut config = GameConfig::default();
        config.rules.cue_delay_min_ms = 6000.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvertedRange { .. })));

        let mut config = GameConfig::default();
        config.rules.control_period_ms = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::MinViolation { .. })));

        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
