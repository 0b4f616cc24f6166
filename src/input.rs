//! Input providers
//!
//! The session only ever sees a `TickInput`. Providers turn whatever the host
//! has (hold button, orientation sensor, arrow keys, a bot) into one, and report
//! which capabilities they actually have so a missing sensor degrades to `None`
//! instead of a made-up reading.

use crate::sim::{GameSession, GameState, TickInput};

/// Roll/pitch change per key press (degrees)
pub const KEY_TILT_STEP: f32 = 5.0;
/// Hold duration that fills the press gauge (ms)
pub const HOLD_GAUGE_MS: f64 = 3000.0;

/// A source of hold and tilt signals
pub trait InputProvider {
    /// Whether a tilt reading is currently available
    fn has_tilt(&self) -> bool;
    /// Whether a hold control is wired up
    fn has_hold(&self) -> bool;
    fn holding(&self) -> bool;
    fn roll(&self) -> Option<f32>;
    fn pitch(&self) -> Option<f32> {
        None
    }

    /// Input for the next tick, with unavailable capabilities left neutral
    fn snapshot(&self) -> TickInput {
        TickInput {
            holding: self.has_hold() && self.holding(),
            roll: self.roll().filter(|_| self.has_tilt()),
            pitch: self.pitch().filter(|_| self.has_tilt()),
        }
    }
}

/// Tilt axis adjusted by a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiltAxis {
    Roll,
    Pitch,
}

/// Keyboard fallback mapping: arrows tilt left/right, `z`/`x` tilt front/back
pub fn key_tilt(key: &str) -> Option<(TiltAxis, f32)> {
    match key {
        "ArrowLeft" => Some((TiltAxis::Roll, -KEY_TILT_STEP)),
        "ArrowRight" => Some((TiltAxis::Roll, KEY_TILT_STEP)),
        "z" => Some((TiltAxis::Pitch, -KEY_TILT_STEP)),
        "x" => Some((TiltAxis::Pitch, KEY_TILT_STEP)),
        _ => None,
    }
}

/// Hold button plus arrow-key tilt. Readings are not clamped here; the
/// tracker mapping clamps them.
#[derive(Debug, Clone, Default)]
pub struct KeyboardTilt {
    roll: f32,
    pitch: f32,
    holding: bool,
}

impl KeyboardTilt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_holding(&mut self, holding: bool) {
        self.holding = holding;
    }

    /// Apply a key press; returns false for keys that are not tilt keys
    pub fn press_key(&mut self, key: &str) -> bool {
        match key_tilt(key) {
            Some((TiltAxis::Roll, step)) => self.roll += step,
            Some((TiltAxis::Pitch, step)) => self.pitch += step,
            None => return false,
        }
        true
    }
}

impl InputProvider for KeyboardTilt {
    fn has_tilt(&self) -> bool {
        true
    }

    fn has_hold(&self) -> bool {
        true
    }

    fn holding(&self) -> bool {
        self.holding
    }

    fn roll(&self) -> Option<f32> {
        Some(self.roll)
    }

    fn pitch(&self) -> Option<f32> {
        Some(self.pitch)
    }
}

/// Device tilt from motion/orientation events, with the keyboard as a nudge.
///
/// Reports no tilt until the first reading arrives.
#[derive(Debug, Clone, Default)]
pub struct SensorTilt {
    roll: Option<f32>,
    pitch: Option<f32>,
    holding: bool,
}

impl SensorTilt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_holding(&mut self, holding: bool) {
        self.holding = holding;
    }

    /// Motion event with the gravity vector (m/s²)
    pub fn on_motion(&mut self, x: f32, y: f32, z: f32) {
        let (roll, pitch) = tilt_from_gravity(x, y, z);
        self.roll = Some(roll);
        self.pitch = Some(pitch);
    }

    /// Orientation event; a missing angle keeps the previous reading
    pub fn on_orientation(&mut self, beta: Option<f32>, gamma: Option<f32>) {
        if let Some(gamma) = gamma.filter(|g| g.is_finite()) {
            self.roll = Some(gamma);
        }
        if let Some(beta) = beta.filter(|b| b.is_finite()) {
            self.pitch = Some(beta);
        }
    }

    /// Keyboard nudge on top of the sensor reading
    pub fn press_key(&mut self, key: &str) -> bool {
        match key_tilt(key) {
            Some((TiltAxis::Roll, step)) => self.roll = Some(self.roll.unwrap_or(0.0) + step),
            Some((TiltAxis::Pitch, step)) => self.pitch = Some(self.pitch.unwrap_or(0.0) + step),
            None => return false,
        }
        true
    }
}

impl InputProvider for SensorTilt {
    fn has_tilt(&self) -> bool {
        self.roll.is_some()
    }

    fn has_hold(&self) -> bool {
        true
    }

    fn holding(&self) -> bool {
        self.holding
    }

    fn roll(&self) -> Option<f32> {
        self.roll
    }

    fn pitch(&self) -> Option<f32> {
        self.pitch
    }
}

/// Approximate (roll, pitch) in degrees from a gravity vector
pub fn tilt_from_gravity(x: f32, y: f32, z: f32) -> (f32, f32) {
    let roll = y.atan2(z).to_degrees();
    let pitch = x.atan2(y).to_degrees();
    (roll, pitch)
}

/// Press feedback: how far a hold has filled the gauge
#[derive(Debug, Clone, Default)]
pub struct HoldGauge {
    pressed_at: Option<f64>,
}

impl HoldGauge {
    pub fn press(&mut self, now: f64) {
        self.pressed_at = Some(now);
    }

    pub fn release(&mut self) {
        self.pressed_at = None;
    }

    /// Fill fraction in `[0, 1]`; zero while released
    pub fn fraction(&self, now: f64) -> f32 {
        match self.pressed_at {
            Some(at) => ((now - at) / HOLD_GAUGE_MS).clamp(0.0, 1.0) as f32,
            None => 0.0,
        }
    }
}

/// Demo/attract-mode player: walks in Safe, freezes at the warning, and steers
/// the tracker into the zone during a challenge
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    planned: TickInput,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the next input from the session readouts
    pub fn observe(&mut self, session: &GameSession) {
        let holding = session.state() == GameState::Safe;

        // Aim near the zone centre with a small drift so runs don't look scripted
        let zone = session.zone();
        let drift = (session.zone_phase() * 3.7).sin() * zone.width * 0.2;
        let target = zone.center() + drift;
        let roll = target / zone.track_width * 180.0 - 90.0;

        self.planned = TickInput {
            holding,
            roll: Some(roll),
            pitch: Some(0.0),
        };
    }
}

impl InputProvider for Autopilot {
    fn has_tilt(&self) -> bool {
        true
    }

    fn has_hold(&self) -> bool {
        true
    }

    fn holding(&self) -> bool {
        self.planned.holding
    }

    fn roll(&self) -> Option<f32> {
        self.planned.roll
    }

    fn pitch(&self) -> Option<f32> {
        self.planned.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{FixedDelays, tick};
    use crate::tuning::GameConfig;

    #[test]
    fn test_keyboard_steps() {
        let mut keys = KeyboardTilt::new();
        assert!(keys.press_key("ArrowRight"));
        assert!(keys.press_key("ArrowRight"));
        assert!(keys.press_key("ArrowLeft"));
        assert!(keys.press_key("x"));
        assert!(!keys.press_key("q"));
        let input = keys.snapshot();
        assert_eq!(input.roll, Some(5.0));
        assert_eq!(input.pitch, Some(5.0));
        assert!(!input.holding);

        // Not clamped at the source
        for _ in 0..40 {
            keys.press_key("ArrowRight");
        }
        assert_eq!(keys.roll(), Some(205.0));
    }

    #[test]
    fn test_sensor_absent_until_first_reading() {
        let mut sensor = SensorTilt::new();
        sensor.set_holding(true);
        let input = sensor.snapshot();
        assert!(input.holding);
        assert_eq!(input.roll, None);

        sensor.on_orientation(Some(10.0), Some(-20.0));
        sensor.on_orientation(None, Some(f32::NAN));
        assert_eq!(sensor.snapshot().roll, Some(-20.0));
        assert_eq!(sensor.snapshot().pitch, Some(10.0));
    }

    #[test]
    fn test_sensor_key_nudge() {
        let mut sensor = SensorTilt::new();
        assert!(sensor.press_key("ArrowLeft"));
        assert_eq!(sensor.roll(), Some(-5.0));
        assert!(sensor.has_tilt());
    }

    #[test]
    fn test_tilt_from_gravity() {
        // Lying flat: gravity along z
        let (roll, _) = tilt_from_gravity(0.0, 0.0, 9.81);
        assert!(roll.abs() < 1e-4);
        // Tipped fully onto its side
        let (roll, _) = tilt_from_gravity(0.0, 9.81, 0.0);
        assert!((roll - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_hold_gauge() {
        let mut gauge = HoldGauge::default();
        assert_eq!(gauge.fraction(100.0), 0.0);
        gauge.press(1000.0);
        assert!((gauge.fraction(2500.0) - 0.5).abs() < 1e-6);
        assert_eq!(gauge.fraction(9000.0), 1.0);
        gauge.release();
        assert_eq!(gauge.fraction(9000.0), 0.0);
    }

    #[test]
    fn test_autopilot_wins_a_challenge() {
        let mut session =
            GameSession::with_config(GameConfig::default(), Box::new(FixedDelays::new(vec![3000.0])))
                .expect("default config is valid");
        let mut pilot = Autopilot::new();
        session.start(0.0);

        let mut t = 0.0;
        while t < 12_000.0 {
            pilot.observe(&session);
            tick(&mut session, &pilot.snapshot(), t);
            t += 1000.0 / 60.0;
        }
        let events = session.drain_events();
        assert!(events.contains(&crate::sim::GameEvent::BalanceSuccess));
        assert!(!events.contains(&crate::sim::GameEvent::BalanceFailure));
    }
}
