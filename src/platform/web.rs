//! wasm-bindgen facade for the browser host
//!
//! The page owns rendering, audio and haptics. It forwards input events here,
//! calls `frame` from `requestAnimationFrame` with `performance.now()`, and
//! reads back a JSON snapshot plus the events raised since the last frame.

use wasm_bindgen::prelude::*;

use crate::input::{HoldGauge, InputProvider, SensorTilt};
use crate::sim::{GameSession, SeededDelays, tick};
use crate::tuning::GameConfig;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen]
pub struct WebGame {
    session: GameSession,
    sensor: SensorTilt,
    gauge: HoldGauge,
}

#[wasm_bindgen]
impl WebGame {
    /// Seed comes from the page (e.g. `Date.now()`) so runs stay replayable
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> WebGame {
        WebGame {
            session: GameSession::new(seed as u64),
            sensor: SensorTilt::new(),
            gauge: HoldGauge::default(),
        }
    }

    /// Build from a JSON config; invalid config is reported to the page
    pub fn with_config(seed: f64, json: &str) -> Result<WebGame, JsValue> {
        let config = GameConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let session =
            GameSession::with_config(config, Box::new(SeededDelays::new(seed as u64)))
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WebGame {
            session,
            sensor: SensorTilt::new(),
            gauge: HoldGauge::default(),
        })
    }

    pub fn start(&mut self, now: f64) {
        self.session.start(now);
    }

    pub fn restart(&mut self, now: f64) {
        self.session.restart(now);
    }

    pub fn set_holding(&mut self, holding: bool, now: f64) {
        self.sensor.set_holding(holding);
        if holding {
            self.gauge.press(now);
        } else {
            self.gauge.release();
        }
    }

    pub fn on_motion(&mut self, x: f32, y: f32, z: f32) {
        self.sensor.on_motion(x, y, z);
    }

    pub fn on_orientation(&mut self, beta: Option<f32>, gamma: Option<f32>) {
        self.sensor.on_orientation(beta, gamma);
    }

    /// Returns true if the key was a tilt key
    pub fn on_key(&mut self, key: &str) -> bool {
        self.sensor.press_key(key)
    }

    /// Animation-frame entry point
    pub fn frame(&mut self, now: f64) {
        let input = self.sensor.snapshot();
        tick(&mut self.session, &input, now);
    }

    pub fn select_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        self.session
            .select_mode_by_name(mode)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Called by the page once its unlock gesture is detected
    pub fn unlock_hidden_mode(&mut self) {
        self.session.unlock_hidden_mode();
    }

    pub fn hidden_mode_unlocked(&self) -> bool {
        self.session.hidden_mode_unlocked()
    }

    pub fn available_modes(&self) -> Vec<String> {
        self.session
            .available_modes()
            .iter()
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn set_challenge_duration(&mut self, ms: f64) {
        self.session.override_challenge_duration(ms);
    }

    pub fn set_safe_zone_size(&mut self, px: f32) {
        self.session.override_safe_zone_size(px);
    }

    pub fn hold_gauge(&self, now: f64) -> f32 {
        self.gauge.fraction(now)
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot())
    }

    pub fn debug_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.debug_readout())
    }

    /// Events since the last call, oldest first
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.drain_events())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| {
        log::error!("Failed to serialize readout: {}", e);
        JsValue::from_str(&e.to_string())
    })
}
