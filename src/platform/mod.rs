//! Platform layer
//!
//! The browser facade wires host events (pointer hold, orientation, keys,
//! animation frames) into a session and hands readouts back as JSON.

#[cfg(target_arch = "wasm32")]
pub mod web;
