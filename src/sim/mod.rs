//! Deterministic game session
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes from the host, never from a clock read here
//! - Seeded or scripted delays only
//! - No rendering, audio or platform dependencies

pub mod balance;
pub mod schedule;
pub mod session;
pub mod state;
pub mod tick;

pub use balance::{BalanceOutcome, BalanceReadout, BalanceRun, ZoneBounds, ZoneOscillator};
pub use schedule::{DelaySource, FixedDelays, Interval, SeededDelays};
pub use session::{DebugReadout, GameSession, Snapshot};
pub use state::{Badge, GameEvent, GameState, PlayerStatus, Trigger, transition};
pub use tick::{Task, TickInput, tick};
