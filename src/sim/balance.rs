//! Balance challenge
//!
//! The tilt reading is mapped onto a 1-D track and has to sit inside a moving
//! target zone once the challenge duration has passed. Leaving the zone is never
//! an immediate failure; a run only fails when the grace window after the
//! duration runs out.

use serde::{Deserialize, Serialize};

use crate::consts::MARKER_HALF_WIDTH;
use crate::roll_to_track;
use crate::tuning::DifficultyProfile;

/// Target zone in tracking space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub left: f32,
    pub width: f32,
    pub track_width: f32,
}

impl ZoneBounds {
    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn center(&self) -> f32 {
        self.left + self.width / 2.0
    }

    /// Inclusive on both edges
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right()
    }
}

/// Background oscillation of the target zone.
///
/// The phase belongs to the session, not to a run, so a new challenge picks the
/// zone up wherever it currently is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneOscillator {
    phase: f32,
}

impl ZoneOscillator {
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn advance(&mut self, step: f32) {
        self.phase += step;
    }

    /// Zone position for the current phase, kept inside the track
    pub fn bounds(&self, zone_width: f32, track_width: f32) -> ZoneBounds {
        let left = (track_width - zone_width) / 2.0 + self.phase.sin() * (track_width / 4.0);
        ZoneBounds {
            // Not `clamp`: a zone wider than the track pins to the left edge
            left: left.min(track_width - zone_width).max(0.0),
            width: zone_width,
            track_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceOutcome {
    Success,
    Failure,
}

/// Per-frame readout for the tracker visuals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReadout {
    pub zone: ZoneBounds,
    /// Mapped tilt position in tracking space
    pub tracker_x: f32,
    /// Left edge of the tracker marker, kept on screen
    pub marker_left: f32,
    pub elapsed_ms: f64,
}

/// One balance challenge, created on entering Balance and dropped on resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRun {
    started_at: f64,
    elapsed_ms: f64,
    tracker_x: f32,
    zone: Option<ZoneBounds>,
    outcome: Option<BalanceOutcome>,
}

impl BalanceRun {
    pub fn start(now: f64) -> Self {
        Self {
            started_at: now,
            elapsed_ms: 0.0,
            tracker_x: 0.0,
            zone: None,
            outcome: None,
        }
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn outcome(&self) -> Option<BalanceOutcome> {
        self.outcome
    }

    /// Evaluate one frame.
    ///
    /// The profile and zone are passed in on every call so live overrides apply
    /// without restarting the run. Returns the outcome on the resolving call only.
    pub fn sample(
        &mut self,
        roll: f32,
        zone: ZoneBounds,
        profile: &DifficultyProfile,
        grace_ms: f64,
        now: f64,
    ) -> Option<BalanceOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        self.elapsed_ms = (now - self.started_at).max(0.0);
        self.tracker_x = roll_to_track(roll, zone.track_width);
        self.zone = Some(zone);

        let duration = profile.challenge_duration_ms.max(0.0);
        let outcome = if zone.contains(self.tracker_x) && self.elapsed_ms >= duration {
            BalanceOutcome::Success
        } else if self.elapsed_ms > duration + grace_ms {
            BalanceOutcome::Failure
        } else {
            return None;
        };

        self.outcome = Some(outcome);
        Some(outcome)
    }

    /// Evaluate a frame with no tilt reading. The tracker rests at the track
    /// centre and cannot score, so the run resolves only through the timeout.
    pub fn expire(
        &mut self,
        zone: ZoneBounds,
        profile: &DifficultyProfile,
        grace_ms: f64,
        now: f64,
    ) -> Option<BalanceOutcome> {
        if self.outcome.is_some() {
            return None;
        }

        self.elapsed_ms = (now - self.started_at).max(0.0);
        self.tracker_x = zone.track_width / 2.0;
        self.zone = Some(zone);

        if self.elapsed_ms > profile.challenge_duration_ms.max(0.0) + grace_ms {
            self.outcome = Some(BalanceOutcome::Failure);
            return self.outcome;
        }
        None
    }

    /// Readout from the last sample; `None` before the first sample
    pub fn readout(&self) -> Option<BalanceReadout> {
        self.zone.map(|zone| BalanceReadout {
            zone,
            tracker_x: self.tracker_x,
            marker_left: (self.tracker_x - MARKER_HALF_WIDTH)
                .max(0.0)
                .min(zone.track_width - MARKER_HALF_WIDTH),
            elapsed_ms: self.elapsed_ms,
        })
    }
}
