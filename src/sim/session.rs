//! Game session
//!
//! One owned object holds the state machine, the player's resources, the
//! background zone oscillation and the schedule. Every scheduled task goes
//! through a method here; nothing outside touches the fields.

use serde::{Deserialize, Serialize};

use super::balance::{BalanceOutcome, BalanceReadout, BalanceRun, ZoneBounds, ZoneOscillator};
use super::schedule::{DelaySource, Interval, SeededDelays};
use super::state::{Badge, GameEvent, GameState, PlayerStatus, Trigger, transition};
use super::tick::{Task, TickInput};
use crate::tuning::{ConfigError, DifficultyProfile, GameConfig, Mode, ModeError};

/// Fixed-rate tasks
#[derive(Debug, Clone)]
struct Timers {
    countdown: Interval,
    control: Interval,
    zone: Interval,
}

/// One-shot deadlines (ms). Cleared when the owning state is left.
#[derive(Debug, Clone, Default)]
struct Deadlines {
    cue: Option<f64>,
    preturn_end: Option<f64>,
    danger_end: Option<f64>,
}

/// Debug panel readout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugReadout {
    pub roll: Option<f32>,
    pub pitch: Option<f32>,
    pub mode: Mode,
    pub challenge_duration_ms: f64,
    pub safe_zone_size: f32,
}

/// Everything the presentation layer reads after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: GameState,
    pub badge: Badge,
    pub life: u8,
    pub distance: f32,
    pub progress: f32,
    pub timer: u32,
    pub mode: Mode,
    pub zone: ZoneBounds,
    pub balance: Option<BalanceReadout>,
}

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    mode: Mode,
    hidden_unlocked: bool,
    state: GameState,
    status: PlayerStatus,
    balance: Option<BalanceRun>,
    zone: ZoneOscillator,
    delays: Box<dyn DelaySource>,
    timers: Option<Timers>,
    deadlines: Deadlines,
    /// Last danger check, shared by the penalty and the freeze branch
    last_danger_check: Option<f64>,
    /// Outcome badge and the time it expires
    outcome_badge: Option<(Badge, f64)>,
    last_input: TickInput,
    /// Latest time seen (ms)
    clock: f64,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Default config with seeded cue delays
    pub fn new(seed: u64) -> Self {
        Self::build(GameConfig::default(), Box::new(SeededDelays::new(seed)))
    }

    /// Session for a caller-supplied config, rejected if it fails validation
    pub fn with_config(
        config: GameConfig,
        delays: Box<dyn DelaySource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, delays))
    }

    fn build(config: GameConfig, delays: Box<dyn DelaySource>) -> Self {
        let status = PlayerStatus::new(&config.rules);
        Self {
            config,
            mode: Mode::default(),
            hidden_unlocked: false,
            state: GameState::Idle,
            status,
            balance: None,
            zone: ZoneOscillator::default(),
            delays,
            timers: None,
            deadlines: Deadlines::default(),
            last_danger_check: None,
            outcome_badge: None,
            last_input: TickInput::default(),
            clock: 0.0,
            events: Vec::new(),
        }
    }

    // === Readouts ===

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Profile for the mode selected right now
    pub fn profile(&self) -> &DifficultyProfile {
        self.config.difficulty.get(self.mode)
    }

    /// Current target zone for the selected mode
    pub fn zone(&self) -> ZoneBounds {
        self.zone.bounds(self.profile().safe_zone_size, self.config.track_width)
    }

    pub fn zone_phase(&self) -> f32 {
        self.zone.phase()
    }

    /// Tracker readout while a balance run is active
    pub fn balance_readout(&self) -> Option<BalanceReadout> {
        self.balance.as_ref().and_then(BalanceRun::readout)
    }

    pub fn badge(&self) -> Badge {
        match self.state {
            GameState::Idle => Badge::Idle,
            GameState::Safe => match self.outcome_badge {
                Some((badge, until)) if self.clock < until => badge,
                _ => Badge::Safe,
            },
            GameState::PreTurn => Badge::Warning,
            GameState::Danger => Badge::Danger,
            GameState::Balance => Badge::Balance,
            GameState::Finish => Badge::Finish,
        }
    }

    pub fn debug_readout(&self) -> DebugReadout {
        let profile = self.profile();
        DebugReadout {
            roll: self.last_input.roll,
            pitch: self.last_input.pitch,
            mode: self.mode,
            challenge_duration_ms: profile.challenge_duration_ms,
            safe_zone_size: profile.safe_zone_size,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            badge: self.badge(),
            life: self.status.life,
            distance: self.status.distance,
            progress: self.status.progress,
            timer: self.status.timer,
            mode: self.mode,
            zone: self.zone(),
            balance: self.balance_readout(),
        }
    }

    /// Pending events, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Mode and debug overrides ===

    pub fn hidden_mode_unlocked(&self) -> bool {
        self.hidden_unlocked
    }

    /// Selectable modes in menu order
    pub fn available_modes(&self) -> Vec<Mode> {
        let mut modes = Mode::VISIBLE.to_vec();
        if self.hidden_unlocked {
            modes.push(Mode::Hell);
        }
        modes
    }

    /// Make the hidden mode selectable. Repeated unlocks are ignored.
    pub fn unlock_hidden_mode(&mut self) {
        if !self.hidden_unlocked {
            self.hidden_unlocked = true;
            log::info!("Hidden mode unlocked");
            self.events.push(GameEvent::HiddenModeUnlocked);
        }
    }

    /// Switch difficulty. Takes effect on the next use, including a running challenge.
    pub fn select_mode(&mut self, mode: Mode) -> Result<(), ModeError> {
        if mode.is_hidden() && !self.hidden_unlocked {
            return Err(ModeError::Locked(mode));
        }
        if mode != self.mode {
            log::info!("Mode {} -> {}", self.mode, mode);
            self.mode = mode;
            self.events.push(GameEvent::ModeChanged { mode });
        }
        Ok(())
    }

    pub fn select_mode_by_name(&mut self, name: &str) -> Result<(), ModeError> {
        self.select_mode(name.parse()?)
    }

    /// Debug override of the selected mode's challenge duration
    pub fn override_challenge_duration(&mut self, ms: f64) {
        let mode = self.mode;
        self.config.difficulty.get_mut(mode).override_duration(ms);
    }

    /// Debug override of the selected mode's zone width
    pub fn override_safe_zone_size(&mut self, px: f32) {
        let mode = self.mode;
        self.config.difficulty.get_mut(mode).override_zone_size(px);
    }

    // === Lifecycle ===

    /// Leave Idle and start the schedule
    pub fn start(&mut self, now: f64) {
        if self.state != GameState::Idle {
            log::debug!("start ignored in {}", self.state.as_str());
            return;
        }
        self.observe(now);
        self.ensure_timers(now);
        if let Some(timers) = self.timers.as_mut() {
            timers.countdown = Interval::starting_at(self.config.rules.countdown_period_ms, now);
        }
        self.apply(Trigger::Start, now);
        self.schedule_cue(now);
    }

    /// Fresh resources and back to Safe. The zone keeps oscillating from where it is.
    pub fn restart(&mut self, now: f64) {
        self.observe(now);
        self.ensure_timers(now);
        self.status = PlayerStatus::new(&self.config.rules);
        self.deadlines = Deadlines::default();
        self.last_danger_check = None;
        self.outcome_badge = None;
        if let Some(timers) = self.timers.as_mut() {
            timers.countdown = Interval::starting_at(self.config.rules.countdown_period_ms, now);
        }
        self.apply(Trigger::Restart, now);
        self.schedule_cue(now);
        log::info!("Session restarted ({} mode)", self.mode);
    }

    // === Scheduled tasks ===

    /// Per-frame update: movement while holding, and balance sampling
    pub fn frame(&mut self, input: &TickInput, now: f64) {
        self.observe(now);
        self.last_input = *input;

        match self.state {
            GameState::Safe if input.holding => {
                self.status.advance(self.config.rules.move_step);
                self.check_terminal(now);
            }
            GameState::Balance => self.sample_balance(input, now),
            _ => {}
        }
    }

    /// 20ms task: hold-to-progress and the debounced danger check
    pub fn control_step(&mut self, input: &TickInput, now: f64) {
        self.observe(now);

        match self.state {
            GameState::Safe if input.holding => {
                let step = self.config.rules.progress_step_for(self.mode);
                self.status.add_progress(step);
                self.check_terminal(now);
            }
            GameState::Danger => {
                let debounce = self.config.rules.danger_debounce_ms;
                if self.last_danger_check.is_some_and(|last| now - last < debounce) {
                    return;
                }
                self.last_danger_check = Some(now);

                if input.holding {
                    self.status.lose_life();
                    log::warn!("Caught moving during danger (life {})", self.status.life);
                    self.events.push(GameEvent::DangerPenalty {
                        life: self.status.life,
                    });
                    if !self.check_terminal(now) {
                        self.apply(Trigger::CaughtMoving, now);
                    }
                } else {
                    self.apply(Trigger::Froze, now);
                }
            }
            _ => {}
        }
    }

    /// 1000ms task: HUD countdown
    pub fn countdown_step(&mut self) {
        if self.state.is_live() {
            self.status.count_down();
        }
    }

    /// 60ms task: background zone oscillation, runs in every state
    pub fn zone_step(&mut self) {
        self.zone.advance(self.config.rules.zone_phase_step);
    }

    /// Randomized cue: Safe goes to PreTurn, other states just wait for the next cue
    pub fn fire_cue(&mut self, now: f64) {
        self.observe(now);
        self.deadlines.cue = None;
        if !self.state.is_live() {
            return;
        }
        self.schedule_cue(now);
        self.apply(Trigger::DangerCue, now);
    }

    pub fn end_preturn(&mut self, now: f64) {
        self.observe(now);
        self.deadlines.preturn_end = None;
        self.apply(Trigger::PreTurnElapsed, now);
    }

    pub fn end_danger_grace(&mut self, now: f64) {
        self.observe(now);
        self.deadlines.danger_end = None;
        self.apply(Trigger::DangerGraceElapsed, now);
    }

    // === Scheduling ===

    pub(crate) fn ensure_timers(&mut self, now: f64) {
        if self.timers.is_none() {
            let rules = &self.config.rules;
            self.timers = Some(Timers {
                countdown: Interval::starting_at(rules.countdown_period_ms, now),
                control: Interval::starting_at(rules.control_period_ms, now),
                zone: Interval::starting_at(rules.zone_period_ms, now),
            });
        }
    }

    /// Earliest task due at or before `now`; ties go to the lower `Task`
    pub(crate) fn next_task(&self, now: f64) -> Option<(Task, f64)> {
        let timers = self.timers.as_ref()?;
        [
            (Task::DangerCue, self.deadlines.cue),
            (Task::PreTurnEnd, self.deadlines.preturn_end),
            (Task::DangerGraceEnd, self.deadlines.danger_end),
            (Task::Control, Some(timers.control.next_due())),
            (Task::Zone, Some(timers.zone.next_due())),
            (Task::Countdown, Some(timers.countdown.next_due())),
        ]
        .into_iter()
        .filter_map(|(task, at)| at.filter(|&at| at <= now).map(|at| (task, at)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }

    pub(crate) fn run_task(&mut self, task: Task, at: f64, input: &TickInput) {
        match task {
            Task::DangerCue => self.fire_cue(at),
            Task::PreTurnEnd => self.end_preturn(at),
            Task::DangerGraceEnd => self.end_danger_grace(at),
            Task::Control => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.control.fire();
                }
                self.control_step(input, at);
            }
            Task::Zone => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.zone.fire();
                }
                self.zone_step();
            }
            Task::Countdown => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.countdown.fire();
                }
                self.countdown_step();
            }
        }
    }

    /// Drop missed fixed-rate firings after a long stall
    pub(crate) fn skip_missed(&mut self, now: f64) {
        if let Some(timers) = self.timers.as_mut() {
            timers.countdown.skip_to(now);
            timers.control.skip_to(now);
            timers.zone.skip_to(now);
            log::debug!("Control task skipped ahead, {}", timers.control);
        }
    }

    fn schedule_cue(&mut self, now: f64) {
        let rules = &self.config.rules;
        let delay = self
            .delays
            .next_delay_ms(rules.cue_delay_min_ms, rules.cue_delay_max_ms);
        log::debug!("Next danger cue in {:.0}ms", delay);
        self.deadlines.cue = Some(now + delay);
    }

    fn observe(&mut self, now: f64) {
        self.clock = self.clock.max(now);
    }

    // === Transitions ===

    /// Run a trigger through the transition table and the enter hooks
    fn apply(&mut self, trigger: Trigger, now: f64) -> bool {
        let from = self.state;
        let Some(to) = transition(from, trigger) else {
            return false;
        };
        self.state = to;

        // Leaving a state drops whatever it owned
        if to != GameState::PreTurn {
            self.deadlines.preturn_end = None;
        }
        if to != GameState::Danger {
            self.deadlines.danger_end = None;
        }
        if to != GameState::Balance {
            self.balance = None;
        }

        if from == to {
            return true;
        }

        match to {
            GameState::PreTurn => {
                self.deadlines.preturn_end = Some(now + self.config.rules.preturn_ms);
            }
            GameState::Danger => {
                self.deadlines.danger_end = Some(now + self.config.rules.danger_grace_ms);
            }
            GameState::Balance => {
                self.balance = Some(BalanceRun::start(now));
            }
            GameState::Finish => {
                self.deadlines = Deadlines::default();
            }
            GameState::Idle | GameState::Safe => {}
        }

        log::info!("State {} -> {} ({:?})", from.as_str(), to.as_str(), trigger);
        self.events.push(GameEvent::StateChanged { from, to });
        if to == GameState::Finish {
            log::info!(
                "Finished: life {}, distance {:.1}, progress {:.1}",
                self.status.life,
                self.status.distance,
                self.status.progress
            );
            self.events.push(GameEvent::Finished);
        }
        true
    }

    /// Finish on exhausted life or a reached goal. Returns true if it ended the run.
    fn check_terminal(&mut self, now: f64) -> bool {
        if self.state.is_live() && (self.status.is_exhausted() || self.status.reached_goal()) {
            return self.apply(Trigger::Terminal, now);
        }
        false
    }

    fn sample_balance(&mut self, input: &TickInput, now: f64) {
        let zone = self.zone();
        let profile = *self.profile();
        let grace = self.config.rules.balance_grace_ms;
        let Some(run) = self.balance.as_mut() else {
            return;
        };

        // Without a tilt reading the run can only time out
        let outcome = match input.roll {
            Some(roll) => run.sample(roll, zone, &profile, grace, now),
            None => run.expire(zone, &profile, grace, now),
        };
        if let Some(outcome) = outcome {
            self.resolve_balance(outcome, now);
        }
    }

    fn resolve_balance(&mut self, outcome: BalanceOutcome, now: f64) {
        let rules = &self.config.rules;
        match outcome {
            BalanceOutcome::Success => {
                self.status.advance(rules.success_reward);
                self.outcome_badge = Some((Badge::Success, now + rules.success_badge_ms));
                log::info!("Balance success (distance {:.1})", self.status.distance);
                self.events.push(GameEvent::BalanceSuccess);
            }
            BalanceOutcome::Failure => {
                self.status.fall_back(rules.failure_penalty, rules.max_distance);
                self.status.lose_life();
                self.outcome_badge = Some((Badge::Failure, now + rules.failure_badge_ms));
                log::info!(
                    "Balance failed (life {}, distance {:.1})",
                    self.status.life,
                    self.status.distance
                );
                self.events.push(GameEvent::BalanceFailure);
            }
        }

        if !self.check_terminal(now) {
            self.apply(Trigger::BalanceResolved, now);
        }
    }
}
