//! Round state machine: Idle → Active → Ended → Idle.
//!
//! The round is pure state; it never sleeps or spawns. Time enters through
//! `tick` and `resolve`, which the game loop calls when the deadlines it
//! derived from `countdown()` and `pending()` expire. Every deferred action is
//! identified by a [`TaskId`]; leaving the Active state drops both ids, so a
//! callback that fires late carries an id the round no longer knows and is
//! ignored.

use crate::config::{Configuration, RoundTiming};
use crate::error::{FretError, FretResult};
use crate::fretboard::{random_position, Tuning};
use crate::types::*;
use log::{debug, info, warn};
use rand::Rng;
use rand_pcg::Pcg32;

/// Identity of a scheduled countdown or guess resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// What happens when a guess result has been shown long enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Correct guess: move on to a fresh target.
    NextTarget,
    /// Wrong guess: same target, back to the neutral label.
    Revert,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: TaskId,
    resolution: Resolution,
}

/// Redraws attempted to avoid repeating the previous target.
const MAX_REDRAWS: usize = 8;

pub struct Round<R: Rng = Pcg32> {
    config: Configuration,
    timing: RoundTiming,
    tuning: Tuning,
    state: RoundState,
    target: Option<TargetNote>,
    rng: R,
    /// Live countdown timer, Some only while Active.
    countdown: Option<TaskId>,
    /// Scheduled guess resolution, at most one.
    pending: Option<Pending>,
    next_task: u64,
}

impl<R: Rng> Round<R> {
    pub fn new(config: Configuration, timing: RoundTiming, tuning: Tuning, rng: R) -> Self {
        let mut state = RoundState::idle();
        state.seconds_remaining = timing.round_seconds;
        Self {
            config,
            timing,
            tuning,
            state,
            target: None,
            rng,
            countdown: None,
            pending: None,
            next_task: 0,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn timing(&self) -> &RoundTiming {
        &self.timing
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn target(&self) -> Option<&TargetNote> {
        self.target.as_ref()
    }

    /// Identity of the running countdown, if any.
    pub fn countdown(&self) -> Option<TaskId> {
        self.countdown
    }

    /// Identity and kind of the scheduled guess resolution, if any.
    pub fn pending(&self) -> Option<(TaskId, Resolution)> {
        self.pending.map(|p| (p.id, p.resolution))
    }

    /// Replace the configuration. Refused while a round is running.
    pub fn configure(&mut self, config: Configuration) -> FretResult<()> {
        if self.state.is_active() {
            return Err(FretError::RoundActive);
        }
        config.validate()?;
        debug!("Configuration → {:?}", config);
        self.config = config;
        Ok(())
    }

    /// Begin a round from any state. Resets score and clock, cancels any
    /// pending resolution and arms a single new countdown.
    pub fn start(&mut self) {
        self.pending = None;
        self.state = RoundState {
            status: RoundStatus::Active,
            score: 0,
            seconds_remaining: self.timing.round_seconds,
            timer_running: true,
            last_guess_correct: None,
            guesses: 0,
            misses: 0,
        };
        self.countdown = Some(self.next_task_id());
        self.target = None;
        self.draw_target();
        info!(
            "Round started: strings {}-{}, frets 1-{}, {}s",
            self.config.end_string,
            self.config.start_string,
            self.config.fret_length,
            self.timing.round_seconds
        );
    }

    /// One countdown step. Returns true if this tick ended the round.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_active() || !self.state.timer_running {
            return false;
        }
        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        debug!("Tick: {}s remaining", self.state.seconds_remaining);
        if self.state.seconds_remaining == 0 {
            self.end();
            return true;
        }
        false
    }

    /// Score a guess against the current target.
    ///
    /// Returns None (and changes nothing) when there is no target; otherwise
    /// whether the guess was correct. Text outside the note alphabet is a miss.
    pub fn guess(&mut self, candidate: &str) -> Option<bool> {
        if !self.state.is_active() {
            return None;
        }
        let target = self.target.as_mut()?;
        let correct = NoteName::parse(candidate) == Some(target.note);

        self.state.guesses += 1;
        self.state.last_guess_correct = Some(correct);
        let resolution = if correct {
            self.state.score += 1;
            target.mark(TargetLabel::Correct);
            Resolution::NextTarget
        } else {
            self.state.misses += 1;
            target.mark(TargetLabel::Incorrect);
            Resolution::Revert
        };
        debug!(
            "Guess {:?} for {} ({}): {}",
            candidate,
            target.position,
            target.note,
            if correct { "correct" } else { "wrong" }
        );

        // A new result supersedes any one still on screen.
        let id = self.next_task_id();
        self.pending = Some(Pending { id, resolution });
        Some(correct)
    }

    /// Apply a scheduled resolution. Ids that are no longer pending
    /// (superseded, or the round has moved on) are ignored.
    pub fn resolve(&mut self, id: TaskId) -> bool {
        let pending = match self.pending {
            Some(p) if p.id == id => p,
            _ => {
                debug!("Ignoring stale resolution {:?}", id);
                return false;
            }
        };
        self.pending = None;
        if !self.state.is_active() {
            return false;
        }
        match pending.resolution {
            Resolution::NextTarget => self.draw_target(),
            Resolution::Revert => {
                if let Some(t) = self.target.as_mut() {
                    t.mark(TargetLabel::Neutral);
                }
            }
        }
        self.state.last_guess_correct = None;
        true
    }

    /// Stop the round, keeping the score. Only meaningful while Active.
    pub fn end(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.state.status = RoundStatus::Ended;
        self.state.timer_running = false;
        self.countdown = None;
        self.pending = None;
        self.target = None;
        info!(
            "Round ended: score {} ({} guesses, {} wrong)",
            self.state.score, self.state.guesses, self.state.misses
        );
    }

    /// Return from Ended to Idle. The score stays visible until the next start.
    pub fn reset(&mut self) {
        if !self.state.is_ended() {
            return;
        }
        self.state.status = RoundStatus::Idle;
        self.state.last_guess_correct = None;
        self.target = None;
        debug!("Round reset");
    }

    fn draw_target(&mut self) {
        let previous = self.target.map(|t| t.position);
        let mut position = self.sample_position();
        for _ in 0..MAX_REDRAWS {
            if Some(position) != previous {
                break;
            }
            position = self.sample_position();
        }
        match self.tuning.target_at(position) {
            Ok(target) => {
                debug!("New target: {} ({})", position, target.note);
                self.target = Some(target);
            }
            Err(e) => {
                warn!("Cannot place target: {}", e);
                self.target = None;
            }
        }
    }

    fn sample_position(&mut self) -> FretPosition {
        random_position(
            self.config.start_string,
            self.config.end_string,
            self.config.fret_length,
            &mut self.rng,
        )
    }

    fn next_task_id(&mut self) -> TaskId {
        self.next_task += 1;
        TaskId(self.next_task)
    }
}
