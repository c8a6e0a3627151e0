//! Game configuration: fret range, string range and round timing.
//!
//! Values are validated here, at the boundary. The round state machine only
//! ever sees a `Configuration` that passed `validate`.

use crate::error::{FretError, FretResult};
use crate::types::{RESOLVE_DELAY_MS, ROUND_SECONDS, STRING_COUNT};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fret lengths offered by the game.
pub const SUPPORTED_FRET_LENGTHS: [u8; 5] = [5, 12, 15, 22, 24];

/// Which part of the neck a round quizzes.
///
/// Strings are numbered from the high E (1) to the low E (6), so
/// `start_string >= end_string` spans from the lower-pitched string upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub fret_length: u8,
    pub start_string: u8,
    pub end_string: u8,
}

impl Configuration {
    pub fn new(fret_length: u8, start_string: u8, end_string: u8) -> FretResult<Self> {
        let config = Self {
            fret_length,
            start_string,
            end_string,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FretResult<()> {
        if !SUPPORTED_FRET_LENGTHS.contains(&self.fret_length) {
            return Err(FretError::InvalidConfiguration {
                field: "fret_length",
                value: self.fret_length as i64,
                reason: format!("expected one of {:?}", SUPPORTED_FRET_LENGTHS),
            });
        }
        for (field, value) in [
            ("start_string", self.start_string),
            ("end_string", self.end_string),
        ] {
            if !(1..=STRING_COUNT).contains(&value) {
                return Err(FretError::InvalidConfiguration {
                    field,
                    value: value as i64,
                    reason: format!("expected 1-{}", STRING_COUNT),
                });
            }
        }
        if self.start_string < self.end_string {
            return Err(FretError::InvalidConfiguration {
                field: "end_string",
                value: self.end_string as i64,
                reason: format!("must not exceed start_string {}", self.start_string),
            });
        }
        Ok(())
    }

    pub fn with_fret_length(self, fret_length: u8) -> FretResult<Self> {
        Self::new(fret_length, self.start_string, self.end_string)
    }

    pub fn with_strings(self, start_string: u8, end_string: u8) -> FretResult<Self> {
        Self::new(self.fret_length, start_string, end_string)
    }

    /// Load from a JSON file. Returns None if the file is absent, malformed
    /// or describes an unsupported range.
    pub fn load(path: &Path) -> Option<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                warn!("Cannot read config file {:?}: {}", path, e);
                return None;
            }
        };
        let config: Self = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to parse config file {:?}: {}", path, e);
                return None;
            }
        };
        match config.validate() {
            Ok(()) => {
                info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", path, e);
                None
            }
        }
    }
}

impl Default for Configuration {
    /// All six strings, first twelve frets.
    fn default() -> Self {
        Self {
            fret_length: 12,
            start_string: STRING_COUNT,
            end_string: 1,
        }
    }
}

/// Durations that drive a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    pub round_seconds: u32,
    /// Countdown period; one tick removes one second from the clock.
    pub tick: Duration,
    /// How long a guess result stays on screen before the next prompt.
    pub resolve_delay: Duration,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            round_seconds: ROUND_SECONDS,
            tick: Duration::from_secs(1),
            resolve_delay: Duration::from_millis(RESOLVE_DELAY_MS),
        }
    }
}
