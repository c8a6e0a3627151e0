use crate::error::{FretError, FretResult};
use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Open-string pitches of a six-string guitar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub name: String,
    /// Open string pitches as MIDI note numbers.
    /// Index 0 = string 1 (high E).
    pub open_strings: [u8; 6],
}

/// MIDI number of A0, the origin of `CHROMATIC_SCALE` indexing.
const MIDI_A0: i32 = 21;

impl Tuning {
    /// Pitch-class index (into `CHROMATIC_SCALE`) of an open string.
    pub fn open_pitch_index(&self, string: u8) -> FretResult<usize> {
        let midi = self.open_midi(string, 0)?;
        Ok((midi as i32 - MIDI_A0).rem_euclid(12) as usize)
    }

    /// Note name sounding at a string and fret.
    ///
    /// Fret numbers are unbounded; the chromatic cycle wraps every 12 frets.
    pub fn note_at(&self, string: u8, fret: u8) -> FretResult<NoteName> {
        let open = self
            .open_pitch_index(string)
            .map_err(|_| FretError::InvalidPosition { string, fret })?;
        Ok(NoteName::from_index(open + fret as usize))
    }

    /// Sounding pitch of a position in Hz.
    pub fn pitch_hz(&self, position: FretPosition) -> FretResult<f64> {
        let open = self.open_midi(position.string, position.fret)?;
        Ok(midi_to_hz(open as f64 + position.fret as f64))
    }

    /// Build the target for a position: note name, pitch and a neutral label.
    pub fn target_at(&self, position: FretPosition) -> FretResult<TargetNote> {
        let note = self.note_at(position.string, position.fret)?;
        let hz = self.pitch_hz(position)?;
        Ok(TargetNote::new(position, note, hz))
    }

    /// Every position of all six strings between `fret_start` and
    /// `fret_length` inclusive, paired with its note name.
    pub fn note_map(&self, fret_start: u8, fret_length: u8) -> Vec<(FretPosition, NoteName)> {
        all_positions(STRING_COUNT, fret_length, fret_start)
            .into_iter()
            .filter_map(|p| self.note_at(p.string, p.fret).ok().map(|n| (p, n)))
            .collect()
    }

    fn open_midi(&self, string: u8, fret: u8) -> FretResult<u8> {
        if !(1..=STRING_COUNT).contains(&string) {
            return Err(FretError::InvalidPosition { string, fret });
        }
        Ok(self.open_strings[(string - 1) as usize])
    }
}

/// Every (string, fret) pair in the rectangle `1..=string_count` ×
/// `fret_start..=fret_length`. Strings ascend; frets ascend within a string.
pub fn all_positions(string_count: u8, fret_length: u8, fret_start: u8) -> Vec<FretPosition> {
    let mut positions = Vec::new();
    for string in 1..=string_count {
        for fret in fret_start..=fret_length {
            positions.push(FretPosition::new(string, fret));
        }
    }
    positions
}

/// Uniformly sample a quiz target: a string between `end_string` and
/// `start_string` (either order) and a fret in `1..=fret_length`.
/// Open strings are never chosen.
pub fn random_position<R: Rng + ?Sized>(
    start_string: u8,
    end_string: u8,
    fret_length: u8,
    rng: &mut R,
) -> FretPosition {
    let lo = start_string.min(end_string);
    let hi = start_string.max(end_string);
    let string = rng.gen_range(lo..=hi);
    let fret = rng.gen_range(1..=fret_length.max(1));
    FretPosition::new(string, fret)
}

/// Convert MIDI note number (fractional) to Hz. A4 = MIDI 69 = 440 Hz.
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// Standard guitar tuning, E A D G B E.
///
/// String 1 = high E (E4), string 6 = low E (E2):
///   1:E4  2:B3  3:G3  4:D3  5:A2  6:E2
pub fn standard_tuning() -> Tuning {
    Tuning {
        name: "Standard E".to_string(),
        //       str1  str2  str3  str4  str5  str6
        //       E4    B3    G3    D3    A2    E2
        open_strings: [64, 59, 55, 50, 45, 40],
    }
}
