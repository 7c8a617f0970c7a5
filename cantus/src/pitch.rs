// Pitch classes and note-list construction.
//
// Automaton states are mapped to pitches through an ordered note list: one
// full chromatic rotation (12 entries) starting from a configured pitch
// class, each entry paired with an octave drawn cyclically from the
// configured octave list. State `v > 0` in the grid selects entry
// `(v - 1) mod 12`; state 0 is silence.
//
// Sharp spellings only (C, C#, D, ...): the names end users pick from and
// the names the note list reports back.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The chromatic pitch-class cycle, index 0 = C.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Map a pitch-class name to its index in the chromatic cycle.
pub fn parse_pitch_class(name: &str) -> Result<u8, ConfigError> {
    PITCH_CLASS_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u8)
        .ok_or_else(|| ConfigError::UnknownPitchClass(name.to_string()))
}

/// Name of a pitch class (reduced modulo 12).
pub fn pitch_class_name(pitch_class: u8) -> &'static str {
    PITCH_CLASS_NAMES[(pitch_class % 12) as usize]
}

/// A concrete pitch: pitch class plus octave, displayed as e.g. `D#4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLabel {
    /// Chromatic index, 0 = C … 11 = B.
    pub pitch_class: u8,
    /// Scientific octave number (octave 4 contains middle C).
    pub octave: i32,
}

impl NoteLabel {
    /// MIDI note number under the C4 = 60 convention. May fall outside
    /// the 0–127 MIDI range for extreme octaves; range policy belongs to
    /// the notation collaborator.
    pub fn midi_number(&self) -> i32 {
        (self.octave + 1) * 12 + i32::from(self.pitch_class % 12)
    }
}

impl fmt::Display for NoteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", pitch_class_name(self.pitch_class), self.octave)
    }
}

/// Octave assignment mode, kept in configuration for parity with existing
/// front ends. Assignment currently follows the octave list order alone;
/// this flag does not reorder anything (see DESIGN.md).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OctaveMode {
    #[default]
    Ascending,
    Descending,
    Interleaved,
}

/// Build the ordered note list: the chromatic cycle rotated to start at
/// `initial_pc`, with octaves assigned cyclically from `octaves`.
///
/// `octaves` must be non-empty; `ScoreConfig::validate` enforces this
/// before the pipeline reaches here.
pub fn build_note_list(initial_pc: u8, octaves: &[i32], mode: OctaveMode) -> Vec<NoteLabel> {
    assert!(!octaves.is_empty(), "octave list must not be empty");
    // The mode flag is accepted but inert: only the octave list order
    // affects assignment.
    let _ = mode;

    (0..12u8)
        .map(|i| NoteLabel {
            pitch_class: (initial_pc + i) % 12,
            octave: octaves[(i as usize) % octaves.len()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_starts_at_initial_note() {
        let d = parse_pitch_class("D").unwrap();
        let list = build_note_list(d, &[4], OctaveMode::Ascending);

        assert_eq!(list.len(), 12);
        let names: Vec<String> = list.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            [
                "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", "C4", "C#4"
            ]
        );
    }

    #[test]
    fn octaves_cycle_when_fewer_than_twelve() {
        let c = parse_pitch_class("C").unwrap();
        let list = build_note_list(c, &[5, 6], OctaveMode::Ascending);
        let octaves: Vec<i32> = list.iter().map(|n| n.octave).collect();
        assert_eq!(octaves, [5, 6, 5, 6, 5, 6, 5, 6, 5, 6, 5, 6]);
    }

    #[test]
    fn octave_mode_does_not_change_assignment() {
        let g = parse_pitch_class("G").unwrap();
        let ascending = build_note_list(g, &[3, 4, 5], OctaveMode::Ascending);
        let descending = build_note_list(g, &[3, 4, 5], OctaveMode::Descending);
        let interleaved = build_note_list(g, &[3, 4, 5], OctaveMode::Interleaved);
        assert_eq!(ascending, descending);
        assert_eq!(ascending, interleaved);
    }

    #[test]
    fn unknown_pitch_class_rejected() {
        assert_eq!(
            parse_pitch_class("H").unwrap_err(),
            ConfigError::UnknownPitchClass("H".into())
        );
        // Flat spellings are not in the cycle.
        assert_eq!(
            parse_pitch_class("Bb").unwrap_err(),
            ConfigError::UnknownPitchClass("Bb".into())
        );
    }

    #[test]
    fn midi_numbers_follow_c4_convention() {
        let c4 = NoteLabel {
            pitch_class: 0,
            octave: 4,
        };
        let a4 = NoteLabel {
            pitch_class: 9,
            octave: 4,
        };
        assert_eq!(c4.midi_number(), 60);
        assert_eq!(a4.midi_number(), 69);
    }
}
