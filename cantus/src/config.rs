// Data-driven score configuration.
//
// Everything a generation run needs lives in a `ScoreConfig`, loadable
// from JSON: score-wide metadata plus one `PartConfig` per part, each with
// its own automaton parameters, rule strategy, pitch settings, and rhythm
// policy. The library never reads configuration from anywhere else; the
// CLI loads a file (or uses the built-in demo) and hands the struct down.
//
// Validation is centralized here: `ScoreConfig::validate` (and the
// per-part/per-section helpers it calls) checks every structural
// precondition up front, so the pipeline proper can assume well-formed
// input. Violations are reported as `ConfigError`, never coerced.
//
// Each part carries an optional seed. A seeded part reproduces the same
// score on every run; an unseeded part draws from OS entropy.

use crate::automaton::AutomatonParams;
use crate::pitch::{OctaveMode, parse_pitch_class};
use crate::rhythm::{DEFAULT_DURATIONS, RhythmConfig, RhythmMode};
use crate::rule::RuleStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A structural problem with a configuration. Fatal to the call that
/// detected it.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Fewer than two cell states.
    TooFewStates(usize),
    /// More than 256 cell states (state values are stored as bytes).
    TooManyStates(usize),
    ZeroGenerations,
    ZeroLength,
    ZeroRadius,
    /// Seed cell outside the ring.
    SeedCellOutOfRange { initial_cell: usize, length: usize },
    /// Pitch-class name not in the chromatic cycle.
    UnknownPitchClass(String),
    /// A part's octave list is empty.
    EmptyOctaves,
    /// Time signature not of the form `N/D` with positive integers.
    BadTimeSignature(String),
    /// Randomized rhythm with no candidate durations.
    NoCandidateDurations,
    /// A duration that is zero or negative.
    NonPositiveDuration(f64),
    /// A score with no parts.
    NoParts,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooFewStates(n) => {
                write!(f, "need at least 2 states, got {n}")
            }
            ConfigError::TooManyStates(n) => {
                write!(f, "at most 256 states are supported, got {n}")
            }
            ConfigError::ZeroGenerations => write!(f, "generations must be at least 1"),
            ConfigError::ZeroLength => write!(f, "length must be at least 1"),
            ConfigError::ZeroRadius => write!(f, "neighborhood radius must be at least 1"),
            ConfigError::SeedCellOutOfRange {
                initial_cell,
                length,
            } => write!(
                f,
                "initial cell {initial_cell} is outside the ring of length {length}"
            ),
            ConfigError::UnknownPitchClass(name) => {
                write!(f, "unknown pitch class '{name}'")
            }
            ConfigError::EmptyOctaves => write!(f, "octave list must not be empty"),
            ConfigError::BadTimeSignature(text) => {
                write!(f, "time signature '{text}' is not of the form N/D")
            }
            ConfigError::NoCandidateDurations => {
                write!(f, "randomized rhythm needs at least one candidate duration")
            }
            ConfigError::NonPositiveDuration(d) => {
                write!(f, "durations must be positive, got {d}")
            }
            ConfigError::NoParts => write!(f, "score has no parts"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one part (one automaton, one staff).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    /// Display name, e.g. `"Flute 1"`.
    pub name: String,
    /// Pitch class the note list starts from.
    pub initial_note: String,
    /// Octaves assigned cyclically across the rotated chromatic cycle.
    pub octaves: Vec<i32>,
    /// Accepted for parity with existing front ends; inert (see pitch.rs).
    #[serde(default)]
    pub octave_mode: OctaveMode,
    pub automaton: AutomatonParams,
    #[serde(default)]
    pub rule: RuleStrategy,
    #[serde(default)]
    pub rhythm: RhythmConfig,
    /// Seed for this part's RNG (rule matrix and rhythm draws). `None`
    /// means OS entropy, a different score every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PartConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.automaton.validate()?;
        parse_pitch_class(&self.initial_note)?;
        if self.octaves.is_empty() {
            return Err(ConfigError::EmptyOctaves);
        }
        self.rhythm.time_signature()?;
        match &self.rhythm.mode {
            RhythmMode::Fixed { duration } => {
                if *duration <= 0.0 {
                    return Err(ConfigError::NonPositiveDuration(*duration));
                }
            }
            RhythmMode::Randomized { candidates } => {
                if candidates.is_empty() {
                    return Err(ConfigError::NoCandidateDurations);
                }
                for &duration in candidates {
                    if duration <= 0.0 {
                        return Err(ConfigError::NonPositiveDuration(duration));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for PartConfig {
    fn default() -> Self {
        PartConfig {
            name: "Part".to_string(),
            initial_note: "C".to_string(),
            octaves: vec![4],
            octave_mode: OctaveMode::default(),
            automaton: AutomatonParams::default(),
            rule: RuleStrategy::default(),
            rhythm: RhythmConfig::default(),
            seed: None,
        }
    }
}

/// A complete score configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_composer")]
    pub composer: String,
    #[serde(default = "default_tempo")]
    pub tempo_bpm: u32,
    pub parts: Vec<PartConfig>,
}

fn default_title() -> String {
    "Cellular Automaton Composition".to_string()
}

fn default_composer() -> String {
    "Algorithmic".to_string()
}

fn default_tempo() -> u32 {
    120
}

impl ScoreConfig {
    /// Check every part; a score needs at least one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parts.is_empty() {
            return Err(ConfigError::NoParts);
        }
        for part in &self.parts {
            part.validate()?;
        }
        Ok(())
    }

    /// Load a score configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let config: ScoreConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Built-in two-part demo: a deterministic flute melody over a
    /// threshold-ruled cello line with randomized durations. Seeded, so
    /// every run prints the same score.
    pub fn demo() -> Self {
        ScoreConfig {
            title: default_title(),
            composer: default_composer(),
            tempo_bpm: 120,
            parts: vec![
                PartConfig {
                    name: "Flute".to_string(),
                    initial_note: "C".to_string(),
                    octaves: vec![5, 6],
                    automaton: AutomatonParams {
                        num_states: 8,
                        generations: 30,
                        length: 40,
                        radius: 1,
                        initial_cell: 20,
                    },
                    seed: Some(2025),
                    ..PartConfig::default()
                },
                PartConfig {
                    name: "Violoncello".to_string(),
                    initial_note: "G".to_string(),
                    octaves: vec![2, 3],
                    automaton: AutomatonParams {
                        num_states: 8,
                        generations: 30,
                        length: 40,
                        radius: 2,
                        initial_cell: 12,
                    },
                    rule: RuleStrategy::Threshold {
                        thresholds: vec![3, 6],
                    },
                    rhythm: RhythmConfig {
                        mode: RhythmMode::Randomized {
                            candidates: DEFAULT_DURATIONS.to_vec(),
                        },
                        time_signature: "4/4".to_string(),
                    },
                    seed: Some(7),
                    ..PartConfig::default()
                },
            ],
        }
    }
}
