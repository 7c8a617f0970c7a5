// Cantus: cellular-automaton score generator.
//
// Evolves a toroidal 1-D multi-state cellular automaton and reads its
// history as music: each grid cell becomes a timed event (a pitched note
// or a rest), row by row. The result is an ordered event sequence ready
// for a notation, MIDI, or engraving collaborator, plus the raw grid for
// plotting.
//
// Architecture:
// - expr.rs: restricted arithmetic evaluator for user-typed rule formulas
//   (sandboxed; the text is untrusted input)
// - rule.rs: rule-matrix construction from five strategies (deterministic,
//   threshold bands, random, functional, time-offset)
// - automaton.rs: toroidal grid evolution from a single live seed cell
// - pitch.rs: chromatic pitch classes and note-list rotation
// - rhythm.rs: time signatures, events, and duration assignment (fixed or
//   measure-aware randomized)
// - config.rs: serde configuration model, JSON loading, validation
// - score.rs: per-part pipeline orchestration and score assembly
//
// The whole pipeline is synchronous and pure. Randomness (random rule
// matrices, randomized rhythm) is injected and seedable, so a seeded
// configuration reproduces the same score on every run.

pub mod automaton;
pub mod config;
pub mod expr;
pub mod pitch;
pub mod rhythm;
pub mod rule;
pub mod score;
