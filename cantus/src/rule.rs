// Transition-rule construction for the automaton.
//
// A rule matrix is the automaton's complete transition function: entry
// `[s][k]` names the next state for a cell currently in state `s` whose
// neighborhood sum reduces to `k` modulo the state count. Five strategies
// build the table; all of them guarantee every entry lies in
// `[0, num_states)`, so the evolution engine never has to range-check.
//
// Construction is total. Strategies that can go wrong recover instead of
// failing: a broken formula falls back to the default combination
// `(state + neighbor_sum) % num_states`, and an unrecognized rule kind
// from a config file yields the all-zero matrix (musically degenerate,
// structurally valid).
//
// Randomness is injected: the `Random` strategy draws from the caller's
// RNG, so a seeded generator reproduces the same matrix.

use crate::expr::Expr;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How to build the transition table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleStrategy {
    /// `M[i][j] = (i + j) mod N`.
    #[default]
    Deterministic,
    /// Band the neighborhood sum: the first threshold `t` (1-based rank
    /// `r`) with `j < t` gives `M[i][j] = (i + r) mod N`; if no threshold
    /// exceeds `j`, the entry is `0`. An empty list yields the all-zero
    /// matrix.
    Threshold { thresholds: Vec<i64> },
    /// Every entry drawn uniformly from `[0, N)`.
    Random,
    /// Per-cell user formula over `state`, `neighbor_sum`, `num_states`
    /// (see expr.rs). Failures fall back to the default combination.
    Functional { expression: String },
    /// `M[i][j] = (i + j + time_step) mod N`. One static matrix; the
    /// offset does not advance during an evolution run.
    TimeVarying { time_step: i64 },
    /// Unrecognized rule kind in a config file. Builds the all-zero
    /// matrix rather than failing.
    #[serde(other)]
    Unknown,
}

/// Immutable `num_states × num_states` transition table.
///
/// Invariant: every entry is `< num_states`. Guaranteed at construction
/// for every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatrix {
    num_states: usize,
    rows: Vec<Vec<u8>>,
}

impl RuleMatrix {
    /// Build a transition table. Total: every strategy produces a valid
    /// matrix for any `num_states` in `1..=256`.
    pub fn build(num_states: usize, strategy: &RuleStrategy, rng: &mut impl Rng) -> RuleMatrix {
        match strategy {
            RuleStrategy::Deterministic => Self::from_fn(num_states, |i, j| i + j),
            RuleStrategy::Threshold { thresholds } => {
                let mut sorted = thresholds.clone();
                sorted.sort_unstable();
                Self::from_fn(num_states, |i, j| {
                    for (rank, &threshold) in sorted.iter().enumerate() {
                        if (j as i64) < threshold {
                            return i + rank + 1;
                        }
                    }
                    0
                })
            }
            RuleStrategy::Random => {
                let rows = (0..num_states)
                    .map(|_| {
                        (0..num_states)
                            .map(|_| rng.random_range(0..num_states) as u8)
                            .collect()
                    })
                    .collect();
                RuleMatrix { num_states, rows }
            }
            RuleStrategy::Functional { expression } => match Expr::parse(expression) {
                Ok(expr) => Self::from_fn(num_states, |i, j| {
                    expr.eval(i as i64, j as i64, num_states as i64)
                        .map(|v| v.rem_euclid(num_states as i64) as usize)
                        .unwrap_or(i + j)
                }),
                // Unparseable formula: the default combination applies to
                // the whole table.
                Err(_) => Self::from_fn(num_states, |i, j| i + j),
            },
            RuleStrategy::TimeVarying { time_step } => Self::from_fn(num_states, |i, j| {
                (i as i64 + j as i64 + time_step).rem_euclid(num_states as i64) as usize
            }),
            RuleStrategy::Unknown => RuleMatrix {
                num_states,
                rows: vec![vec![0; num_states]; num_states],
            },
        }
    }

    /// Fill the table from `f(i, j)`, reducing each value modulo the
    /// state count.
    fn from_fn(num_states: usize, f: impl Fn(usize, usize) -> usize) -> RuleMatrix {
        let rows = (0..num_states)
            .map(|i| {
                (0..num_states)
                    .map(|j| (f(i, j) % num_states) as u8)
                    .collect()
            })
            .collect();
        RuleMatrix { num_states, rows }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Next state for a cell in `current` whose neighborhood sum reduces
    /// to `sum_mod`. Both indices must be `< num_states`.
    pub fn next_state(&self, current: u8, sum_mod: usize) -> u8 {
        self.rows[current as usize][sum_mod]
    }
}
