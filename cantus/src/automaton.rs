// Toroidal 1-D automaton evolution.
//
// The automaton is a ring of `length` cells, each holding a state in
// `[0, num_states)`. Evolution starts from a single live cell and applies
// the rule matrix generation by generation: a cell's next state is looked
// up from its current state and the sum of its neighbors within `radius`
// positions on either side (wrapping around the ring, excluding the cell
// itself), reduced modulo the state count.
//
// The grid is filled row by row into an owned buffer and handed to the
// caller as an immutable value; nothing observes it mid-evolution. The
// engine itself is fully deterministic: any randomness lives in the rule
// matrix, fixed before evolution begins.
//
// The grid is the source of truth for everything downstream: the rhythm
// mapper linearizes it into events, and a plotting collaborator can render
// it directly.

use crate::config::ConfigError;
use crate::rule::RuleMatrix;
use serde::{Deserialize, Serialize};

/// Structural parameters for one evolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonParams {
    /// Number of cell states. At least 2, at most 256.
    pub num_states: usize,
    /// Number of rows to evolve, including the seed row. At least 1.
    pub generations: usize,
    /// Ring size. At least 1.
    pub length: usize,
    /// Neighborhood reach on each side of a cell. At least 1.
    pub radius: usize,
    /// Position of the single live cell in the seed row. In `[0, length)`.
    pub initial_cell: usize,
}

impl AutomatonParams {
    /// Check the structural preconditions. Violations are fatal to the
    /// evolution call, never silently coerced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_states < 2 {
            return Err(ConfigError::TooFewStates(self.num_states));
        }
        if self.num_states > 256 {
            return Err(ConfigError::TooManyStates(self.num_states));
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if self.initial_cell >= self.length {
            return Err(ConfigError::SeedCellOutOfRange {
                initial_cell: self.initial_cell,
                length: self.length,
            });
        }
        Ok(())
    }
}

impl Default for AutomatonParams {
    fn default() -> Self {
        AutomatonParams {
            num_states: 8,
            generations: 20,
            length: 50,
            radius: 1,
            initial_cell: 25,
        }
    }
}

/// A completed evolution: `generations × length` states, immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    num_states: usize,
    rows: Vec<Vec<u8>>,
}

impl Grid {
    pub fn generations(&self) -> usize {
        self.rows.len()
    }

    pub fn length(&self) -> usize {
        self.rows[0].len()
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn cell(&self, generation: usize, position: usize) -> u8 {
        self.rows[generation][position]
    }

    pub fn row(&self, generation: usize) -> &[u8] {
        &self.rows[generation]
    }

    /// All cells in row-major order, the order the rhythm mapper reads.
    pub fn cells(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Compact text rendering for terminal inspection: one row per
    /// generation, `.` for the quiescent state, digits (then letters) for
    /// live states.
    pub fn summary(&self) -> String {
        let mut out = String::with_capacity(self.generations() * (self.length() + 1));
        for row in &self.rows {
            for &cell in row {
                if cell == 0 {
                    out.push('.');
                } else {
                    out.push(char::from_digit(u32::from(cell), 36).unwrap_or('#'));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Count live and quiescent cells.
    pub fn stats(&self) -> GridStats {
        let mut live = 0;
        let mut quiescent = 0;
        for cell in self.cells() {
            if cell == 0 {
                quiescent += 1;
            } else {
                live += 1;
            }
        }
        GridStats {
            generations: self.generations(),
            length: self.length(),
            live,
            quiescent,
        }
    }
}

/// Cell counts for a completed grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStats {
    pub generations: usize,
    pub length: usize,
    /// Cells in a nonzero state (these become notes).
    pub live: usize,
    /// Cells in state 0 (these become rests).
    pub quiescent: usize,
}

/// Evolve a grid from a single live seed cell.
///
/// The state count comes from the matrix; `params.num_states` governs
/// matrix construction and is range-checked here so the two cannot
/// disagree through the normal pipeline.
pub fn evolve(matrix: &RuleMatrix, params: &AutomatonParams) -> Result<Grid, ConfigError> {
    params.validate()?;
    let n = matrix.num_states();
    if n < 2 {
        return Err(ConfigError::TooFewStates(n));
    }

    let length = params.length;
    let mut rows: Vec<Vec<u8>> = Vec::with_capacity(params.generations);

    let mut seed_row = vec![0u8; length];
    seed_row[params.initial_cell] = 1;
    rows.push(seed_row);

    let radius = params.radius as i64;
    for generation in 1..params.generations {
        let prev = &rows[generation - 1];
        let mut row = vec![0u8; length];
        for (i, slot) in row.iter_mut().enumerate() {
            let mut neighbor_sum = 0usize;
            for offset in -radius..=radius {
                if offset == 0 {
                    continue;
                }
                let index = (i as i64 + offset).rem_euclid(length as i64) as usize;
                neighbor_sum += prev[index] as usize;
            }
            *slot = matrix.next_state(prev[i], neighbor_sum % n);
        }
        rows.push(row);
    }

    Ok(Grid {
        num_states: n,
        rows,
    })
}
