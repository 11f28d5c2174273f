#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use action::*;
pub use board::*;
pub use env::*;
pub use error::*;
pub use observation::*;
pub use reveal::*;
pub use types::*;

mod action;
mod board;
mod env;
mod error;
mod observation;
mod reveal;
mod types;

/// Reward values handed out by [`Env::step`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Revealing the last safe cell.
    pub win: f32,
    /// Stepping on a mine.
    pub loss: f32,
    /// Targeting a cell that is already revealed or flagged.
    pub repeat: f32,
    /// Revealing a numbered cell.
    pub reveal: f32,
    /// Revealing a zero cell, which opens up its whole region.
    pub open_region: f32,
}

impl RewardConfig {
    pub const DEFAULT: Self = Self {
        win: 1000.0,
        loss: -10.0,
        repeat: -1000.0,
        reveal: 1.0,
        open_region: 2.0,
    };
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Board shape as `(rows, cols)`.
    pub size: Coord2,
    pub mines: CellCount,
    /// Seed for the first episode, later episodes draw their seeds from it unless `reset` is given one.
    pub seed: Option<u64>,
    pub rewards: RewardConfig,
}

impl EnvConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self {
            size,
            mines,
            seed: None,
            rewards: RewardConfig::DEFAULT,
        }
    }

    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((16, 30), 99)
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_rewards(self, rewards: RewardConfig) -> Self {
        Self { rewards, ..self }
    }

    /// Checks the invariants [`EnvConfig::new`] enforces, for values built by hand or deserialized.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.size;
        if rows == 0 || cols == 0 {
            return Err(EnvError::InvalidDimensions { rows, cols });
        }

        let cells = self.total_cells();
        if self.mines >= cells {
            return Err(EnvError::TooManyMines {
                mines: self.mines,
                cells,
            });
        }

        Ok(())
    }

    pub const fn rows(&self) -> Coord {
        self.size.0
    }

    pub const fn cols(&self) -> Coord {
        self.size.1
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }

    pub const fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.size)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::beginner()
    }
}
