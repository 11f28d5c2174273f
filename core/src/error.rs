use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCount, Coord, Coord2};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("Invalid board dimensions {rows}x{cols}")]
    InvalidDimensions { rows: Coord, cols: Coord },
    #[error("Board of {rows}x{cols} cells is larger than the supported 255x255")]
    OversizedBoard { rows: usize, cols: usize },
    #[error("Mine coordinates {0:?} are outside of the board")]
    InvalidCoords(Coord2),
    #[error("Too many mines, requested {mines} but the board only has {cells} cells")]
    TooManyMines { mines: CellCount, cells: CellCount },
    #[error("Action {action} is outside of the action space 0..{cells}")]
    InvalidAction { action: usize, cells: CellCount },
    #[error("Episode already ended, reset before stepping again")]
    EpisodeFinished,
    #[error("No episode in progress, reset before stepping")]
    NotReset,
}

/// Coarse classification of [`EnvError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad dimensions or mine count, the environment cannot be built.
    Configuration,
    /// Action index outside the action space, the episode is left untouched.
    InvalidAction,
    /// `step` called without an active episode.
    InvalidState,
}

impl EnvError {
    pub const fn kind(self) -> ErrorKind {
        use EnvError::*;
        match self {
            InvalidDimensions { .. } | OversizedBoard { .. } | InvalidCoords(_) | TooManyMines { .. } => {
                ErrorKind::Configuration
            }
            InvalidAction { .. } => ErrorKind::InvalidAction,
            EpisodeFinished | NotReset => ErrorKind::InvalidState,
        }
    }
}

pub type Result<T> = core::result::Result<T, EnvError>;
