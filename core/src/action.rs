use serde::{Deserialize, Serialize};

use crate::*;

/// Discrete action space with one action per cell, numbered row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    size: Coord2,
}

impl ActionSpace {
    pub const fn new(size: Coord2) -> Self {
        Self { size }
    }

    pub const fn size(&self) -> Coord2 {
        self.size
    }

    /// Number of actions, `rows * cols`.
    pub const fn n(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn contains(&self, action: usize) -> bool {
        action < self.n() as usize
    }

    /// Maps `action` to `(action / cols, action % cols)`.
    pub fn decode(&self, action: usize) -> Result<Coord2> {
        if !self.contains(action) {
            return Err(EnvError::InvalidAction {
                action,
                cells: self.n(),
            });
        }

        let cols = usize::from(self.size.1);
        // bounded by rows and cols respectively, both of which are Coord
        Ok(((action / cols) as Coord, (action % cols) as Coord))
    }

    pub fn encode(&self, coords: Coord2) -> Result<usize> {
        let action = usize::from(coords.0) * usize::from(self.size.1) + usize::from(coords.1);
        if in_bounds(coords, self.size) {
            Ok(action)
        } else {
            Err(EnvError::InvalidAction {
                action,
                cells: self.n(),
            })
        }
    }
}
