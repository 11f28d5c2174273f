use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Ground truth for a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiddenCell {
    Mine,
    /// Safe cell with the number of mines among its neighbors.
    Clear(u8),
}

impl HiddenCell {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Clear(0))
    }
}

/// Mine layout of one episode with the adjacency counts precomputed. Never mutated once built.
///
/// Serialized as the bare mine mask, the counts are rebuilt and checked on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Array2<bool>", into = "Array2<bool>")]
pub struct HiddenBoard {
    mine_mask: Array2<bool>,
    adjacency: Array2<u8>,
    mine_count: CellCount,
}

impl HiddenBoard {
    /// Builds a board from a mine mask, which must have fewer mines than cells.
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (rows, cols) = checked_size(mine_mask.dim())?;

        // at most Coord::MAX squared, which fits in a CellCount
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        EnvConfig::new((rows, cols), mine_count)?;

        let adjacency = Array2::from_shape_fn(mine_mask.dim(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            mine_mask
                .iter_neighbors(coords)
                .filter(|&pos| mine_mask[pos.to_nd_index()])
                .count() as u8
        });

        Ok(Self {
            mine_mask,
            adjacency,
            mine_count,
        })
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let (rows, cols) = size;
        if rows == 0 || cols == 0 {
            return Err(EnvError::InvalidDimensions { rows, cols });
        }

        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(EnvError::InvalidCoords(coords));
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.mine_mask.dim();
        (rows as Coord, cols as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len() as CellCount
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size())
    }

    /// Panics when `coords` is out of bounds, see [`HiddenBoard::contains`].
    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self.mine_mask[coords.to_nd_index()]
    }

    /// Panics when `coords` is out of bounds, see [`HiddenBoard::contains`].
    pub fn cell(&self, coords: Coord2) -> HiddenCell {
        if self.contains_mine(coords) {
            HiddenCell::Mine
        } else {
            HiddenCell::Clear(self.adjacent_mine_count(coords))
        }
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.adjacency[coords.to_nd_index()]
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_neighbors(coords)
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    pub fn mine_mask(&self) -> &Array2<bool> {
        &self.mine_mask
    }
}

impl TryFrom<Array2<bool>> for HiddenBoard {
    type Error = EnvError;

    fn try_from(mine_mask: Array2<bool>) -> Result<Self> {
        Self::from_mine_mask(mine_mask)
    }
}

impl From<HiddenBoard> for Array2<bool> {
    fn from(board: HiddenBoard) -> Self {
        board.mine_mask
    }
}

pub trait BoardGenerator {
    fn generate(self, config: &EnvConfig) -> Result<HiddenBoard>;
}

/// Places mines uniformly at random without replacement, every layout with the requested mine count being equally
/// likely.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: &EnvConfig) -> Result<HiddenBoard> {
        use rand::prelude::*;
        use rand::rngs::SmallRng;

        config.validate()?;

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut free_cells = config.total_cells();
        let mut rng = SmallRng::seed_from_u64(self.seed);

        for _ in 0..config.mines {
            // pick the n-th free cell, skipping over the ones already taken
            let mut place: CellCount = rng.random_range(0..free_cells);
            for cell in mines.iter_mut() {
                if *cell {
                    continue;
                }
                if place == 0 {
                    *cell = true;
                    break;
                }
                place -= 1;
            }
            free_cells -= 1;
        }

        log::trace!(
            "Generated {}x{} board with {} mines from seed {}",
            config.rows(),
            config.cols(),
            config.mines,
            self.seed
        );
        HiddenBoard::from_mine_mask(mines)
    }
}
