use core::fmt;
use core::ops::Index;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Per-cell boolean set over a board, used for the revealed and flagged cells of an episode. Serialized as the bare
/// grid, the count is rebuilt on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Array2<bool>", into = "Array2<bool>")]
pub struct CellMask {
    cells: Array2<bool>,
    count: CellCount,
}

impl CellMask {
    pub fn new(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
            count: 0,
        }
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.cells.dim();
        (rows as Coord, cols as Coord)
    }

    /// `false` for out of bounds coordinates.
    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size()) && self.cells[coords.to_nd_index()]
    }

    /// Adds `coords`, returning whether it was newly added. Out of bounds coordinates are ignored.
    pub fn insert(&mut self, coords: Coord2) -> bool {
        if !in_bounds(coords, self.size()) || self.cells[coords.to_nd_index()] {
            return false;
        }
        self.cells[coords.to_nd_index()] = true;
        self.count += 1;
        true
    }

    pub fn len(&self) -> CellCount {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.cells
            .indexed_iter()
            .filter(|&(_, &set)| set)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.cells
    }
}

impl TryFrom<Array2<bool>> for CellMask {
    type Error = EnvError;

    fn try_from(cells: Array2<bool>) -> Result<Self> {
        checked_size(cells.dim())?;
        // at most Coord::MAX squared, which fits in a CellCount
        let count = cells.iter().filter(|&&set| set).count() as CellCount;
        Ok(Self { cells, count })
    }
}

impl From<CellMask> for Array2<bool> {
    fn from(mask: CellMask) -> Self {
        mask.cells
    }
}

/// What the agent sees of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedCell {
    Hidden,
    Revealed(u8),
    /// The mine that ended the episode.
    MineHit,
}

impl ObservedCell {
    pub const HIDDEN_CODE: i8 = -1;
    pub const MINE_HIT_CODE: i8 = -2;

    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Integer encoding: `-1` hidden, `-2` mine hit, otherwise the adjacent mine count.
    pub const fn code(self) -> i8 {
        match self {
            Self::Hidden => Self::HIDDEN_CODE,
            Self::MineHit => Self::MINE_HIT_CODE,
            Self::Revealed(count) => count as i8,
        }
    }

    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            Self::HIDDEN_CODE => Some(Self::Hidden),
            Self::MINE_HIT_CODE => Some(Self::MineHit),
            0..=8 => Some(Self::Revealed(code as u8)),
            _ => None,
        }
    }

    const fn symbol(self) -> char {
        match self {
            Self::Hidden => '#',
            Self::MineHit => '*',
            Self::Revealed(0) => '.',
            Self::Revealed(count) => (b'0' + count) as char,
        }
    }
}

impl Default for ObservedCell {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Player-visible grid, always derived from a [`HiddenBoard`] and the revealed [`CellMask`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    cells: Array2<ObservedCell>,
}

impl Observation {
    /// Everything hidden, as seen right after a reset.
    pub fn hidden(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
        }
    }

    /// Unrevealed cells stay hidden, the revealed `hit_mine` shows as [`ObservedCell::MineHit`] and any other
    /// revealed cell shows its adjacent mine count.
    pub fn derive(board: &HiddenBoard, revealed: &CellMask, hit_mine: Option<Coord2>) -> Self {
        let cells = Array2::from_shape_fn(board.size().to_nd_index(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            if !revealed.contains(coords) {
                return ObservedCell::Hidden;
            }
            match board.cell(coords) {
                HiddenCell::Clear(count) if hit_mine != Some(coords) => ObservedCell::Revealed(count),
                // a revealed mine can only ever be the one that was hit
                _ => ObservedCell::MineHit,
            }
        });
        Self { cells }
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.cells.dim();
        (rows as Coord, cols as Coord)
    }

    pub fn cell_at(&self, coords: Coord2) -> ObservedCell {
        self.cells[coords.to_nd_index()]
    }

    pub fn cells(&self) -> &Array2<ObservedCell> {
        &self.cells
    }

    pub fn hidden_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_hidden()).count() as CellCount
    }

    pub fn to_codes(&self) -> Array2<i8> {
        self.cells.mapv(ObservedCell::code)
    }
}

impl Index<Coord2> for Observation {
    type Output = ObservedCell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Whether every safe cell of `board` is in `revealed`. Mines never need to be revealed.
pub fn is_won(board: &HiddenBoard, revealed: &CellMask) -> bool {
    board
        .mine_mask()
        .iter()
        .zip(revealed.as_array().iter())
        .all(|(&is_mine, &is_revealed)| is_mine || is_revealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn board() -> HiddenBoard {
        HiddenBoard::from_mine_coords((2, 3), &[(0, 0)]).unwrap()
    }

    #[test]
    fn mask_ignores_out_of_bounds_and_repeats() {
        let mut mask = CellMask::new((2, 2));

        assert!(mask.insert((1, 1)));
        assert!(!mask.insert((1, 1)));
        assert!(!mask.insert((2, 0)));
        assert!(!mask.contains((0, 5)));
        assert_eq!(mask.len(), 1);
    }

    #[test]
    fn mask_count_is_rebuilt_on_load() {
        let mut mask = CellMask::new((2, 2));
        mask.insert((0, 1));
        let mut json = serde_json::to_value(&mask).unwrap();
        assert!(json.get("count").is_none());
        json["data"] = serde_json::json!([true, true, false, true]);

        let restored: CellMask = serde_json::from_value(json).unwrap();

        assert_eq!(restored.len(), 3);
        assert!(restored.contains((1, 1)));
    }

    #[test]
    fn derive_hides_unrevealed_cells() {
        let board = board();
        let mut revealed = CellMask::new(board.size());
        revealed.insert((1, 1));

        let obs = Observation::derive(&board, &revealed, None);

        assert_eq!(obs[(1, 1)], ObservedCell::Revealed(1));
        assert_eq!(obs[(0, 0)], ObservedCell::Hidden);
        assert_eq!(obs[(1, 2)], ObservedCell::Hidden);
        assert_eq!(obs.hidden_count(), 5);
    }

    #[test]
    fn derive_marks_hit_mine() {
        let board = board();
        let mut revealed = CellMask::new(board.size());
        revealed.insert((0, 0));

        let obs = Observation::derive(&board, &revealed, Some((0, 0)));

        assert_eq!(obs[(0, 0)], ObservedCell::MineHit);
        assert_eq!(obs.to_codes()[[0, 0]], -2);
        assert_eq!(obs.to_codes()[[1, 2]], -1);
    }

    #[test]
    fn derive_is_pure() {
        let board = board();
        let mut revealed = CellMask::new(board.size());
        revealed.insert((0, 2));

        let first = Observation::derive(&board, &revealed, None);
        let second = Observation::derive(&board, &revealed, None);

        assert_eq!(first, second);
        assert_eq!(revealed.len(), 1);
    }

    #[test]
    fn won_only_when_every_safe_cell_is_revealed() {
        let board = board();
        let mut revealed = CellMask::new(board.size());
        for coords in [(0, 1), (0, 2), (1, 0), (1, 1)] {
            revealed.insert(coords);
        }
        assert!(!is_won(&board, &revealed));

        revealed.insert((1, 2));
        assert!(is_won(&board, &revealed));
        assert_eq!(revealed.len(), board.safe_cell_count());
    }

    #[test]
    fn codes_round_trip_through_cells() {
        for code in -2..=8 {
            assert_eq!(ObservedCell::from_code(code).map(ObservedCell::code), Some(code));
        }
        assert_eq!(ObservedCell::from_code(9), None);
        assert_eq!(ObservedCell::from_code(-3), None);
    }

    #[test]
    fn display_renders_rows() {
        let board = board();
        let mut revealed = CellMask::new(board.size());
        revealed.insert((0, 0));
        revealed.insert((1, 1));
        revealed.insert((0, 2));

        let obs = Observation::derive(&board, &revealed, Some((0, 0)));

        assert_eq!(obs.to_string(), "*#.\n#1#\n");
    }
}
