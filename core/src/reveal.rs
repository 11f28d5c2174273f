use alloc::collections::VecDeque;

use crate::*;

/// Reveals `origin` and, when it has no adjacent mines, floods outward through the connected zero region, also
/// revealing the numbered cells on its border. Returns how many cells were newly revealed.
///
/// Out of bounds or already revealed origins are a no-op. A mine at `origin` is revealed but never expanded.
pub fn reveal(origin: Coord2, board: &HiddenBoard, revealed: &mut CellMask) -> CellCount {
    debug_assert_eq!(board.size(), revealed.size());

    if !board.contains(origin) || !revealed.insert(origin) {
        return 0;
    }

    let mut newly_revealed = 1;
    let mut to_visit = VecDeque::from([origin]);

    while let Some(visit_coords) = to_visit.pop_front() {
        if !board.cell(visit_coords).is_zero() {
            continue;
        }

        for pos in board.iter_neighbors(visit_coords) {
            // marked on enqueue so a cell is never queued twice
            if revealed.insert(pos) {
                newly_revealed += 1;
                to_visit.push_back(pos);
            }
        }
    }

    newly_revealed
}
