//! Uniform grid used to prune the crowding scan.
//!
//! With a cell size at least as large as the interaction range, any two
//! nodes closer than that range sit in the same or neighbouring cells, so
//! looking at the 3x3 block around a node finds every candidate the
//! brute-force scan would.

use std::collections::HashMap;

use glam::Vec2;

use crate::types::NodeId;

type Cell = (i32, i32);

#[derive(Debug)]
pub struct SpatialGrid {
    cell: f32,
    bins: HashMap<Cell, Vec<NodeId>>,
}

impl SpatialGrid {
    /// ### Panics
    /// Panics if `cell` is not a positive finite number.
    pub fn new(cell: f32) -> Self {
        assert!(cell.is_finite() && cell > 0.0, "grid cell size must be > 0");
        Self {
            cell,
            bins: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell
    }

    /// Changes the cell size. Existing bins are dropped.
    pub fn set_cell_size(&mut self, cell: f32) {
        assert!(cell.is_finite() && cell > 0.0, "grid cell size must be > 0");
        self.cell = cell;
        self.bins.clear();
    }

    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> Cell {
        let c = (pos / self.cell).floor();
        (c.x as i32, c.y as i32)
    }

    /// Re-bins every position. Ids are the positions' indices.
    pub fn rebuild(&mut self, positions: impl Iterator<Item = Vec2>) {
        self.bins.clear();
        for (id, pos) in positions.enumerate() {
            let cell = self.cell_of(pos);
            self.bins.entry(cell).or_default().push(id);
        }
    }

    /// Ids binned in the 3x3 block of cells around `pos`, including any node
    /// sitting exactly at `pos`.
    ///
    /// Far-out positions clamp to the edge cells of the `i32` range; cells
    /// beyond that range are skipped rather than wrapped.
    pub fn candidates(&self, pos: Vec2) -> impl Iterator<Item = NodeId> + '_ {
        let (cx, cy) = self.cell_of(pos);
        (-1..=1)
            .filter_map(move |dx| cx.checked_add(dx))
            .flat_map(move |x| (-1..=1).filter_map(move |dy| Some((x, cy.checked_add(dy)?))))
            .filter_map(move |cell| self.bins.get(&cell))
            .flat_map(|ids| ids.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_of_floors_negative_coordinates() {
        let grid = SpatialGrid::new(0.5);
        assert_eq!(grid.cell_of(Vec2::new(0.1, 0.1)), (0, 0));
        assert_eq!(grid.cell_of(Vec2::new(-0.1, 0.6)), (-1, 1));
    }

    #[test]
    fn candidates_cover_every_point_within_one_cell() {
        let grid_size = 0.35;
        let mut grid = SpatialGrid::new(grid_size);
        let positions = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.34, 0.0),
            Vec2::new(-0.2, -0.2),
            Vec2::new(1.5, 1.5),
        ];
        grid.rebuild(positions.iter().copied());

        let mut found: Vec<NodeId> = grid.candidates(positions[0]).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn candidates_at_extreme_coordinates_do_not_overflow() {
        let mut grid = SpatialGrid::new(0.35);
        let far = Vec2::new(1.0e12, -1.0e12);
        grid.rebuild([far, Vec2::ZERO].into_iter());

        assert_eq!(grid.cell_of(far), (i32::MAX, i32::MIN));
        let found: Vec<NodeId> = grid.candidates(far).collect();
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn rebuild_forgets_old_positions() {
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild([Vec2::ZERO].into_iter());
        grid.rebuild([Vec2::new(10.0, 10.0)].into_iter());

        assert_eq!(grid.candidates(Vec2::ZERO).count(), 0);
        assert_eq!(grid.candidates(Vec2::new(10.0, 10.0)).count(), 1);
    }
}
