//! Read-side lookups over a built layout grid.

use serde::{Deserialize, Serialize};

use crate::layout::grid::{GridCell, Layout, LayoutError};

/// Offset used by directional lookups. Roughly ten cells at the default pitch;
/// it is not tied to the actual cell size.
pub const NEIGHBOR_OFFSET: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Above,
    Below,
}

impl Direction {
    fn offset(self) -> (f64, f64) {
        match self {
            Direction::Left => (-NEIGHBOR_OFFSET, 0.0),
            Direction::Right => (NEIGHBOR_OFFSET, 0.0),
            Direction::Above => (0.0, -NEIGHBOR_OFFSET),
            Direction::Below => (0.0, NEIGHBOR_OFFSET),
        }
    }
}

/// Point and neighbor queries over a layout that has already been built.
#[derive(Debug, Clone, Copy)]
pub struct LayoutIndex<'a> {
    layout: &'a Layout,
}

impl<'a> LayoutIndex<'a> {
    pub fn new(layout: &'a Layout) -> Result<Self, LayoutError> {
        if !layout.is_built() {
            return Err(LayoutError::NotBuilt);
        }
        Ok(Self { layout })
    }

    /// The cell whose bounds contain `(x, y)`.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<&'a GridCell> {
        self.layout.cells().find(|cell| cell.contains(x, y))
    }

    /// The cell [`NEIGHBOR_OFFSET`] units away from `cell` in `direction`.
    pub fn neighbor(&self, cell: Option<&GridCell>, direction: Direction) -> Option<&'a GridCell> {
        let cell = cell?;
        let (dx, dy) = direction.offset();
        self.cell_at(cell.x + dx, cell.y + dy)
    }

    pub fn left(&self, cell: Option<&GridCell>) -> Option<&'a GridCell> {
        self.neighbor(cell, Direction::Left)
    }

    pub fn right(&self, cell: Option<&GridCell>) -> Option<&'a GridCell> {
        self.neighbor(cell, Direction::Right)
    }

    pub fn above(&self, cell: Option<&GridCell>) -> Option<&'a GridCell> {
        self.neighbor(cell, Direction::Above)
    }

    pub fn below(&self, cell: Option<&GridCell>) -> Option<&'a GridCell> {
        self.neighbor(cell, Direction::Below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::grid::{GridBuilder, GridConfig};
    use crate::models::page::Page;

    fn built_layout() -> Layout {
        GridBuilder::new(GridConfig::default())
            .unwrap()
            .build(&Page::new(842.0, 595.0, 1, vec![]))
    }

    #[test]
    fn test_unbuilt_layout_rejected() {
        let layout = Layout::default();
        assert_eq!(LayoutIndex::new(&layout).unwrap_err(), LayoutError::NotBuilt);
    }

    #[test]
    fn test_cell_at_contains_point() {
        let layout = built_layout();
        let index = LayoutIndex::new(&layout).unwrap();

        let cell = index.cell_at(22.5, 31.0).unwrap();
        assert_eq!((cell.x, cell.y), (20.0, 30.0));
        assert_eq!((cell.row, cell.col), (0, 2));

        // Lower bounds are inclusive, upper bounds exclusive.
        assert_eq!(index.cell_at(25.0, 20.0).unwrap().x, 25.0);
    }

    #[test]
    fn test_cell_at_outside_grid() {
        let layout = built_layout();
        let index = LayoutIndex::new(&layout).unwrap();
        assert!(index.cell_at(10.0, 10.0).is_none());
        assert!(index.cell_at(900.0, 100.0).is_none());
    }

    #[test]
    fn test_neighbors_use_fixed_offset() {
        let layout = built_layout();
        let index = LayoutIndex::new(&layout).unwrap();
        let origin = index.cell_at(100.0, 100.0);

        let right = index.right(origin).unwrap();
        assert_eq!((right.x, right.y), (150.0, 100.0));
        let left = index.left(origin).unwrap();
        assert_eq!((left.x, left.y), (50.0, 100.0));
        let above = index.above(origin).unwrap();
        assert_eq!((above.x, above.y), (100.0, 50.0));
        let below = index.below(origin).unwrap();
        assert_eq!((below.x, below.y), (100.0, 150.0));
    }

    #[test]
    fn test_neighbor_off_grid_or_missing() {
        let layout = built_layout();
        let index = LayoutIndex::new(&layout).unwrap();
        let corner = index.cell_at(20.0, 20.0);
        assert!(index.left(corner).is_none());
        assert!(index.above(corner).is_none());
        assert!(index.neighbor(None, Direction::Right).is_none());
    }

    #[test]
    fn test_set_free_by_grid_position() {
        let mut layout = built_layout();
        let target = LayoutIndex::new(&layout).unwrap().cell_at(42.0, 42.0).copied();

        layout.set_free(target, false);
        let index = LayoutIndex::new(&layout).unwrap();
        assert!(!index.cell_at(42.0, 42.0).unwrap().free);
        assert_eq!(layout.cells().filter(|c| !c.free).count(), 1);

        layout.set_free(None, false);
        assert_eq!(layout.cells().filter(|c| !c.free).count(), 1);

        layout.set_free(target, true);
        assert!(layout.cells().all(|c| c.free));
    }
}
