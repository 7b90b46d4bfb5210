//! Whitespace Search — claims rectangular groups of free cells for dynamic content.
//!
//! # Algorithm
//! For each candidate size, largest first, up to `max_iterations` times:
//! 1. Pick a random cell from the live free list.
//! 2. Collect the `cols × rows` rectangle anchored there (clipped at the grid edge).
//! 3. Reject if any collected cell is important.
//! 4. Accept if at most one cell of the nominal rectangle is missing or occupied.
//!    Accepted cells become occupied and the free list is rebuilt.
//!
//! The search stops once fewer than `min_free` cells remain. It is a heuristic:
//! neither exhaustive nor deterministic across runs.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::layout::grid::{GridCell, Layout, LayoutError};

/// Candidate rectangle sizes as `(cols, rows)`, in grid cells.
pub const CANDIDATE_SIZES: [(usize, usize); 4] = [(10, 10), (8, 8), (6, 6), (5, 5)];

const MAX_ITERATIONS: usize = 100;
const MIN_FREE_CELLS: usize = 5;

/// A claimed rectangle, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhitespaceArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct WhitespaceFinder {
    pub candidates: Vec<(usize, usize)>,
    pub max_iterations: usize,
    pub min_free: usize,
}

impl Default for WhitespaceFinder {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_SIZES.to_vec(),
            max_iterations: MAX_ITERATIONS,
            min_free: MIN_FREE_CELLS,
        }
    }
}

/// Runs the default search over `layout`, claiming the cells it reports.
pub fn find_whitespace_areas<R: Rng + ?Sized>(
    layout: &mut Layout,
    rng: &mut R,
) -> Result<Vec<WhitespaceArea>, LayoutError> {
    WhitespaceFinder::default().find(layout, rng)
}

impl WhitespaceFinder {
    pub fn find<R: Rng + ?Sized>(
        &self,
        layout: &mut Layout,
        rng: &mut R,
    ) -> Result<Vec<WhitespaceArea>, LayoutError> {
        let mut search = Search::new(layout)?;

        'sizes: for &(cols, rows) in &self.candidates {
            for _ in 0..self.max_iterations {
                if search.free.is_empty() {
                    break 'sizes;
                }
                let (row, col) = search.free[rng.random_range(0..search.free.len())];
                search.expand(row, col, cols, rows);
                if search.free.len() < self.min_free {
                    break;
                }
            }
            if search.free.len() < self.min_free {
                debug!(
                    free = search.free.len(),
                    "Whitespace search: free cells exhausted"
                );
                break;
            }
        }

        info!(
            areas = search.found.len(),
            free_remaining = search.free.len(),
            "Whitespace search complete"
        );
        Ok(search.found)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Search state
// ────────────────────────────────────────────────────────────────────────────

/// Mutable state for one search: the grid, its free cells and what was claimed.
struct Search<'a> {
    layout: &'a mut Layout,
    pitch: f64,
    /// Grid positions `(row, col)` of every currently free cell.
    free: Vec<(usize, usize)>,
    found: Vec<WhitespaceArea>,
}

impl<'a> Search<'a> {
    fn new(layout: &'a mut Layout) -> Result<Self, LayoutError> {
        let pitch = layout.pitch()?;
        let free = free_cells(layout);
        Ok(Self {
            layout,
            pitch,
            free,
            found: Vec::new(),
        })
    }

    /// Tries to claim the `cols × rows` rectangle anchored at `(row, col)`.
    fn expand(&mut self, row: usize, col: usize, cols: usize, rows: usize) -> Option<WhitespaceArea> {
        let row_end = (row + rows).min(self.layout.rows());
        let col_end = (col + cols).min(self.layout.cols());

        let mut collected: Vec<&GridCell> = Vec::with_capacity(rows * cols);
        for r in row..row_end {
            for c in col..col_end {
                let cell = self.layout.get(r, c)?;
                if cell.important {
                    return None;
                }
                collected.push(cell);
            }
        }

        let free_count = collected.iter().filter(|cell| cell.free).count();
        if free_count + 1 < rows * cols {
            return None;
        }

        let left = collected.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let top = collected.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);

        for r in row..row_end {
            for c in col..col_end {
                if let Some(cell) = self.layout.computed.get_mut(r).and_then(|v| v.get_mut(c)) {
                    cell.free = false;
                }
            }
        }
        self.free = free_cells(self.layout);

        // width/height follow the (cols, rows) tuple: rows step along x.
        let area = WhitespaceArea {
            x: left,
            y: top,
            width: rows as f64 * self.pitch,
            height: cols as f64 * self.pitch,
        };
        self.found.push(area);
        Some(area)
    }
}

fn free_cells(layout: &Layout) -> Vec<(usize, usize)> {
    layout
        .cells()
        .filter(|cell| cell.free)
        .map(|cell| (cell.row, cell.col))
        .collect()
}
