//! Layout Grid — discretizes a page's region of interest into square cells.
//!
//! Each cell is classified from the page's content blocks:
//! - `free`: no block covers the cell's central 60% × 60% core
//! - `important`: a block carrying the page's own number overlaps the cell
//!
//! Important cells hold the page-number label and are never claimed as whitespace.
//!
//! # Traversal
//! The grid is walked from one of the four ROI corners. The outer loop steps along
//! x and produces `computed[row]`; the inner loop steps along y and produces the
//! cells of that row. `row`/`col` are traversal indices, not absolute positions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::page::{leading_integer, ContentBlock, Page};

/// Edge length of one grid cell, in page units.
pub const GRID_SIZE: f64 = 5.0;

/// Fraction of the cell a block must reach past on each axis to cover its core.
const CORE_MARGIN: f64 = 0.2;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Layout grid has not been built")]
    NotBuilt,

    #[error("Invalid grid configuration: {0}")]
    InvalidGrid(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Grid types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub free: bool,
    pub important: bool,
}

impl GridCell {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.size && y >= self.y && y < self.y + self.size
    }
}

/// The computed grid of a single page. Empty until built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub computed: Vec<Vec<GridCell>>,
}

impl Layout {
    pub fn is_built(&self) -> bool {
        self.computed.first().is_some_and(|row| !row.is_empty())
    }

    pub fn rows(&self) -> usize {
        self.computed.len()
    }

    pub fn cols(&self) -> usize {
        self.computed.first().map_or(0, Vec::len)
    }

    /// Grid pitch, read back from the cells.
    pub fn pitch(&self) -> Result<f64, LayoutError> {
        self.computed
            .first()
            .and_then(|row| row.first())
            .map(|cell| cell.size)
            .ok_or(LayoutError::NotBuilt)
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.computed.iter().flatten()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.computed.get(row).and_then(|r| r.get(col))
    }

    /// Sets the `free` flag of the cell at `cell`'s grid position. No-op for `None`.
    pub fn set_free(&mut self, cell: Option<GridCell>, free: bool) {
        let Some(cell) = cell else { return };
        if let Some(target) = self
            .computed
            .get_mut(cell.row)
            .and_then(|r| r.get_mut(cell.col))
        {
            target.free = free;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Traversal table
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Corner {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Loop condition for one axis: keep stepping while the coordinate is below
/// (or above) the end point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Below,
    Above,
}

impl Bound {
    fn holds(self, value: f64, end: f64) -> bool {
        match self {
            Bound::Below => value < end,
            Bound::Above => value > end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub start: f64,
    pub end: f64,
    /// +1.0 or -1.0
    pub direction: f64,
    pub bound: Bound,
}

impl Axis {
    fn steps(self, pitch: f64) -> impl Iterator<Item = f64> {
        let mut value = self.start;
        std::iter::from_fn(move || {
            if !self.bound.holds(value, self.end) {
                return None;
            }
            let current = value;
            value += pitch * self.direction;
            Some(current)
        })
    }
}

/// One way to walk the grid: origin corner plus per-axis direction and bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Traversal {
    pub corner: Corner,
    pub x: Axis,
    pub y: Axis,
}

impl Traversal {
    /// The four corner traversals over `config`'s region of interest.
    pub fn table(config: &GridConfig) -> [Traversal; 4] {
        let roi = config.roi;
        let last_x = roi.x1 - config.pitch;
        let last_y = roi.y1 - config.pitch;
        let forward = |start, end| Axis {
            start,
            end,
            direction: 1.0,
            bound: Bound::Below,
        };
        let backward = |start, end| Axis {
            start,
            end,
            direction: -1.0,
            bound: Bound::Above,
        };

        [
            Traversal {
                corner: Corner::TopLeft,
                x: forward(roi.x0, last_x),
                y: forward(roi.y0, last_y),
            },
            Traversal {
                corner: Corner::TopRight,
                x: backward(last_x, roi.x0),
                y: forward(roi.y0, last_y),
            },
            Traversal {
                corner: Corner::BottomLeft,
                x: forward(roi.x0, last_x),
                y: backward(last_y, roi.y0),
            },
            Traversal {
                corner: Corner::BottomRight,
                x: backward(last_x, roi.x0),
                y: backward(last_y, roi.y0),
            },
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Region of interest, in page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub roi: Roi,
    pub pitch: f64,
}

/// ROI averaged over all guide pages.
impl Default for GridConfig {
    fn default() -> Self {
        Self {
            roi: Roi {
                x0: 20.0,
                y0: 20.0,
                x1: 820.0,
                y1: 575.0,
            },
            pitch: GRID_SIZE,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builds page layouts from a fixed config and traversal table.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    config: GridConfig,
    traversals: [Traversal; 4],
    corner: Corner,
}

impl GridBuilder {
    pub fn new(config: GridConfig) -> Result<Self, LayoutError> {
        if !config.pitch.is_finite() || config.pitch <= 0.0 {
            return Err(LayoutError::InvalidGrid(format!(
                "pitch must be positive, got {}",
                config.pitch
            )));
        }
        let roi = config.roi;
        if [roi.x0, roi.y0, roi.x1, roi.y1].iter().any(|v| !v.is_finite()) {
            return Err(LayoutError::InvalidGrid(format!(
                "region of interest {roi:?} has non-finite bounds"
            )));
        }
        // The walk stops one pitch short of the far edge.
        if roi.x1 - roi.x0 <= config.pitch || roi.y1 - roi.y0 <= config.pitch {
            return Err(LayoutError::InvalidGrid(format!(
                "region of interest {roi:?} is smaller than one cell"
            )));
        }

        Ok(Self {
            config,
            traversals: Traversal::table(&config),
            corner: Corner::default(),
        })
    }

    /// Starts traversal from `corner` instead of the top-left default.
    pub fn with_corner(mut self, corner: Corner) -> Self {
        self.corner = corner;
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn traversal(&self) -> &Traversal {
        self.traversals
            .iter()
            .find(|t| t.corner == self.corner)
            .unwrap_or(&self.traversals[0])
    }

    /// Builds a fresh layout for `page`. Any previous layout state is not consulted.
    pub fn build(&self, page: &Page) -> Layout {
        let traversal = self.traversal();
        let pitch = self.config.pitch;

        let computed: Vec<Vec<GridCell>> = traversal
            .x
            .steps(pitch)
            .enumerate()
            .map(|(row, x)| {
                traversal
                    .y
                    .steps(pitch)
                    .enumerate()
                    .map(|(col, y)| classify_cell(row, col, x, y, pitch, page))
                    .collect()
            })
            .collect();

        let layout = Layout { computed };
        debug!(
            page = page.number,
            rows = layout.rows(),
            cols = layout.cols(),
            blocks = page.blocks.len(),
            "Built layout grid"
        );
        layout
    }
}

impl Page {
    /// Builds this page's layout in place, discarding any earlier one.
    pub fn layout_grid(&mut self, builder: &GridBuilder) {
        self.layout = builder.build(self);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cell classification
// ────────────────────────────────────────────────────────────────────────────

fn classify_cell(row: usize, col: usize, x: f64, y: f64, size: f64, page: &Page) -> GridCell {
    let mut cell = GridCell {
        row,
        col,
        x,
        y,
        size,
        free: true,
        important: false,
    };

    // No blocks: nothing can cover the cell.
    if page.blocks.is_empty() {
        return cell;
    }

    cell.important = page
        .blocks
        .iter()
        .any(|block| overlaps(block, &cell) && is_page_label(block, page.number));
    cell.free = page.blocks.iter().all(|block| is_separated(block, &cell));
    cell
}

/// True when `block` misses the cell's central core on at least one axis.
fn is_separated(block: &ContentBlock, cell: &GridCell) -> bool {
    let b = &block.bbox;
    let near = CORE_MARGIN * cell.size;
    let far = (1.0 - CORE_MARGIN) * cell.size;
    b.x1() < cell.x + near
        || b.x0 > cell.x + far
        || b.y1() < cell.y + near
        || b.y0 > cell.y + far
}

/// Strict overlap with non-zero area on both axes.
fn overlaps(block: &ContentBlock, cell: &GridCell) -> bool {
    let b = &block.bbox;
    b.x0 < cell.x + cell.size && b.x1() > cell.x && b.y0 < cell.y + cell.size && b.y1() > cell.y
}

fn is_page_label(block: &ContentBlock, number: i64) -> bool {
    leading_integer(&block.text) == Some(number)
}
