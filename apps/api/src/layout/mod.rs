// Page layout grid engine.
// Builds a cell grid per page, answers point/neighbor queries, and claims whitespace.
// Building and searching are CPU-bound; handlers run them inside tokio::task::spawn_blocking.
#![allow(dead_code)]

pub mod grid;
pub mod index;
pub mod whitespace;

// Re-export the public API consumed by handlers and the page model.
pub use grid::{GridBuilder, GridCell, GridConfig, Layout, LayoutError};
pub use index::LayoutIndex;
pub use whitespace::{find_whitespace_areas, WhitespaceArea};
