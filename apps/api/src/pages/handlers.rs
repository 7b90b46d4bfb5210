//! Axum route handlers for page layouts.

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{authorize, PageForm};
use crate::errors::AppError;
use crate::layout::{find_whitespace_areas, GridCell, LayoutError, LayoutIndex, WhitespaceArea};
use crate::models::page::Page;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub page: i64,
    pub rows: usize,
    pub cols: usize,
    pub pitch: f64,
    pub whitespace: Vec<WhitespaceArea>,
}

/// POST /layout
///
/// Builds a fresh grid for the page and claims whitespace areas on it.
/// Each request works on its own copy of the page.
pub async fn handle_layout(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Json<LayoutResponse>, AppError> {
    form.authorize(&state.config)?;
    let number = form.page_number()?;

    let mut page = find_page(&state, number)?;
    let grid = state.grid.clone();

    // CPU-bound: grid build + randomized search.
    let response = tokio::task::spawn_blocking(move || -> Result<LayoutResponse, LayoutError> {
        page.layout_grid(&grid);
        let whitespace = find_whitespace_areas(&mut page.layout, &mut rand::rng())?;
        Ok(LayoutResponse {
            page: page.number,
            rows: page.layout.rows(),
            cols: page.layout.cols(),
            pitch: page.layout.pitch()?,
            whitespace,
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;

    info!(
        page = response.page,
        areas = response.whitespace.len(),
        "Computed page layout"
    );
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct CellForm {
    #[serde(default)]
    pub key: String,
    pub page: i64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct CellResponse {
    pub cell: Option<GridCell>,
    pub left: Option<GridCell>,
    pub right: Option<GridCell>,
    pub above: Option<GridCell>,
    pub below: Option<GridCell>,
}

/// POST /layout/cell
///
/// The grid cell under `(x, y)` on a freshly built layout, with its directional neighbors.
pub async fn handle_cell(
    State(state): State<AppState>,
    Form(form): Form<CellForm>,
) -> Result<Json<CellResponse>, AppError> {
    authorize(&state.config, &form.key)?;
    let mut page = find_page(&state, form.page)?;
    let grid = state.grid.clone();

    let response = tokio::task::spawn_blocking(move || -> Result<CellResponse, LayoutError> {
        page.layout_grid(&grid);
        let index = LayoutIndex::new(&page.layout)?;
        let cell = index.cell_at(form.x, form.y);
        Ok(CellResponse {
            cell: cell.copied(),
            left: index.left(cell).copied(),
            right: index.right(cell).copied(),
            above: index.above(cell).copied(),
            below: index.below(cell).copied(),
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in cell lookup: {e}")))??;

    Ok(Json(response))
}

fn find_page(state: &AppState, number: i64) -> Result<Page, AppError> {
    state
        .pages
        .find(number)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Page \"{number}\" not found")))
}
