use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::layout::GridBuilder;
use crate::pages::PageStore;
use crate::printer::IppPrinter;
use crate::social::instagram::ImageSearcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Guide pages, loaded once at startup.
    pub pages: Arc<PageStore>,
    /// Grid config and traversal table, built once and shared by every layout request.
    pub grid: Arc<GridBuilder>,
    /// Pluggable image search. Default: ShellImageSearcher.
    pub image_search: Arc<dyn ImageSearcher>,
    /// Present only when PRINTER_URL is configured.
    pub printer: Option<IppPrinter>,
}
