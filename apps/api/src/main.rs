mod auth;
mod config;
mod db;
mod errors;
mod layout;
mod models;
mod pages;
mod printer;
mod routes;
mod social;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::layout::{GridBuilder, GridConfig};
use crate::pages::PageStore;
use crate::printer::IppPrinter;
use crate::routes::build_router;
use crate::social::instagram::ShellImageSearcher;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting guide API v{}", env!("CARGO_PKG_VERSION"));

    // Load guide pages (read-only for the lifetime of the process)
    let pages = PageStore::load_folder(&config.pages_dir())?;

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Grid config and traversal table, shared by all layout requests
    let grid = GridBuilder::new(GridConfig::default())?;
    info!("Layout grid: {:?}", grid.config());

    let image_search = Arc::new(ShellImageSearcher::new(
        config.instagram_search_script.clone(),
    ));
    info!(
        "Image search script: {}",
        config.instagram_search_script.display()
    );

    let printer = match &config.printer_url {
        Some(url) => {
            let printer = IppPrinter::new(url)?;
            info!("Printer endpoint: {}", printer.endpoint());
            Some(printer)
        }
        None => {
            info!("No PRINTER_URL set, printing disabled");
            None
        }
    };

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        pages: Arc::new(pages),
        grid: Arc::new(grid),
        image_search,
        printer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
