pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pages::handlers as pages;
use crate::printer::handlers as printer;
use crate::social::handlers as social;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Page layout
        .route("/layout", post(pages::handle_layout))
        .route("/layout/cell", post(pages::handle_cell))
        // Social / event content
        .route("/instagram", post(social::handle_instagram))
        .route("/image", post(social::handle_image))
        .route("/twitter", post(social::handle_twitter))
        .route("/salone", post(social::handle_salone))
        .route("/fuorisalone", post(social::handle_fuorisalone))
        // Printing
        .route("/print", post(printer::handle_print))
        .with_state(state)
}
