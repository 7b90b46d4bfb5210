//! Axum route handler for printing.

use axum::{
    extract::{Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::auth::authorize;
use crate::errors::AppError;
use crate::printer::save_document;
use crate::social::safe_join;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PrintQuery {
    #[serde(default)]
    pub key: String,
    /// File name under the prints folder to keep a copy in.
    pub save: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<String>,
}

/// POST /print?key=…[&save=name.pdf]
///
/// Body: the raw PDF document. Sent to the printer when one is configured,
/// and written under the prints folder when `save` is given.
pub async fn handle_print(
    State(state): State<AppState>,
    Query(query): Query<PrintQuery>,
    body: Bytes,
) -> Result<Json<PrintResponse>, AppError> {
    authorize(&state.config, &query.key)?;
    if state.printer.is_none() && query.save.is_none() {
        return Err(AppError::NotImplemented("No printer configured".to_string()));
    }
    if body.is_empty() {
        return Err(AppError::Validation("document body is empty".to_string()));
    }

    let saved = match &query.save {
        Some(name) => {
            let path = safe_join(&state.config.prints_dir(), name)?;
            save_document(&body, &path).await?;
            Some(name.clone())
        }
        None => None,
    };

    let status = match &state.printer {
        Some(printer) => Some(printer.print(&body).await?),
        None => None,
    };

    Ok(Json(PrintResponse {
        status,
        bytes: body.len(),
        saved,
    }))
}
