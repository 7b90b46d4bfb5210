//! Axum route handlers for the social/event content endpoints.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{Datelike, Local};
use serde::Deserialize;
use tracing::info;

use crate::auth::{authorize, PageForm};
use crate::errors::AppError;
use crate::models::event::{EventRow, HashtagCount};
use crate::models::page::Page;
use crate::social::instagram::{search_groups, ImageGroup};
use crate::social::{fuorisalone, safe_join, salone, twitter};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImageForm {
    #[serde(default)]
    pub key: String,
    pub image: Option<String>,
}

fn find_page<'a>(state: &'a AppState, form: &PageForm) -> Result<&'a Page, AppError> {
    let number = form.page_number()?;
    state
        .pages
        .find(number)
        .ok_or_else(|| AppError::NotFound(format!("Page \"{number}\" not found")))
}

/// POST /instagram
pub async fn handle_instagram(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Json<Vec<ImageGroup>>, AppError> {
    form.authorize(&state.config)?;
    let page = find_page(&state, &form)?;

    let groups = search_groups(
        state.image_search.as_ref(),
        &state.config.instagram_dir(),
        &page.keywords.instagram,
    )
    .await?;

    info!(page = page.number, groups = groups.len(), "Instagram search done");
    Ok(Json(groups))
}

/// POST /image
///
/// Streams one archived image as JPEG.
pub async fn handle_image(
    State(state): State<AppState>,
    Form(form): Form<ImageForm>,
) -> Result<Response, AppError> {
    authorize(&state.config, &form.key)?;
    let image = form
        .image
        .as_deref()
        .ok_or_else(|| AppError::NotFound("No image requested".to_string()))?;

    let path = safe_join(&state.config.instagram_dir(), image)?;
    let data = tokio::fs::read(&path).await?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], data).into_response())
}

/// POST /twitter
pub async fn handle_twitter(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Json<Vec<HashtagCount>>, AppError> {
    form.authorize(&state.config)?;
    let page = find_page(&state, &form)?;

    let counts = twitter::hashtag_counts(&state.db, &page.keywords.twitter).await?;
    Ok(Json(counts))
}

/// POST /salone
///
/// `page` names the exhibition project folder here, not a page number.
pub async fn handle_salone(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Json<String>, AppError> {
    form.authorize(&state.config)?;
    let project = form.page()?;

    let summary = salone::project_summary(&state.config.projects_dir(), project).await?;
    Ok(Json(summary))
}

/// POST /fuorisalone
///
/// Returns a one-element list with today's event, or an empty list.
pub async fn handle_fuorisalone(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Json<Vec<EventRow>>, AppError> {
    form.authorize(&state.config)?;
    let page = find_page(&state, &form)?;
    let today = Local::now().weekday();

    let event = fuorisalone::todays_event(&state.db, &page.keywords.time, today).await?;
    Ok(Json(event.into_iter().collect()))
}
