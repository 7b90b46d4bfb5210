//! Shared-key authentication for the form-encoded guide endpoints.
//!
//! Every POST carries `key` in its url-encoded body; most also name a `page`.

use serde::Deserialize;
use tracing::warn;

use crate::config::Config;
use crate::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub key: String,
    pub page: Option<String>,
}

impl PageForm {
    pub fn authorize(&self, config: &Config) -> Result<(), AppError> {
        authorize(config, &self.key)
    }

    /// The requested page as its raw string (used for file paths).
    pub fn page(&self) -> Result<&str, AppError> {
        self.page
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("page is required".to_string()))
    }

    /// The requested page as a page number.
    pub fn page_number(&self) -> Result<i64, AppError> {
        let page = self.page()?;
        page.parse::<i64>()
            .map_err(|_| AppError::Validation(format!("page must be a number, got {page:?}")))
    }
}

pub fn authorize(config: &Config, key: &str) -> Result<(), AppError> {
    if key.trim() != config.api_key {
        warn!("Rejected request with invalid API key");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
