use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub database_url: String,
    /// Root of the guide data: `pages/`, `projects/`, `instagram/`.
    pub data_dir: PathBuf,
    pub instagram_search_script: PathBuf,
    /// IPP endpoint, e.g. `ipp://printer.local:631/printers/guide`. Printing is off when unset.
    pub printer_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let instagram_search_script = std::env::var("INSTAGRAM_SEARCH_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("apps").join("instagram-search.sh"));

        Ok(Config {
            api_key: require_env("API_KEY")?.trim().to_string(),
            database_url: require_env("DATABASE_URL")?,
            data_dir,
            instagram_search_script,
            printer_url: std::env::var("PRINTER_URL").ok().filter(|url| !url.is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.data_dir.join("pages")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.data_dir.join("projects")
    }

    pub fn instagram_dir(&self) -> PathBuf {
        self.data_dir.join("instagram")
    }

    pub fn prints_dir(&self) -> PathBuf {
        self.data_dir.join("prints")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
