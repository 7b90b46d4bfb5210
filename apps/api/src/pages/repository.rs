use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::models::page::Page;

/// All guide pages, loaded once at startup and read-only afterwards.
///
/// Handlers clone a page before building its layout, so concurrent requests
/// for the same page never share a grid.
#[derive(Debug, Clone, Default)]
pub struct PageStore {
    pages: Vec<Page>,
}

impl PageStore {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Loads a single page JSON file.
    pub fn load(file: &Path) -> Result<Page> {
        if !file.exists() {
            bail!("Page file {} does not exist", file.display());
        }
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read page file {}", file.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse page file {}", file.display()))
    }

    /// Loads every `*.json` page in `dir`, in file-name order.
    pub fn load_folder(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("The folder {} does not exist", dir.display());
        }

        let mut files: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let pages = files
            .iter()
            .map(|file| Self::load(file))
            .collect::<Result<Vec<_>>>()?;

        if pages.is_empty() {
            warn!("No page files found in {}", dir.display());
        } else {
            info!("Loaded {} pages from {}", pages.len(), dir.display());
        }
        Ok(Self { pages })
    }

    /// First page whose number equals `number`.
    pub fn find(&self, number: i64) -> Option<&Page> {
        self.pages.iter().find(|page| page.number == number)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }
}
