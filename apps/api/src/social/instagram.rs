//! Instagram image lookup for a page's keyword groups.
//!
//! The archive of scraped posts is searched by an external shell script; this
//! module builds its arguments, normalizes the paths it prints and orders the
//! resulting groups (pinned `always` groups first, then newest first).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::page::InstagramKeyword;

const UTC_MARKER: &str = "_UTC";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Result limits for `all` groups and single-image groups.
const ALL_IMAGES: usize = 30;
const SINGLE_IMAGE: usize = 1;

// ────────────────────────────────────────────────────────────────────────────
// Search backend
// ────────────────────────────────────────────────────────────────────────────

/// Finds archived image files matching every pattern. Returns one path per line of output.
///
/// Carried in `AppState` as `Arc<dyn ImageSearcher>`.
#[async_trait]
pub trait ImageSearcher: Send + Sync {
    async fn search(
        &self,
        dir: &Path,
        count: usize,
        patterns: &[String],
    ) -> Result<Vec<String>, AppError>;
}

/// Runs `bash <script> <dir> <count> <patterns...>`.
pub struct ShellImageSearcher {
    script: PathBuf,
}

impl ShellImageSearcher {
    pub fn new(script: PathBuf) -> Self {
        Self { script }
    }
}

#[async_trait]
impl ImageSearcher for ShellImageSearcher {
    async fn search(
        &self,
        dir: &Path,
        count: usize,
        patterns: &[String],
    ) -> Result<Vec<String>, AppError> {
        let output = Command::new("bash")
            .arg(&self.script)
            .arg(dir)
            .arg(count.to_string())
            .args(patterns)
            .output()
            .await?;

        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Image search script failed"
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| line.len() > 1)
            .map(str::to_string)
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result shaping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGroup {
    pub keywords: Vec<String>,
    pub images: Vec<String>,
    pub captions: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub always: bool,
}

/// Grep-style pattern for one keyword: whitespace matches anything.
pub fn search_pattern(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| if c.is_whitespace() { ".*".to_string() } else { c.to_string() })
        .collect()
}

/// `/archive/instagram/salone/2018-04-17_10-00-00_UTC_1.jpg` → `salone/2018-04-17_10-00-00_UTC.jpg`.
///
/// Lines without a UTC timestamp are not post images and yield `None`.
pub fn normalize_image_path(line: &str) -> Option<String> {
    let mut segments = line.trim().rsplit('/');
    let name = segments.next()?;
    let relative = match segments.next() {
        Some(folder) => format!("{folder}/{name}"),
        None => name.to_string(),
    };
    let cut = relative.rfind(UTC_MARKER)? + UTC_MARKER.len();
    Some(format!("{}.jpg", &relative[..cut]))
}

/// Post time encoded in an image name.
pub fn image_timestamp(path: &str) -> Option<NaiveDateTime> {
    let name = path.rsplit('/').next()?;
    let stamp = &name[..name.rfind(UTC_MARKER)?];
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

fn newest_first(a: &str, b: &str) -> Ordering {
    image_timestamp(b).cmp(&image_timestamp(a))
}

fn group_order(a: &ImageGroup, b: &ImageGroup) -> Ordering {
    match (a.always, b.always) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => match (a.images.first(), b.images.first()) {
            (Some(a), Some(b)) => newest_first(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Runs the search for every keyword group and shapes the response.
pub async fn search_groups(
    searcher: &dyn ImageSearcher,
    dir: &Path,
    groups: &[InstagramKeyword],
) -> Result<Vec<ImageGroup>, AppError> {
    let mut results = Vec::with_capacity(groups.len());

    for group in groups {
        let patterns: Vec<String> = group.keywords.iter().map(|k| search_pattern(k)).collect();
        let count = if group.all { ALL_IMAGES } else { SINGLE_IMAGE };
        let lines = searcher.search(dir, count, &patterns).await?;

        let mut images: Vec<String> = Vec::new();
        for image in lines.iter().filter_map(|line| normalize_image_path(line)) {
            if !images.contains(&image) {
                images.push(image);
            }
        }
        if group.all {
            images.sort_by(|a, b| newest_first(a, b));
        }

        debug!(keywords = ?group.keywords, hits = images.len(), "Instagram group searched");
        results.push(ImageGroup {
            keywords: group.keywords.clone(),
            images,
            captions: group.captions.clone(),
            always: group.always,
        });
    }

    results.retain(|group| !group.images.is_empty() || group.always);
    results.sort_by(group_order);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Returns canned lines keyed by the first pattern.
    struct StubSearcher {
        hits: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl ImageSearcher for StubSearcher {
        async fn search(
            &self,
            _dir: &Path,
            count: usize,
            patterns: &[String],
        ) -> Result<Vec<String>, AppError> {
            let lines = self.hits.get(&patterns[0]).cloned().unwrap_or_default();
            Ok(lines.into_iter().take(count).collect())
        }
    }

    fn group(keywords: &[&str], all: bool, always: bool) -> InstagramKeyword {
        InstagramKeyword {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            all,
            always,
            captions: None,
        }
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern("salone del mobile"), "salone.*del.*mobile");
        assert_eq!(search_pattern("rho"), "rho");
    }

    #[test]
    fn test_normalize_image_path() {
        assert_eq!(
            normalize_image_path("/data/instagram/salone/2018-04-17_10-00-00_UTC_1.jpg").unwrap(),
            "salone/2018-04-17_10-00-00_UTC.jpg"
        );
        assert_eq!(
            normalize_image_path("salone/2018-04-17_10-00-00_UTC.txt").unwrap(),
            "salone/2018-04-17_10-00-00_UTC.jpg"
        );
        assert!(normalize_image_path("/data/instagram/salone/profile.jpg").is_none());
    }

    #[test]
    fn test_image_timestamp() {
        let ts = image_timestamp("salone/2018-04-17_10-30-05_UTC.jpg").unwrap();
        assert_eq!(ts.to_string(), "2018-04-17 10:30:05");
        assert!(image_timestamp("salone/latest_UTC.jpg").is_none());
    }

    #[tokio::test]
    async fn test_groups_filtered_and_ordered() {
        let searcher = StubSearcher {
            hits: HashMap::from([
                (
                    "old".to_string(),
                    vec!["/x/a/2018-04-15_09-00-00_UTC_1.jpg".to_string()],
                ),
                (
                    "new".to_string(),
                    vec!["/x/b/2018-04-18_09-00-00_UTC_1.jpg".to_string()],
                ),
            ]),
        };
        let groups = [
            group(&["old"], false, false),
            group(&["empty"], false, false),
            group(&["new"], false, false),
            group(&["pinned"], false, true),
        ];

        let results = search_groups(&searcher, Path::new("/x"), &groups).await.unwrap();
        let order: Vec<&str> = results.iter().map(|g| g.keywords[0].as_str()).collect();
        assert_eq!(order, vec!["pinned", "new", "old"]);
        assert!(results[0].images.is_empty());
    }

    #[tokio::test]
    async fn test_all_groups_sorted_and_deduplicated() {
        let searcher = StubSearcher {
            hits: HashMap::from([(
                "lamps".to_string(),
                vec![
                    "/x/a/2018-04-15_09-00-00_UTC_1.jpg".to_string(),
                    "/x/a/2018-04-15_09-00-00_UTC.txt".to_string(),
                    "/x/a/2018-04-19_09-00-00_UTC_1.jpg".to_string(),
                ],
            )]),
        };

        let results = search_groups(&searcher, Path::new("/x"), &[group(&["lamps"], true, false)])
            .await
            .unwrap();
        assert_eq!(
            results[0].images,
            vec!["a/2018-04-19_09-00-00_UTC.jpg", "a/2018-04-15_09-00-00_UTC.jpg"]
        );
    }

    #[tokio::test]
    async fn test_single_groups_limited_to_one() {
        let searcher = StubSearcher {
            hits: HashMap::from([(
                "chairs".to_string(),
                vec![
                    "/x/a/2018-04-15_09-00-00_UTC_1.jpg".to_string(),
                    "/x/a/2018-04-16_09-00-00_UTC_1.jpg".to_string(),
                ],
            )]),
        };

        let results = search_groups(&searcher, Path::new("/x"), &[group(&["chairs"], false, false)])
            .await
            .unwrap();
        assert_eq!(results[0].images.len(), 1);
    }
}
