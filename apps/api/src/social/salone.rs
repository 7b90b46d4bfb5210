//! Exhibition summaries built from a project's `vis.json` captions.

use std::path::Path;

use serde::Deserialize;

use crate::errors::AppError;
use crate::social::safe_join;

#[derive(Debug, Deserialize)]
struct VisEntry {
    #[serde(default)]
    caption: Option<String>,
}

/// Each caption capitalized and closed with a period, joined into one paragraph.
fn join_captions(entries: &[VisEntry]) -> String {
    let mut summary = String::new();
    for caption in entries.iter().filter_map(|e| e.caption.as_deref()) {
        let mut chars = caption.chars();
        let Some(first) = chars.next() else { continue };
        summary.extend(first.to_uppercase());
        summary.push_str(chars.as_str());
        summary.push_str(". ");
    }
    summary.trim().to_string()
}

pub async fn project_summary(projects_dir: &Path, project: &str) -> Result<String, AppError> {
    let path = safe_join(projects_dir, project)?.join("vis.json");
    let raw = tokio::fs::read(&path).await?;
    let entries: Vec<VisEntry> = serde_json::from_slice(&raw).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Invalid {}: {e}", path.display()))
    })?;
    Ok(join_captions(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_join_captions() {
        let entries: Vec<VisEntry> = serde_json::from_str(
            r#"[{"caption": "a chair made of cork"}, {"label": "no caption"},
                {"caption": ""}, {"caption": "ëxtra light"}]"#,
        )
        .unwrap();
        assert_eq!(join_captions(&entries), "A chair made of cork. Ëxtra light.");
    }

    #[tokio::test]
    async fn test_project_summary_reads_vis_file() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("studio-x");
        std::fs::create_dir(&project).unwrap();
        std::fs::write(project.join("vis.json"), r#"[{"caption": "woven lamps"}]"#).unwrap();

        let summary = project_summary(dir.path(), "studio-x").await.unwrap();
        assert_eq!(summary, "Woven lamps.");
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let dir = tempdir().unwrap();
        let err = project_summary(dir.path(), "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
