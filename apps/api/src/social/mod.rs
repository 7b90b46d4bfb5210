// Social and event content for the guide pages: instagram images, hashtag counts,
// exhibition captions and today's fuorisalone events.

pub mod fuorisalone;
pub mod handlers;
pub mod instagram;
pub mod salone;
pub mod twitter;

use std::path::{Component, Path, PathBuf};

use crate::errors::AppError;

/// Joins a client-supplied relative path onto `base`, refusing anything that could escape it.
pub(crate) fn safe_join(base: &Path, relative: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(relative);
    let is_plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !is_plain {
        return Err(AppError::Validation(format!(
            "invalid path {}",
            relative.display()
        )));
    }
    Ok(base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_join() {
        let base = Path::new("/data/instagram");
        assert_eq!(
            safe_join(base, "salone/2018-04-17_10-00-00_UTC.jpg").unwrap(),
            PathBuf::from("/data/instagram/salone/2018-04-17_10-00-00_UTC.jpg")
        );
        assert!(safe_join(base, "../keys/api-key").is_err());
        assert!(safe_join(base, "/etc/passwd").is_err());
        assert!(safe_join(base, "").is_err());
    }
}
