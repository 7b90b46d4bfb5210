//! Hashtag statistics for a page's twitter keywords.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::PgPool;
use tracing::debug;

use crate::models::event::HashtagCount;

/// Keywords longer than this also get a sample tweet.
const SAMPLE_MIN_KEYWORD_LEN: usize = 7;

static LINKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S*").unwrap());
static HASHTAG_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w*\s*(#\w*\s*)+").unwrap());
static MENTION_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w*\s*(@\w*\s*)+").unwrap());
static RETWEET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"RT @\w*:").unwrap());
static VIA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"via @\w*").unwrap());

/// Strips a tweet down to its main body.
///
/// Removes links, runs of two or more hashtags or mentions, retweet prefixes
/// and `via @user` credits. Single inline hashtags and mentions are kept.
pub fn parse_tweet(text: &str) -> String {
    let text = LINKS.replace_all(text, "");
    let text = HASHTAG_RUNS.replace_all(&text, "");
    let text = MENTION_RUNS.replace_all(&text, "");
    let text = RETWEET.replace_all(&text, "");
    let text = VIA.replace_all(&text, "");
    text.trim().to_string()
}

pub async fn hashtag_counts(
    pool: &PgPool,
    keywords: &[String],
) -> Result<Vec<HashtagCount>, sqlx::Error> {
    let mut counts = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        counts.push(hashtag_count(pool, keyword).await?);
    }
    Ok(counts)
}

async fn hashtag_count(pool: &PgPool, keyword: &str) -> Result<HashtagCount, sqlx::Error> {
    let pattern = format!("%{keyword}%");

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM twitter WHERE type = 'hashtag' AND text LIKE $1")
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

    let text = if count > 0 && keyword.chars().count() > SAMPLE_MIN_KEYWORD_LEN {
        let first: Option<String> = sqlx::query_scalar(
            "SELECT text FROM twitter WHERE type = 'hashtag' AND text LIKE $1 ORDER BY created_at LIMIT 1",
        )
        .bind(&pattern)
        .fetch_optional(pool)
        .await?;
        first.map(|t| parse_tweet(&t))
    } else {
        None
    };

    debug!(keyword, count, "Hashtag count");
    Ok(HashtagCount {
        word: keyword.to_string(),
        count,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_links() {
        assert_eq!(
            parse_tweet("New chairs at Rho https://t.co/abc123 today"),
            "New chairs at Rho  today"
        );
    }

    #[test]
    fn test_strips_hashtag_runs_only() {
        assert_eq!(
            parse_tweet("Loving the #design week #mdw2018 #milano #salone"),
            "Loving the #design week"
        );
    }

    #[test]
    fn test_strips_mention_runs() {
        assert_eq!(parse_tweet("Great talk @anna @marco"), "Great talk");
        assert_eq!(parse_tweet("Thanks @anna for the tour"), "Thanks @anna for the tour");
    }

    #[test]
    fn test_strips_retweet_and_via() {
        assert_eq!(
            parse_tweet("RT @salone: Doors open at 9 via @fuorisalone"),
            "Doors open at 9"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(parse_tweet("  Just lamps.  "), "Just lamps.");
    }
}
