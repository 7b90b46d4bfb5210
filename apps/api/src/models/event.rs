use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A fuorisalone programme entry that is open on the queried weekday.
/// `today` holds that weekday column's opening hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventRow {
    pub title: String,
    pub organiser: Option<String>,
    pub address: Option<String>,
    pub description: String,
    pub today: String,
}

/// Hashtag usage for one page keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub word: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
