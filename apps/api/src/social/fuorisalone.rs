//! Picks one fuorisalone event that is open today and matches a page's time keywords.

use chrono::Weekday;
use rand::Rng;
use sqlx::PgPool;
use tracing::debug;

use crate::models::event::EventRow;
use crate::models::page::TimeKeyword;

/// Lower-case weekday name; the `fuorisalone` table has one opening-hours column per day.
pub fn weekday_column(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `"tortona,lab"` → `"%tortona%lab%"`.
pub fn like_pattern(keywords: &str) -> String {
    format!("%{}%", keywords.replace(',', "%"))
}

/// Addresses carry tab-separated extras (district, metro stop) after the street.
fn clean_address(address: &str) -> String {
    address.split('\t').next().unwrap_or_default().to_string()
}

/// One matching event for `day`, sampled at random.
///
/// Tries every keyword set first and falls back to the keyword years when none match.
pub async fn todays_event(
    pool: &PgPool,
    keywords: &[TimeKeyword],
    day: Weekday,
) -> Result<Option<EventRow>, sqlx::Error> {
    let column = weekday_column(day);

    let mut matches = Vec::new();
    for keyword in keywords {
        if let Some(event) = find_event(pool, column, &like_pattern(&keyword.keywords)).await? {
            matches.push(event);
        }
    }

    if matches.is_empty() {
        debug!("No keyword match for {column}, falling back to years");
        for keyword in keywords {
            if let Some(event) = find_event(pool, column, &like_pattern(&keyword.year)).await? {
                matches.push(event);
            }
        }
    }

    Ok(sample(matches, &mut rand::rng()))
}

fn sample<R: Rng + ?Sized>(mut events: Vec<EventRow>, rng: &mut R) -> Option<EventRow> {
    if events.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..events.len());
    Some(events.swap_remove(idx))
}

async fn find_event(
    pool: &PgPool,
    column: &'static str,
    pattern: &str,
) -> Result<Option<EventRow>, sqlx::Error> {
    // `column` only ever comes from weekday_column.
    let query = format!(
        "SELECT title, organiser, address, description, {column} AS today \
         FROM fuorisalone \
         WHERE {column} IS NOT NULL AND description IS NOT NULL AND description <> '' \
         AND extended LIKE $1 \
         LIMIT 1"
    );

    let event: Option<EventRow> = sqlx::query_as(&query)
        .bind(pattern)
        .fetch_optional(pool)
        .await?;

    Ok(event.map(|mut e| {
        e.address = e.address.as_deref().map(clean_address);
        e
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn event(title: &str) -> EventRow {
        EventRow {
            title: title.to_string(),
            organiser: None,
            address: None,
            description: "Installations".to_string(),
            today: "10:00-20:00".to_string(),
        }
    }

    #[test]
    fn test_weekday_columns() {
        assert_eq!(weekday_column(Weekday::Mon), "monday");
        assert_eq!(weekday_column(Weekday::Sun), "sunday");
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("tortona,lab"), "%tortona%lab%");
        assert_eq!(like_pattern("2018"), "%2018%");
    }

    #[test]
    fn test_clean_address() {
        assert_eq!(clean_address("Via Tortona 31\tZona Tortona\tM2"), "Via Tortona 31");
        assert_eq!(clean_address("Via Savona 56"), "Via Savona 56");
    }

    #[test]
    fn test_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sample(vec![], &mut rng).is_none());
        assert_eq!(sample(vec![event("only")], &mut rng).unwrap().title, "only");

        let picked = sample(vec![event("a"), event("b"), event("c")], &mut rng).unwrap();
        assert!(["a", "b", "c"].contains(&picked.title.as_str()));
    }
}
