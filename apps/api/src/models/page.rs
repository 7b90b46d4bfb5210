//! Page records as stored in the guide's page JSON files.
//!
//! A page carries its geometry, its already-placed content blocks and the
//! keyword sets the social endpoints query with. The layout grid is never
//! read from disk; it is built per request by `layout::GridBuilder`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::layout::Layout;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box of a content block, in page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    #[serde(alias = "w")]
    pub width: f64,
    #[serde(alias = "h")]
    pub height: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, width: f64, height: f64) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    pub fn x1(&self) -> f64 {
        self.x0 + self.width
    }

    pub fn y1(&self) -> f64 {
        self.y0 + self.height
    }
}

/// A block of already-placed content. `text` may be a page-number label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub bbox: BBox,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Keywords
// ────────────────────────────────────────────────────────────────────────────

/// One image-search group. `all` asks for up to 30 images instead of 1;
/// `always` keeps the group in the response even without hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramKeyword {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub captions: Option<Value>,
}

/// Event lookup keys: comma-separated `keywords` with a `year` fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeKeyword {
    #[serde(default)]
    pub keywords: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    #[serde(default)]
    pub instagram: Vec<InstagramKeyword>,
    #[serde(default)]
    pub twitter: Vec<String>,
    #[serde(default)]
    pub time: Vec<TimeKeyword>,
}

// ────────────────────────────────────────────────────────────────────────────
// Page
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    #[serde(flatten, with = "offset_fields")]
    pub offset: Offset,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(deserialize_with = "page_number")]
    pub number: i64,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(skip)]
    pub layout: Layout,
}

impl Page {
    /// A bare page with geometry and blocks only; the rest is left empty.
    pub fn new(width: f64, height: f64, number: i64, blocks: Vec<ContentBlock>) -> Self {
        Self {
            width,
            height,
            offset: Offset::default(),
            scale: default_scale(),
            title: String::new(),
            author: String::new(),
            number,
            content: Value::Null,
            blocks,
            keywords: Keywords::default(),
            layout: Layout::default(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

/// `offsetX` / `offsetY` sit flat on the page object and default to 0.
mod offset_fields {
    use super::Offset;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Flat {
        #[serde(rename = "offsetX", default)]
        x: f64,
        #[serde(rename = "offsetY", default)]
        y: f64,
    }

    pub fn serialize<S: Serializer>(offset: &Offset, serializer: S) -> Result<S::Ok, S::Error> {
        Flat {
            x: offset.x,
            y: offset.y,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Offset, D::Error> {
        let flat = Flat::deserialize(deserializer)?;
        Ok(Offset {
            x: flat.x,
            y: flat.y,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

/// Page numbers show up both as `7` and `"7"` in the page files.
fn page_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid page number {n}"))),
        NumberOrString::String(s) => leading_integer(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid page number {s:?}"))),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    })
}

/// Parses the integer at the start of `text`, ignoring anything after it.
///
/// `" 7"`, `"7"` and `"7 / 24"` all yield 7; `"p7"` and `""` yield `None`.
pub fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    rest[..digits_end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_page_file() {
        let raw = json!({
            "width": 842,
            "height": 595,
            "offsetX": 12.5,
            "title": "Via Tortona",
            "author": "MDW",
            "number": "14",
            "blocks": [
                { "bbox": { "x0": 20, "y0": 30, "w": 100, "h": 40 }, "text": "Lorem" },
                { "bbox": { "x0": 400, "y0": 560, "width": 10, "height": 10 }, "text": "14" }
            ],
            "keywords": {
                "twitter": ["design", "tortonadesignweek"],
                "time": [{ "keywords": "tortona,lab", "year": 2018 }]
            }
        });

        let page: Page = serde_json::from_value(raw).unwrap();
        assert_eq!(page.number, 14);
        assert_eq!(page.offset, Offset { x: 12.5, y: 0.0 });
        assert_eq!(page.scale, 1.0);
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0].bbox.x1(), 120.0);
        assert_eq!(page.blocks[0].bbox.y1(), 70.0);
        assert_eq!(page.keywords.time[0].year, "2018");
        assert!(page.keywords.instagram.is_empty());
        assert!(!page.layout.is_built());
    }

    #[test]
    fn test_numeric_page_number() {
        let page: Page = serde_json::from_value(json!({
            "width": 100, "height": 100, "number": 3
        }))
        .unwrap();
        assert_eq!(page.number, 3);
        assert!(page.blocks.is_empty());
    }

    #[test]
    fn test_invalid_page_number_rejected() {
        let result: Result<Page, _> = serde_json::from_value(json!({
            "width": 100, "height": 100, "number": "cover"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("7"), Some(7));
        assert_eq!(leading_integer("  42"), Some(42));
        assert_eq!(leading_integer("12 / 40"), Some(12));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer("p7"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("-"), None);
    }
}
