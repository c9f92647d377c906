use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_TYPE: &str = "event";
pub const DEFAULT_DOORS_OPEN_MINUTES: i64 = 60;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventFormat {
    InPerson,
    Virtual,
}

impl EventFormat {
    pub const OPTIONS: &'static [&'static str] = &["in-person", "virtual"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventFormat::InPerson => "in-person",
            EventFormat::Virtual => "virtual",
        }
    }
}

/// Pointer to another document in the dataset, resolved by the platform at query time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub id: String,
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
}

fn reference_type() -> String {
    "reference".to_string()
}

impl Reference {
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: reference_type(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Slug {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: Some(current.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ImageField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Value>,
}

/// A single portable-text block. Only paragraph blocks are ever written by this crate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(default)]
    pub mark_defs: Vec<Value>,
    pub children: Vec<Span>,
    #[serde(default = "normal_style")]
    pub style: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Span {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(rename = "_key")]
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

fn normal_style() -> String {
    "normal".to_string()
}

impl Block {
    pub fn paragraph(key: &str, span_key: &str, text: impl Into<String>) -> Self {
        Self {
            kind: "block".to_string(),
            key: key.to_string(),
            mark_defs: Vec::new(),
            children: vec![Span {
                kind: "span".to_string(),
                key: span_key.to_string(),
                text: text.into(),
                marks: Vec::new(),
            }],
            style: normal_style(),
        }
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_type", default = "event_type")]
    pub doc_type: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    /// Legacy field kept for old documents; superseded by `format`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<EventFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors_open: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_published: Option<DateTime<Utc>>,
}

fn event_type() -> String {
    EVENT_TYPE.to_string()
}

impl Default for EventDocument {
    fn default() -> Self {
        Self {
            id: None,
            doc_type: event_type(),
            revision: None,
            name: None,
            slug: None,
            event_type: None,
            format: None,
            date: None,
            doors_open: None,
            venue: None,
            headline: None,
            image: None,
            details: None,
            tickets: None,
            first_published: None,
        }
    }
}

impl EventDocument {
    /// A fresh event carrying the schema's initial values.
    pub fn new() -> Self {
        Self {
            doors_open: Some(DEFAULT_DOORS_OPEN_MINUTES),
            ..Self::default()
        }
    }

    pub fn is_virtual(&self) -> bool {
        match self.format {
            Some(format) => format == EventFormat::Virtual,
            None => self.event_type == Some(EventFormat::Virtual),
        }
    }

    pub fn doors_open_at(&self) -> Option<DateTime<Utc>> {
        let start = self.date?;
        let minutes = self.doors_open.unwrap_or(DEFAULT_DOORS_OPEN_MINUTES);
        Some(start - Duration::minutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn new_event_uses_initial_values() {
        let event = EventDocument::new();
        assert_eq!(event.doc_type, "event");
        assert_eq!(event.doors_open, Some(60));
    }

    #[test]
    fn deserializes_sanity_document() {
        let raw = json!({
            "_id": "event-1",
            "_type": "event",
            "_rev": "abc",
            "name": "Jazz Night",
            "slug": {"_type": "slug", "current": "jazz-night"},
            "format": "in-person",
            "date": "2024-05-01T20:00:00.000Z",
            "doorsOpen": 45,
            "venue": {"_type": "reference", "_ref": "venue-1"},
            "headline": {"_ref": "artist-1"}
        });
        let event: EventDocument = serde_json::from_value(raw).expect("decode event");
        assert_eq!(event.name.as_deref(), Some("Jazz Night"));
        assert_eq!(event.format, Some(EventFormat::InPerson));
        assert_eq!(event.venue, Some(Reference::to("venue-1")));
        assert_eq!(event.headline.map(|r| r.id), Some("artist-1".to_string()));
        assert_eq!(
            event.date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap())
        );
    }

    #[test]
    fn format_takes_precedence_over_legacy_event_type() {
        let mut event = EventDocument::new();
        event.event_type = Some(EventFormat::Virtual);
        assert!(event.is_virtual());

        event.format = Some(EventFormat::InPerson);
        assert!(!event.is_virtual());
    }

    #[test]
    fn doors_open_before_start() {
        let mut event = EventDocument::new();
        assert_eq!(event.doors_open_at(), None);

        event.date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap());
        assert_eq!(
            event.doors_open_at(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap())
        );
    }

    #[test]
    fn paragraph_block_shape() {
        let block = Block::paragraph("details-block", "details-span", "Hello");
        let value = serde_json::to_value(&block).expect("encode block");
        assert_eq!(
            value,
            json!({
                "_type": "block",
                "_key": "details-block",
                "markDefs": [],
                "children": [{
                    "_type": "span",
                    "_key": "details-span",
                    "text": "Hello",
                    "marks": []
                }],
                "style": "normal"
            })
        );
        assert_eq!(block.plain_text(), "Hello");
    }
}
