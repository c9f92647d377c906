use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ImageField;
use crate::schema::DocumentType;

pub const UNTITLED_EVENT: &str = "Untitled event";
pub const INVALID_DATE: &str = "Invalid Date";
pub const CALENDAR_ICON: &str = "calendar";

/// Projection that dereferences the fields the event preview selects.
pub const PREVIEW_PROJECTION: &str =
    r#"{_id, name, "venue": venue->{name}, "headline": headline->{name}, date, image}"#;

/// One event by `$id`, shaped for [`PreviewSelection::select`].
pub fn event_by_id_query() -> String {
    format!(r#"*[_type == "event" && _id == $id][0]{PREVIEW_PROJECTION}"#)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    EnUs,
    EnGb,
}

impl Locale {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" => Some(Locale::EnUs),
            "en-gb" => Some(Locale::EnGb),
            _ => None,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Locale::EnUs => "%b %-d, %Y, %-I:%M %p",
            Locale::EnGb => "%-d %b %Y, %H:%M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::default(), Tz::UTC)
    }
}

impl DateFormatter {
    pub fn new(locale: Locale, timezone: Tz) -> Self {
        Self { locale, timezone }
    }

    /// Short month/day/year plus hour:minute; empty when there is no date.
    pub fn format(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return String::new();
        };
        match self.parse(raw) {
            Some(instant) => instant
                .with_timezone(&self.timezone)
                .format(self.locale.pattern())
                .to_string(),
            None => INVALID_DATE.to_string(),
        }
    }

    fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        // Timestamps without an offset are wall-clock time in the display zone.
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return self
                    .timezone
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

/// Peer fields picked out of a resolved event for its list preview.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PreviewSelection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: Option<ImageField>,
}

impl PreviewSelection {
    pub fn select(schema: &DocumentType, document: &Value) -> serde_json::Result<Self> {
        let mut picked = Map::new();
        for (key, path) in schema.preview_select {
            if let Some(value) = select_path(document, path) {
                picked.insert((*key).to_string(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(picked))
    }
}

pub fn select_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
        .filter(|value| !value.is_null())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PreviewMedia {
    Image(ImageField),
    Icon { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub title: String,
    pub subtitle: String,
    pub media: PreviewMedia,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub fn prepare(selection: &PreviewSelection, formatter: &DateFormatter) -> Preview {
    let name = non_empty(&selection.name).unwrap_or(UNTITLED_EVENT);
    let date = formatter.format(selection.date.as_deref());

    let title = match non_empty(&selection.artist) {
        Some(artist) => format!("{name} ({artist})"),
        None => name.to_string(),
    };
    let subtitle = match non_empty(&selection.venue) {
        Some(venue) => format!("{date} @ {venue}"),
        None => date,
    };
    let media = match &selection.image {
        Some(image) => PreviewMedia::Image(image.clone()),
        None => PreviewMedia::Icon {
            name: CALENDAR_ICON,
        },
    };

    Preview {
        title,
        subtitle,
        media,
    }
}
