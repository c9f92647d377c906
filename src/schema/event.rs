//! The `event` document type and the rules that hang off its fields.

use serde_json::{json, Value};

use super::{
    Condition, DocumentType, FieldCheck, FieldContext, FieldDef, FieldGroup, FieldKind, Layout,
    Rule,
};
use crate::models::{EventFormat, DEFAULT_DOORS_OPEN_MINUTES, EVENT_TYPE};
use crate::principal::is_administrator;

pub const SLUG_REQUIRED_MESSAGE: &str = "You must provide a slug";
pub const VENUE_VIRTUAL_MESSAGE: &str = "Only in-person events can have a venue";
pub const EVENT_TYPE_DEPRECATION: &str = "Use the \"Event format\" field instead.";
pub const DOORS_OPEN_DESCRIPTION: &str =
    "Number of minutes before the event starts that doors will open";

const PREVIEW_SELECT: &[(&str, &str)] = &[
    ("name", "name"),
    ("venue", "venue.name"),
    ("artist", "headline.name"),
    ("date", "date"),
    ("image", "image"),
];

pub fn event_type() -> DocumentType {
    DocumentType {
        name: EVENT_TYPE,
        title: "Event",
        icon: "calendar",
        groups: vec![
            FieldGroup {
                name: "details",
                title: "Details",
            },
            FieldGroup {
                name: "editorial",
                title: "Editorial",
            },
        ],
        fields: vec![
            FieldDef::new(
                "name",
                FieldKind::String {
                    list: None,
                    layout: None,
                },
            )
            .group("details"),
            FieldDef::new("slug", FieldKind::Slug { source: "name" })
                .rule(Rule::required_with(SLUG_REQUIRED_MESSAGE))
                .hidden(Condition::When(slug_hidden))
                .read_only(Condition::When(slug_read_only))
                .group("details"),
            FieldDef::new(
                "eventType",
                FieldKind::String {
                    list: Some(EventFormat::OPTIONS),
                    layout: Some(Layout::Radio),
                },
            )
            .deprecated(EVENT_TYPE_DEPRECATION)
            .read_only(Condition::Always)
            .group("details"),
            FieldDef::new(
                "format",
                FieldKind::String {
                    list: Some(EventFormat::OPTIONS),
                    layout: Some(Layout::Radio),
                },
            )
            .rule(Rule::required()),
            FieldDef::new("date", FieldKind::Datetime).group("details"),
            FieldDef::new("doorsOpen", FieldKind::Number)
                .initial_value(json!(DEFAULT_DOORS_OPEN_MINUTES))
                .description(DOORS_OPEN_DESCRIPTION)
                .group("details"),
            FieldDef::new("venue", FieldKind::Reference { to: &["venue"] })
                .rule(Rule::Custom(venue_in_person_only))
                .read_only(Condition::When(venue_read_only))
                .group("details"),
            FieldDef::new("headline", FieldKind::Reference { to: &["artist"] })
                .group("editorial"),
            FieldDef::new("image", FieldKind::Image).group("editorial"),
            FieldDef::new("details", FieldKind::Array { of: &["block"] }).group("editorial"),
            FieldDef::new("tickets", FieldKind::Url).group("editorial"),
            FieldDef::new("firstPublished", FieldKind::Datetime)
                .description("Automatically set when first published")
                .read_only(Condition::Always),
        ],
        preview_select: PREVIEW_SELECT,
    }
}

/// `format` decides; the legacy `eventType` only counts while `format` is unset.
pub fn is_virtual(document: &Value) -> bool {
    let virtual_name = EventFormat::Virtual.as_str();
    match document.get("format").and_then(Value::as_str) {
        Some(format) => format == virtual_name,
        None => document.get("eventType").and_then(Value::as_str) == Some(virtual_name),
    }
}

pub fn slug_hidden(ctx: &FieldContext<'_>) -> bool {
    ctx.document_str("name").map_or(true, str::is_empty)
}

pub fn slug_read_only(ctx: &FieldContext<'_>) -> bool {
    // Anyone may set the first slug; changing it afterwards is admin-only.
    if !ctx.has_value() {
        return false;
    }
    !is_administrator(ctx.principal)
}

pub fn venue_read_only(ctx: &FieldContext<'_>) -> bool {
    !ctx.has_value() && is_virtual(ctx.document)
}

pub fn venue_in_person_only(ctx: &FieldContext<'_>) -> FieldCheck {
    if ctx.has_value() && is_virtual(ctx.document) {
        return FieldCheck::blocked(VENUE_VIRTUAL_MESSAGE);
    }
    FieldCheck::Ok
}
