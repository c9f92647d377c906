use std::collections::BTreeMap;

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use super::{is_present, DocumentType, FieldCheck, FieldContext, FieldDef, FieldKind};
use crate::principal::Principal;

pub const LIST_MISMATCH_MESSAGE: &str = "Value did not match any allowed values";
pub const INVALID_URL_MESSAGE: &str = "Does not look like a valid URL";
pub const NOT_A_NUMBER_MESSAGE: &str = "Must be a number";
pub const INVALID_REFERENCE_MESSAGE: &str = "Must be a reference to another document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Publishing is blocked by errors only; warnings are advisory.
    pub fn blocks_publish(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn for_field(&self, field: &str) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.field == field)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub hidden: bool,
    pub read_only: bool,
}

pub fn validate_document(
    schema: &DocumentType,
    document: &Value,
    principal: Option<&Principal>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in &schema.fields {
        let ctx = FieldContext::for_field(field.name, document, principal);

        for rule in &field.rules {
            if let FieldCheck::Blocked { reason } = rule.check(&ctx) {
                report.issues.push(ValidationIssue {
                    field: field.name,
                    severity: Severity::Error,
                    message: reason,
                });
            }
        }

        if let Some(value) = ctx.value.filter(|value| is_present(value)) {
            if let Some(message) = kind_error(&field.kind, value) {
                report.issues.push(ValidationIssue {
                    field: field.name,
                    severity: Severity::Error,
                    message: message.to_string(),
                });
            }
            if let Some(reason) = field.deprecated {
                report.issues.push(ValidationIssue {
                    field: field.name,
                    severity: Severity::Warning,
                    message: reason.to_string(),
                });
            }
        }
    }

    report
}

fn kind_error(kind: &FieldKind, value: &Value) -> Option<&'static str> {
    match kind {
        FieldKind::String {
            list: Some(options),
            ..
        } => match value.as_str() {
            Some(s) if options.iter().any(|option| *option == s) => None,
            _ => Some(LIST_MISMATCH_MESSAGE),
        },
        FieldKind::Url => match value.as_str().map(Url::parse) {
            Some(Ok(url)) if matches!(url.scheme(), "http" | "https") => None,
            _ => Some(INVALID_URL_MESSAGE),
        },
        FieldKind::Number if !value.is_number() => Some(NOT_A_NUMBER_MESSAGE),
        FieldKind::Reference { .. } => match value.get("_ref").and_then(Value::as_str) {
            Some(target) if !target.is_empty() => None,
            _ => Some(INVALID_REFERENCE_MESSAGE),
        },
        _ => None,
    }
}

pub fn field_state(
    field: &FieldDef,
    document: &Value,
    principal: Option<&Principal>,
) -> FieldState {
    let ctx = FieldContext::for_field(field.name, document, principal);
    FieldState {
        hidden: field.hidden.evaluate(&ctx),
        read_only: field.read_only.evaluate(&ctx),
    }
}

/// Hidden/read-only flags for every field, recomputed on each edit.
pub fn field_states(
    schema: &DocumentType,
    document: &Value,
    principal: Option<&Principal>,
) -> BTreeMap<&'static str, FieldState> {
    schema
        .fields
        .iter()
        .map(|field| (field.name, field_state(field, document, principal)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::ADMINISTRATOR;
    use crate::schema::event::{event_type, SLUG_REQUIRED_MESSAGE, VENUE_VIRTUAL_MESSAGE};
    use serde_json::json;

    fn valid_event() -> Value {
        json!({
            "_type": "event",
            "name": "Jazz Night",
            "slug": {"_type": "slug", "current": "jazz-night"},
            "format": "in-person",
            "doorsOpen": 60,
            "venue": {"_type": "reference", "_ref": "venue-1"},
            "tickets": "https://tickets.example.com/jazz"
        })
    }

    #[test]
    fn valid_event_passes() {
        let report = validate_document(&event_type(), &valid_event(), None);
        assert_eq!(report.issues, Vec::new());
        assert!(!report.blocks_publish());
    }

    #[test]
    fn missing_slug_and_format_block_publish() {
        let report = validate_document(&event_type(), &json!({"name": "Jazz Night"}), None);
        assert!(report.blocks_publish());
        assert_eq!(report.for_field("slug")[0].message, SLUG_REQUIRED_MESSAGE);
        assert_eq!(report.for_field("format")[0].message, "Required");
        assert_eq!(report.errors().count(), 2);
    }

    #[test]
    fn every_virtual_event_with_venue_is_rejected() {
        for venue in ["venue-1", "venue-2", "some-other-venue"] {
            let mut doc = valid_event();
            doc["format"] = json!("virtual");
            doc["venue"] = json!({"_type": "reference", "_ref": venue});
            let report = validate_document(&event_type(), &doc, None);
            let issues = report.for_field("venue");
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].message, VENUE_VIRTUAL_MESSAGE);
            assert_eq!(issues[0].severity, Severity::Error);
        }
    }

    #[test]
    fn type_level_checks() {
        let mut doc = valid_event();
        doc["format"] = json!("hybrid");
        doc["tickets"] = json!("ftp://example.com");
        doc["doorsOpen"] = json!("sixty");
        let report = validate_document(&event_type(), &doc, None);

        assert_eq!(report.for_field("format")[0].message, LIST_MISMATCH_MESSAGE);
        assert_eq!(report.for_field("tickets")[0].message, INVALID_URL_MESSAGE);
        assert_eq!(report.for_field("doorsOpen")[0].message, NOT_A_NUMBER_MESSAGE);
    }

    #[test]
    fn legacy_event_type_warns_without_blocking() {
        let mut doc = valid_event();
        doc["eventType"] = json!("in-person");
        let report = validate_document(&event_type(), &doc, None);
        let issues = report.for_field("eventType");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(!report.blocks_publish());
    }

    #[test]
    fn field_states_follow_principal() {
        let schema = event_type();
        let editor = Principal::with_roles(["editor"]);
        let admin = Principal::with_roles([ADMINISTRATOR]);
        let doc = valid_event();

        let editor_states = field_states(&schema, &doc, Some(&editor));
        assert!(editor_states["slug"].read_only);
        assert!(!editor_states["slug"].hidden);
        assert!(editor_states["eventType"].read_only);
        assert!(editor_states["firstPublished"].read_only);
        assert!(!editor_states["name"].read_only);

        let admin_states = field_states(&schema, &doc, Some(&admin));
        assert!(!admin_states["slug"].read_only);

        let unnamed = json!({"_type": "event"});
        let states = field_states(&schema, &unnamed, Some(&admin));
        assert!(states["slug"].hidden);
    }
}
