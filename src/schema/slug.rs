use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{is_present, DocumentType, FieldKind};
use crate::models::Slug;

pub const MAX_SLUG_LENGTH: usize = 200;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid slug separator regex"));

pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let dashed = SEPARATOR_RE.replace_all(&lowered, "-");
    dashed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LENGTH)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Builds a slug from the document's `source` field, if that field has text.
pub fn generate(document: &Value, source: &str) -> Option<Slug> {
    let text = document.get(source)?.as_str()?;
    let slug = slugify(text);
    if slug.is_empty() {
        None
    } else {
        Some(Slug::new(slug))
    }
}

/// A slug for every empty slug field, generated from that field's source.
pub fn suggest(schema: &DocumentType, document: &Value) -> Vec<(&'static str, Slug)> {
    schema
        .fields
        .iter()
        .filter_map(|field| match field.kind {
            FieldKind::Slug { source } => Some((field.name, source)),
            _ => None,
        })
        .filter(|(name, _)| !document.get(*name).is_some_and(is_present))
        .filter_map(|(name, source)| generate(document, source).map(|slug| (name, slug)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Jazz Night"), "jazz-night");
        assert_eq!(slugify("  PUP / Chase Petra!! "), "pup-chase-petra");
        assert_eq!(slugify("Café Tacvba @ 9:30"), "café-tacvba-9-30");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn truncates_long_names() {
        let long = "a ".repeat(300);
        let slug = slugify(&long);
        assert!(slug.chars().count() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn generates_from_source_field() {
        let doc = json!({"name": "Blue Note Sessions"});
        assert_eq!(generate(&doc, "name"), Some(Slug::new("blue-note-sessions")));
        assert_eq!(generate(&json!({"name": ""}), "name"), None);
        assert_eq!(generate(&json!({}), "name"), None);
    }

    #[test]
    fn suggests_only_for_empty_slugs() {
        let schema = crate::schema::event::event_type();
        let unset = json!({"name": "Jazz Night", "slug": {"_type": "slug"}});
        assert_eq!(
            suggest(&schema, &unset),
            vec![("slug", Slug::new("jazz-night"))]
        );

        let set = json!({"name": "Jazz Night", "slug": {"current": "custom"}});
        assert!(suggest(&schema, &set).is_empty());
        assert!(suggest(&schema, &json!({})).is_empty());
    }
}
