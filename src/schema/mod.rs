pub mod event;
pub mod slug;
pub mod validation;

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::principal::Principal;

/// Everything a conditional field rule is allowed to look at.
#[derive(Clone, Copy, Debug)]
pub struct FieldContext<'a> {
    pub value: Option<&'a Value>,
    pub document: &'a Value,
    pub principal: Option<&'a Principal>,
}

impl<'a> FieldContext<'a> {
    pub fn for_field(
        field: &str,
        document: &'a Value,
        principal: Option<&'a Principal>,
    ) -> Self {
        Self {
            value: document.get(field),
            document,
            principal,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some_and(is_present)
    }

    pub fn document_str(&self, field: &str) -> Option<&'a str> {
        self.document.get(field).and_then(Value::as_str)
    }
}

/// Whether a stored value counts as "set" the way the editor treats it.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) | Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => {
            if let Some(current) = map.get("current") {
                current.as_str().is_some_and(|s| !s.is_empty())
            } else if let Some(target) = map.get("_ref") {
                target.as_str().is_some_and(|s| !s.is_empty())
            } else {
                map.keys().any(|key| !key.starts_with('_'))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FieldCheck {
    Ok,
    Blocked { reason: String },
}

impl FieldCheck {
    pub fn blocked(reason: impl Into<String>) -> Self {
        FieldCheck::Blocked {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FieldCheck::Ok)
    }
}

pub type Predicate = fn(&FieldContext<'_>) -> bool;
pub type CustomRule = fn(&FieldContext<'_>) -> FieldCheck;

#[derive(Clone, Copy)]
pub enum Condition {
    Never,
    Always,
    When(Predicate),
}

impl Condition {
    pub fn evaluate(&self, ctx: &FieldContext<'_>) -> bool {
        match self {
            Condition::Never => false,
            Condition::Always => true,
            Condition::When(predicate) => predicate(ctx),
        }
    }

    fn is_never(&self) -> bool {
        matches!(self, Condition::Never)
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Never => f.write_str("Never"),
            Condition::Always => f.write_str("Always"),
            Condition::When(_) => f.write_str("When(..)"),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Never => serializer.serialize_bool(false),
            Condition::Always => serializer.serialize_bool(true),
            Condition::When(_) => serializer.serialize_str("conditional"),
        }
    }
}

#[derive(Clone, Copy)]
pub enum Rule {
    Required { message: Option<&'static str> },
    Custom(CustomRule),
}

pub const DEFAULT_REQUIRED_MESSAGE: &str = "Required";

impl Rule {
    pub fn required() -> Self {
        Rule::Required { message: None }
    }

    pub fn required_with(message: &'static str) -> Self {
        Rule::Required {
            message: Some(message),
        }
    }

    pub fn check(&self, ctx: &FieldContext<'_>) -> FieldCheck {
        match self {
            Rule::Required { message } => {
                if ctx.has_value() {
                    FieldCheck::Ok
                } else {
                    FieldCheck::blocked(message.unwrap_or(DEFAULT_REQUIRED_MESSAGE))
                }
            }
            Rule::Custom(rule) => rule(ctx),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Required { message } => f
                .debug_struct("Required")
                .field("message", message)
                .finish(),
            Rule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Rule::Required { message } => {
                map.serialize_entry("rule", "required")?;
                if let Some(message) = message {
                    map.serialize_entry("message", message)?;
                }
            }
            Rule::Custom(_) => map.serialize_entry("rule", "custom")?,
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Radio,
    Dropdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        list: Option<&'static [&'static str]>,
        #[serde(skip_serializing_if = "Option::is_none")]
        layout: Option<Layout>,
    },
    Slug {
        source: &'static str,
    },
    Number,
    Datetime,
    Reference {
        to: &'static [&'static str],
    },
    Image,
    Array {
        of: &'static [&'static str],
    },
    Url,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
    #[serde(skip_serializing_if = "Condition::is_never")]
    pub hidden: Condition,
    #[serde(skip_serializing_if = "Condition::is_never")]
    pub read_only: Condition,
    #[serde(rename = "validation", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl FieldDef {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            group: None,
            description: None,
            deprecated: None,
            initial_value: None,
            hidden: Condition::Never,
            read_only: Condition::Never,
            rules: Vec::new(),
        }
    }

    pub fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn deprecated(mut self, reason: &'static str) -> Self {
        self.deprecated = Some(reason);
        self
    }

    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    pub fn hidden(mut self, condition: Condition) -> Self {
        self.hidden = condition;
        self
    }

    pub fn read_only(mut self, condition: Condition) -> Self {
        self.read_only = condition;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    pub name: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub name: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub groups: Vec<FieldGroup>,
    pub fields: Vec<FieldDef>,
    /// Preview selection: output key to dotted path on the resolved document.
    #[serde(serialize_with = "serialize_select")]
    pub preview_select: &'static [(&'static str, &'static str)],
}

fn serialize_select<S: Serializer>(
    select: &&'static [(&'static str, &'static str)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(select.iter().map(|(key, path)| (*key, *path)))
}

impl DocumentType {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Initial values for a brand-new document of this type.
    pub fn initial_document(&self) -> Value {
        let mut doc = serde_json::Map::new();
        doc.insert("_type".to_string(), Value::String(self.name.to_string()));
        for field in &self.fields {
            if let Some(initial) = &field.initial_value {
                doc.insert(field.name.to_string(), initial.clone());
            }
        }
        Value::Object(doc)
    }
}

pub fn schema_types() -> Vec<DocumentType> {
    vec![event::event_type()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_follows_editor_semantics() {
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!([])));
        assert!(!is_present(&json!({"_type": "slug"})));
        assert!(!is_present(&json!({"_type": "slug", "current": ""})));
        assert!(is_present(&json!({"_type": "slug", "current": "a"})));
        assert!(is_present(&json!({"_type": "reference", "_ref": "v1"})));
        assert!(is_present(&json!(0)));
    }

    #[test]
    fn required_rule_uses_custom_message() {
        let doc = json!({});
        let ctx = FieldContext::for_field("slug", &doc, None);
        assert_eq!(
            Rule::required_with("Need it").check(&ctx),
            FieldCheck::blocked("Need it")
        );
        assert_eq!(
            Rule::required().check(&ctx),
            FieldCheck::blocked(DEFAULT_REQUIRED_MESSAGE)
        );
    }

    #[test]
    fn field_check_serializes_as_tagged_result() {
        assert_eq!(
            serde_json::to_value(FieldCheck::Ok).expect("encode"),
            json!({"status": "ok"})
        );
        assert_eq!(
            serde_json::to_value(FieldCheck::blocked("nope")).expect("encode"),
            json!({"status": "blocked", "reason": "nope"})
        );
    }
}
