//! Access to the hosted content lake: the store trait and the patch payload.

pub mod http;
pub mod read;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

pub type QueryParams = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(String),
    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("a write token is required to commit mutations")]
    MissingToken,
    #[error("document {0} changed since it was read")]
    Conflict(String),
}

/// Connection parameters for one project/dataset pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(
        project_id: impl Into<String>,
        dataset: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            api_version: api_version.into(),
            use_cdn: false,
            token: None,
        }
    }

    pub fn with_cdn(mut self, use_cdn: bool) -> Self {
        self.use_cdn = use_cdn;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Edge cache for anonymous reads when enabled, origin otherwise.
    pub fn host(&self) -> String {
        let api = if self.use_cdn { "apicdn" } else { "api" };
        format!("{}.{api}.sanity.io", self.project_id)
    }

    pub fn api_root(&self) -> String {
        let version = self.api_version.trim_start_matches('v');
        format!("https://{}/v{version}", self.host())
    }
}

/// A partial update of one document, committed as a single mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patch {
    pub id: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(rename = "ifRevisionID", skip_serializing_if = "Option::is_none")]
    pub if_revision_id: Option<String>,
}

impl Patch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            set: Map::new(),
            if_revision_id: None,
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.insert(field.into(), value);
        self
    }

    /// Fail the commit if the document moved past `revision`.
    pub fn if_revision(mut self, revision: Option<String>) -> Self {
        self.if_revision_id = revision;
        self
    }

    pub async fn commit<S>(self, store: &S) -> Result<Committed, ClientError>
    where
        S: ContentStore,
    {
        store.commit(self).await
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Committed {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub id: String,
    #[serde(default)]
    pub document: Option<Value>,
}

#[allow(async_fn_in_trait)]
pub trait ContentStore {
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, ClientError>;
    async fn commit(&self, patch: Patch) -> Result<Committed, ClientError>;
}

/// Runs `query` and decodes its result; a `null` result means nothing matched.
pub async fn fetch<T, S>(
    store: &S,
    query: &str,
    params: &QueryParams,
) -> Result<Option<T>, ClientError>
where
    T: DeserializeOwned,
    S: ContentStore,
{
    let value = store.query(query, params).await?;
    decode_result(value)
}

pub(crate) fn decode_result<T: DeserializeOwned>(value: Value) -> Result<Option<T>, ClientError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ClientError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn origin_host_when_cdn_disabled() {
        let config = ClientConfig::new("mw7e9in4", "production", "2025-07-09");
        assert_eq!(config.host(), "mw7e9in4.api.sanity.io");
        assert_eq!(config.api_root(), "https://mw7e9in4.api.sanity.io/v2025-07-09");

        let cdn = config.with_cdn(true);
        assert_eq!(cdn.host(), "mw7e9in4.apicdn.sanity.io");
    }

    #[test]
    fn blank_token_is_dropped() {
        let config = ClientConfig::new("p", "d", "2024-05-15").with_token(Some("  ".to_string()));
        assert_eq!(config.token, None);
    }

    #[test]
    fn patch_payload_shape() {
        let patch = Patch::new("event-1")
            .set("details", json!([]))
            .if_revision(Some("rev-1".to_string()));
        assert_eq!(
            serde_json::to_value(&patch).expect("encode patch"),
            json!({"id": "event-1", "set": {"details": []}, "ifRevisionID": "rev-1"})
        );
    }

    #[test]
    fn null_result_decodes_to_none() {
        let none: Option<Value> = decode_result(Value::Null).expect("decode null");
        assert_eq!(none, None);
        let err = decode_result::<u32>(json!("x")).expect_err("type mismatch");
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
