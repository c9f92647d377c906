//! Read-only client for the public web front-end.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use super::http::SanityClient;
use super::{decode_result, ClientConfig, ClientError, ContentStore, QueryParams};
use crate::models::Slug;

pub const PROJECT_ID: &str = "mw7e9in4";
pub const DATASET: &str = "production";
pub const API_VERSION: &str = "2025-07-09";
/// Every read hits the origin so published edits show up immediately.
pub const USE_CDN: bool = false;

pub const EVENTS_QUERY: &str = r#"*[
    _type == "event"
    && defined(slug.current)
  ]|order(date desc){_id, name, slug, date, format, "venue": venue->name, "headline": headline->name}"#;

pub fn read_config() -> ClientConfig {
    ClientConfig::new(PROJECT_ID, DATASET, API_VERSION).with_cdn(USE_CDN)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
}

/// Exposes queries only; it holds no token and has no write path.
pub struct ReadClient {
    inner: SanityClient,
}

impl ReadClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(read_config())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let inner = SanityClient::new(config.with_token(None))?;
        Ok(Self { inner })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Option<T>, ClientError> {
        let value = self.inner.query(query, params).await?;
        decode_result(value)
    }

    pub async fn events(&self) -> Result<Vec<EventSummary>, ClientError> {
        let events = self.fetch(EVENTS_QUERY, &QueryParams::new()).await?;
        Ok(events.unwrap_or_default())
    }
}
