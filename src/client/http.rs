use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{ClientConfig, ClientError, Committed, ContentStore, Patch, QueryParams};

const USER_AGENT: &str = concat!("dayone-content/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(rename = "transactionId")]
    transaction_id: String,
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    id: String,
    #[serde(default)]
    document: Option<Value>,
}

/// HTTP client for the content lake's query and mutate endpoints.
pub struct SanityClient {
    config: ClientConfig,
    http: Client,
}

impl SanityClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| ClientError::Http(err.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn query_url(&self, query: &str, params: &QueryParams) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!(
            "{}/data/query/{}",
            self.config.api_root(),
            self.config.dataset
        ))
        .map_err(|err| ClientError::Http(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            for (name, value) in params {
                pairs.append_pair(&format!("${name}"), &value.to_string());
            }
        }
        Ok(url)
    }

    /// Mutations never go through the edge cache.
    pub fn mutate_url(&self) -> Result<Url, ClientError> {
        let origin = self.config.clone().with_cdn(false);
        let mut url = Url::parse(&format!(
            "{}/data/mutate/{}",
            origin.api_root(),
            origin.dataset
        ))
        .map_err(|err| ClientError::Http(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("returnIds", "true")
            .append_pair("returnDocuments", "true")
            .append_pair("visibility", "sync");
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), ClientError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        Ok((status, text))
    }
}

/// A failed revision guard comes back as 409; any other non-2xx is an API error.
fn check_mutate_status(
    status: StatusCode,
    document_id: String,
    body: String,
) -> Result<String, ClientError> {
    if status == StatusCode::CONFLICT {
        return Err(ClientError::Conflict(document_id));
    }
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

impl ContentStore for SanityClient {
    #[instrument(skip(self, params))]
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, ClientError> {
        let url = self.query_url(query, params)?;
        let (status, text) = self.send(self.http.get(url)).await?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: QueryResponse =
            serde_json::from_str(&text).map_err(|err| ClientError::Parse(err.to_string()))?;
        debug!(found = !payload.result.is_null(), "query finished");
        Ok(payload.result)
    }

    #[instrument(skip(self, patch), fields(document = %patch.id))]
    async fn commit(&self, patch: Patch) -> Result<Committed, ClientError> {
        if self.config.token.is_none() {
            return Err(ClientError::MissingToken);
        }

        let url = self.mutate_url()?;
        let document_id = patch.id.clone();
        let body = json!({ "mutations": [{ "patch": patch }] });
        let (status, text) = self.send(self.http.post(url).json(&body)).await?;
        let text = check_mutate_status(status, document_id, text)?;

        let payload: MutateResponse =
            serde_json::from_str(&text).map_err(|err| ClientError::Parse(err.to_string()))?;
        let result = payload.results.into_iter().next().ok_or_else(|| {
            ClientError::Parse("mutation response contained no results".to_string())
        })?;
        debug!(transaction = %payload.transaction_id, "patch committed");

        Ok(Committed {
            transaction_id: payload.transaction_id,
            id: result.id,
            document: result.document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(use_cdn: bool) -> SanityClient {
        let config = ClientConfig::new("mw7e9in4", "production", "2024-05-15").with_cdn(use_cdn);
        SanityClient::new(config).expect("build client")
    }

    #[test]
    fn query_url_carries_query_and_params() {
        let mut params = QueryParams::new();
        params.insert("slug".to_string(), Value::String("jazz-night".to_string()));
        let url = client(false)
            .query_url("*[slug.current == $slug][0]", &params)
            .expect("query url");

        assert_eq!(url.host_str(), Some("mw7e9in4.api.sanity.io"));
        assert_eq!(url.path(), "/v2024-05-15/data/query/production");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&(
            "query".to_string(),
            "*[slug.current == $slug][0]".to_string()
        )));
        assert!(pairs.contains(&("$slug".to_string(), "\"jazz-night\"".to_string())));
    }

    #[test]
    fn mutations_bypass_cdn() {
        let url = client(true).mutate_url().expect("mutate url");
        assert_eq!(url.host_str(), Some("mw7e9in4.api.sanity.io"));
        assert_eq!(url.path(), "/v2024-05-15/data/mutate/production");
        assert!(url.query().is_some_and(|q| q.contains("visibility=sync")));
    }

    #[test]
    fn conflict_status_maps_to_conflict() {
        let err = check_mutate_status(StatusCode::CONFLICT, "event-1".to_string(), String::new())
            .expect_err("409 is a conflict");
        assert!(matches!(err, ClientError::Conflict(ref id) if id == "event-1"));

        let err = check_mutate_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "event-1".to_string(),
            "boom".to_string(),
        )
        .expect_err("500 is an api error");
        assert!(matches!(err, ClientError::Api { status: 500, ref body } if body == "boom"));

        let body = check_mutate_status(StatusCode::OK, "event-1".to_string(), "{}".to_string())
            .expect("200 passes the body through");
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn commit_requires_token() {
        let err = client(false)
            .commit(Patch::new("event-1"))
            .await
            .expect_err("missing token");
        assert!(matches!(err, ClientError::MissingToken));
    }
}
