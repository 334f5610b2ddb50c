//! Serply.io Google search API.
//!
//! Serply takes its parameters as the last path segment
//! (`/v1/search/q=...&num=...`), not as a query string.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::form_urlencoded;

use crate::provider::{parse_json, read_body};
use crate::settings::{middle_truncate, ProviderCredential};
use crate::{
    DeviceHint, ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery,
    SearchResultRecord,
};

const ENDPOINT: &str = "https://api.serply.io/v1/search/";

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_REGION: &str = "us";
const DEFAULT_LIMIT: u32 = 100;
/// Serply accepts `num` between 10 and 100.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

/// Serply adapter.
pub struct SerplyEngine {
    endpoint: String,
}

impl SerplyEngine {
    /// Creates a new adapter against the public endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: ENDPOINT.to_string(),
        }
    }

    /// Overrides the API endpoint. A trailing slash is added if missing.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        self.endpoint = endpoint;
        self
    }

    fn request_url(&self, query: &SearchQuery) -> String {
        let region = query.region.as_deref().unwrap_or(DEFAULT_REGION);
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &query.text)
            .append_pair(
                "language",
                query.language.as_deref().unwrap_or(DEFAULT_LANGUAGE),
            )
            .append_pair("hl", &region.to_lowercase())
            .append_pair("gl", &region.to_uppercase())
            .append_pair(
                "num",
                &query
                    .result_limit
                    .unwrap_or(DEFAULT_LIMIT)
                    .clamp(MIN_RESULTS, MAX_RESULTS)
                    .to_string(),
            )
            .finish();
        format!("{}{}", self.endpoint, params)
    }
}

impl Default for SerplyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct SerplyResponse {
    results: Option<Vec<SerplyResult>>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct SerplyResult {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

#[async_trait]
impl SearchProvider for SerplyEngine {
    fn id(&self) -> ProviderId {
        ProviderId::SerplyEngine
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let api_key = credential.require("AGENT_SERPLY_API_KEY")?;
        let region = query
            .region
            .as_deref()
            .unwrap_or(DEFAULT_REGION)
            .to_uppercase();
        let device = query.device.unwrap_or(DeviceHint::Desktop);
        debug!(region = %region, device = device.as_str(), "Sending Serply request");

        let response = ctx
            .client
            .get(self.request_url(query))
            .header("X-API-KEY", api_key)
            .header("X-Proxy-Location", &region)
            .header("X-User-Agent", device.as_str())
            .send()
            .await?;
        let body = read_body(
            response,
            json!({ "auth": middle_truncate(api_key, 5), "q": query.text }),
        )
        .await?;

        parse_results(&body)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchResultRecord>> {
    let response: SerplyResponse = parse_json(body)?;
    if response.message.as_deref() == Some("Unauthorized") {
        return Err(SearchError::Rejected(
            "Unauthorized. Please double check your AGENT_SERPLY_API_KEY".to_string(),
        ));
    }
    if let Some(error) = response.error {
        return Err(SearchError::Rejected(error));
    }

    Ok(response
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| SearchResultRecord::from_parts(r.title, r.link, r.description))
        .collect())
}
