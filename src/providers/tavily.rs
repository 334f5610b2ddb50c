//! Tavily search API. The key travels in the JSON body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::provider::{parse_json, read_body};
use crate::settings::{middle_truncate, ProviderCredential};
use crate::{
    ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery, SearchResultRecord,
};

const ENDPOINT: &str = "https://api.tavily.com/search";

/// Tavily adapter.
pub struct TavilySearch {
    endpoint: String,
}

impl TavilySearch {
    /// Creates a new adapter against the public endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: ENDPOINT.to_string(),
        }
    }

    /// Overrides the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for TavilySearch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    results: Option<Vec<TavilyResult>>,
    detail: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    published_date: Option<String>,
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn id(&self) -> ProviderId {
        ProviderId::TavilySearch
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let api_key = credential.require("AGENT_TAVILY_API_KEY")?;
        let request = TavilyRequest {
            api_key,
            query: &query.text,
            max_results: query.result_limit,
        };
        debug!("Sending Tavily request");

        let response = ctx.client.post(&self.endpoint).json(&request).send().await?;
        let body = read_body(
            response,
            json!({ "auth": middle_truncate(api_key, 5), "q": query.text }),
        )
        .await?;

        parse_results(&body)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchResultRecord>> {
    let response: TavilyResponse = parse_json(body)?;
    if response.results.is_none() {
        if let Some(error) = response.error {
            return Err(SearchError::Rejected(error));
        }
        if let Some(detail) = response.detail {
            // Either {"detail": {"error": "..."}} or {"detail": "..."}.
            let message = detail
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
                .or_else(|| detail.as_str().map(str::to_string))
                .unwrap_or_else(|| detail.to_string());
            return Err(SearchError::Rejected(message));
        }
    }

    Ok(response
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| {
            SearchResultRecord::from_parts(r.title, r.url, r.content)
                .map(|record| record.with_published_date(r.published_date))
        })
        .collect())
}
