//! Google Programmable Search (Custom Search JSON API).
//!
//! Free to set up, 100 calls/day.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::provider::{parse_json, read_body};
use crate::settings::{middle_truncate, ProviderCredential};
use crate::{
    ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery, SearchResultRecord,
};

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API refuses `num` above this.
const MAX_RESULTS: u32 = 10;

/// Google Custom Search adapter.
pub struct GoogleSearchEngine {
    endpoint: String,
}

impl GoogleSearchEngine {
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

impl Default for GoogleSearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    items: Option<Vec<GoogleItem>>,
    error: Option<GoogleError>,
}

#[derive(Deserialize)]
struct GoogleItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Deserialize)]
struct GoogleError {
    message: Option<String>,
}

#[async_trait]
impl SearchProvider for GoogleSearchEngine {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleSearchEngine
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let key = credential.require("AGENT_GSE_KEY")?;
        let cx = credential.require("AGENT_GSE_CTX")?;

        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("key", key);
            params.append_pair("cx", cx);
            params.append_pair("q", &query.text);
            if let Some(limit) = query.result_limit {
                params.append_pair("num", &limit.clamp(1, MAX_RESULTS).to_string());
            }
            if let Some(language) = &query.language {
                params.append_pair("lr", &format!("lang_{}", language));
            }
            if let Some(region) = &query.region {
                params.append_pair("gl", region);
            }
        }
        debug!(endpoint = %self.endpoint, "Sending Google search request");

        let response = ctx.client.get(url).send().await?;
        let body = read_body(
            response,
            json!({
                "key": middle_truncate(key, 5),
                "cx": middle_truncate(cx, 5),
                "q": query.text,
            }),
        )
        .await?;

        parse_results(&body)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchResultRecord>> {
    let response: GoogleResponse = parse_json(body)?;
    if let Some(error) = response.error {
        return Err(SearchError::Rejected(
            error
                .message
                .unwrap_or_else(|| "Google rejected the request".to_string()),
        ));
    }

    Ok(response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| SearchResultRecord::from_parts(item.title, item.link, item.snippet))
        .collect())
}
