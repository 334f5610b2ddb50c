//! Bing Web Search API v7 (Azure).

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

const ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Bing Web Search adapter.
pub struct BingSearch {
    endpoint: String,
}

impl BingSearch {
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

impl Default for BingSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingResponse {
    #[serde(rename = "_type")]
    kind: Option<String>,
    web_pages: Option<WebPages>,
    errors: Option<Vec<BingError>>,
}

#[derive(Deserialize)]
struct WebPages {
    value: Vec<WebPage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    name: Option<String>,
    url: Option<String>,
    snippet: Option<String>,
    date_published: Option<String>,
}

#[derive(Deserialize)]
struct BingError {
    message: Option<String>,
}

#[async_trait]
impl SearchProvider for BingSearch {
    fn id(&self) -> ProviderId {
        ProviderId::BingSearch
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let api_key = credential.require("AGENT_BING_SEARCH_API_KEY")?;

        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("q", &query.text);
            if let Some(limit) = query.result_limit {
                params.append_pair("count", &limit.to_string());
            }
            if let Some(language) = &query.language {
                params.append_pair("setLang", language);
            }
            if let (Some(language), Some(region)) = (&query.language, &query.region) {
                params.append_pair("mkt", &format!("{}-{}", language, region.to_uppercase()));
            }
        }
        debug!("Sending Bing Web Search request");

        let response = ctx
            .client
            .get(url)
            .header("Ocp-Apim-Subscription-Key", api_key)
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
    let response: BingResponse = parse_json(body)?;
    if response.kind.as_deref() == Some("ErrorResponse") {
        let message = response
            .errors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SearchError::Rejected(if message.is_empty() {
            "Bing returned an error response".to_string()
        } else {
            message
        }));
    }

    Ok(response
        .web_pages
        .map(|pages| pages.value)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|page| {
            SearchResultRecord::from_parts(page.name, page.url, page.snippet)
                .map(|record| record.with_published_date(page.date_published))
        })
        .collect())
}
