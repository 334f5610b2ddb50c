//! DuckDuckGo HTML endpoint.
//!
//! There is no JSON contract here: results are scraped from the markup of
//! `html.duckduckgo.com`, which can change without notice. Any result block
//! missing a title, link or snippet is dropped rather than guessed at. The
//! adapter sits behind the `duckduckgo` cargo feature so it can be left out
//! of builds that only want contract-backed providers.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;
use tracing::{debug, warn};

use crate::provider::read_body;
use crate::settings::ProviderCredential;
use crate::{
    ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery, SearchResultRecord,
};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo adapter.
pub struct DuckDuckGoEngine {
    endpoint: String,
}

impl DuckDuckGoEngine {
    /// Creates a new adapter against the public endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: ENDPOINT.to_string(),
        }
    }

    /// Overrides the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, query: &SearchQuery) -> String {
        let mut url = format!("{}?q={}", self.endpoint, urlencoding::encode(&query.text));
        if let (Some(region), Some(language)) = (&query.region, &query.language) {
            url.push_str(&format!("&kl={}-{}", region.to_lowercase(), language.to_lowercase()));
        }
        url
    }
}

impl Default for DuckDuckGoEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoEngine {
    fn id(&self) -> ProviderId {
        ProviderId::DuckDuckGoEngine
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let url = self.request_url(query);
        debug!(url = %url, "Fetching DuckDuckGo results page");

        let response = ctx.client.get(&url).send().await?;
        let html = read_body(response, json!({ "url": url })).await?;

        if html.contains("anomaly-modal") || html.contains("challenge-form") {
            return Err(SearchError::Rejected(
                "DuckDuckGo served a bot challenge instead of results. Try again later."
                    .to_string(),
            ));
        }

        let (records, blocks) = parse_results(&html)?;
        if records.is_empty() && blocks > 0 {
            warn!(blocks, "DuckDuckGo result blocks found but none were readable");
            ctx.narrate(&format!(
                "DuckDuckGo returned {} result blocks but none could be read. Its page layout may have changed.",
                blocks
            ));
        }
        Ok(records)
    }
}

/// Returns the readable records and the number of result blocks seen.
fn parse_results(html: &str) -> Result<(Vec<SearchResultRecord>, usize)> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse("div.result.results_links")
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))?;
    let title_selector = Selector::parse("a.result__a")
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))?;
    let snippet_selector = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector: {:?}", e)))?;
    let whitespace = Regex::new(r"\s+")
        .map_err(|e| SearchError::Parse(format!("Failed to compile pattern: {}", e)))?;

    let clean = |text: String| whitespace.replace_all(text.trim(), " ").into_owned();

    let mut records = Vec::new();
    let mut blocks = 0;

    for element in document.select(&result_selector) {
        if element.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        blocks += 1;

        let Some(title_elem) = element.select(&title_selector).next() else {
            continue;
        };
        let title = clean(title_elem.text().collect());
        let href = title_elem.value().attr("href").unwrap_or_default();
        let link = if href.contains("duckduckgo.com/l/") {
            extract_redirect_url(href).unwrap_or_else(|| href.to_string())
        } else {
            href.to_string()
        };
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|e| clean(e.text().collect()))
            .unwrap_or_default();

        if !title.is_empty() && !link.is_empty() && !snippet.is_empty() {
            records.push(SearchResultRecord::new(title, link, snippet));
        }
    }

    Ok((records, blocks))
}

fn extract_redirect_url(url: &str) -> Option<String> {
    let (_, encoded) = url.split_once("uddg=")?;
    let encoded = encoded.split('&').next().unwrap_or(encoded);
    let decoded = urlencoding::decode(encoded).ok()?;
    Some(decoded.into_owned())
}
