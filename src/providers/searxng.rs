//! Self-hosted SearXNG instance (JSON output format).
//!
//! The instance must have `json` enabled under `search.formats`, otherwise
//! it answers 403.

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

const BASE_URL_KEY: &str = "AGENT_SEARXNG_API_URL";

/// SearXNG adapter. The endpoint is the configured base URL.
#[derive(Default)]
pub struct SearXngEngine;

impl SearXngEngine {
    /// Creates a new adapter.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearXngResponse {
    results: Option<Vec<SearXngResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearXngResult {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
    published_date: Option<String>,
}

fn request_url(base: &str, query: &SearchQuery) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| {
        SearchError::InvalidConfig(format!(
            "The URL provided for SearXNG is not a valid URL ({}).",
            e
        ))
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::InvalidConfig(
            "The URL provided for SearXNG is not a valid http(s) URL.".to_string(),
        ));
    }
    {
        let mut params = url.query_pairs_mut();
        params.append_pair("q", &query.text);
        params.append_pair("format", "json");
        if let Some(language) = &query.language {
            params.append_pair("language", language);
        }
    }
    Ok(url)
}

/// The request URL for logs and diagnostics: userinfo is dropped and every
/// query value other than the search itself is middle-truncated.
fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let _ = shown.set_username("");
    let _ = shown.set_password(None);
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = match k.as_ref() {
                "q" | "format" | "language" => v.into_owned(),
                _ => middle_truncate(&v, 3),
            };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

#[async_trait]
impl SearchProvider for SearXngEngine {
    fn id(&self) -> ProviderId {
        ProviderId::SearXngEngine
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let url = request_url(credential.require(BASE_URL_KEY)?, query)?;
        let shown = redacted(&url);
        debug!(url = %shown, "Sending SearXNG request");

        let response = ctx.client.get(url).send().await?;
        let body = read_body(response, json!({ "url": shown })).await?;

        parse_results(&body)
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchResultRecord>> {
    let response: SearXngResponse = parse_json(body)?;
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
