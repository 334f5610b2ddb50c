//! Serper.dev Google search API.
//!
//! 2,500 free calls one-time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::provider::{parse_json, read_body};
use crate::settings::{middle_truncate, ProviderCredential};
use crate::{
    ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery, SearchResultRecord,
};

const ENDPOINT: &str = "https://google.serper.dev/search";

/// Serper.dev adapter.
pub struct SerperDotDev {
    endpoint: String,
}

impl SerperDotDev {
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

impl Default for SerperDotDev {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    knowledge_graph: Option<KnowledgeGraph>,
    organic: Option<Vec<OrganicResult>>,
    /// Set on auth and quota failures.
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeGraph {
    title: Option<String>,
    description: Option<String>,
    website: Option<String>,
    description_link: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    date: Option<String>,
}

#[async_trait]
impl SearchProvider for SerperDotDev {
    fn id(&self) -> ProviderId {
        ProviderId::SerperDotDev
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let api_key = credential.require("AGENT_SERPER_DEV_KEY")?;
        let request = SerperRequest {
            q: &query.text,
            num: query.result_limit,
            hl: query.language.as_deref(),
            gl: query.region.as_deref(),
        };
        debug!("Sending Serper.dev request");

        let response = ctx
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&request)
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
    let response: SerperResponse = parse_json(body)?;
    if response.organic.is_none() && response.knowledge_graph.is_none() {
        if let Some(message) = response.message {
            return Err(SearchError::Rejected(message));
        }
    }

    let mut records = Vec::new();

    if let Some(kg) = response.knowledge_graph {
        let link = kg.website.or(kg.description_link);
        records.extend(SearchResultRecord::from_parts(kg.title, link, kg.description));
    }

    records.extend(
        response
            .organic
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| {
                SearchResultRecord::from_parts(r.title, r.link, r.snippet)
                    .map(|record| record.with_published_date(r.date))
            }),
    );

    Ok(records)
}
