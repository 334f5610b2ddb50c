//! SearchApi (searchapi.io).
//!
//! Fronts several engines (Google, Bing, Baidu, Google News, YouTube, ...);
//! the engine is picked with `AGENT_SEARCHAPI_ENGINE`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::provider::{parse_json, read_body};
use crate::settings::{middle_truncate, ConfigSource, ProviderCredential};
use crate::{
    ProviderId, Result, SearchContext, SearchError, SearchProvider, SearchQuery, SearchResultRecord,
};

const ENDPOINT: &str = "https://www.searchapi.io/api/v1/search";
const ENGINE_KEY: &str = "AGENT_SEARCHAPI_ENGINE";
const DEFAULT_ENGINE: &str = "google";

/// SearchApi adapter.
pub struct SearchApi {
    endpoint: String,
}

impl SearchApi {
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

impl Default for SearchApi {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct SearchApiResponse {
    knowledge_graph: Option<KnowledgeGraph>,
    answer_box: Option<AnswerBox>,
    organic_results: Option<Vec<OrganicResult>>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    description: Option<String>,
    website: Option<String>,
    source: Option<Source>,
}

#[derive(Deserialize)]
struct Source {
    link: Option<String>,
}

#[derive(Deserialize)]
struct AnswerBox {
    title: Option<String>,
    answer: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[async_trait]
impl SearchProvider for SearchApi {
    fn id(&self) -> ProviderId {
        ProviderId::SearchApi
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>> {
        let api_key = credential.require("AGENT_SEARCHAPI_API_KEY")?;
        let engine = ctx
            .secrets
            .get(ENGINE_KEY)
            .unwrap_or_else(|| DEFAULT_ENGINE.to_string());

        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("engine", &engine);
            params.append_pair("q", &query.text);
            if let Some(limit) = query.result_limit {
                params.append_pair("num", &limit.to_string());
            }
            if let Some(language) = &query.language {
                params.append_pair("hl", language);
            }
            if let Some(region) = &query.region {
                params.append_pair("gl", region);
            }
            if let Some(device) = query.device {
                params.append_pair("device", device.as_str());
            }
        }
        debug!(engine = %engine, "Sending SearchApi request");

        let response = ctx
            .client
            .get(url)
            .bearer_auth(api_key)
            .header("X-SearchApi-Source", "agent-websearch")
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
    let response: SearchApiResponse = parse_json(body)?;
    if let Some(error) = response.error {
        return Err(SearchError::Rejected(error));
    }

    let mut records = Vec::new();

    if let Some(kg) = response.knowledge_graph {
        let link = kg.website.or_else(|| kg.source.and_then(|s| s.link));
        records.extend(SearchResultRecord::from_parts(kg.title, link, kg.description));
    }

    if let Some(answer) = response.answer_box {
        let snippet = answer.answer.or(answer.snippet);
        records.extend(SearchResultRecord::from_parts(answer.title, answer.link, snippet));
    }

    records.extend(
        response
            .organic_results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| SearchResultRecord::from_parts(r.title, r.link, r.snippet)),
    );

    Ok(records)
}
