//! Search provider trait and identifiers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::settings::{ConfigSource, ProviderCredential};
use crate::tokens::format_thousands;
use crate::{Narrator, Result, SearchError, SearchOutcome, SearchQuery, SearchResultRecord, TokenCounter};

/// The search backends this crate can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    GoogleSearchEngine,
    #[serde(rename = "searchapi")]
    SearchApi,
    SerperDotDev,
    BingSearch,
    SerplyEngine,
    #[serde(rename = "searxng-engine")]
    SearXngEngine,
    TavilySearch,
    #[serde(rename = "duckduckgo-engine")]
    DuckDuckGoEngine,
}

impl ProviderId {
    /// Every provider, in listing order.
    pub const ALL: [ProviderId; 8] = [
        ProviderId::GoogleSearchEngine,
        ProviderId::SearchApi,
        ProviderId::SerperDotDev,
        ProviderId::BingSearch,
        ProviderId::SerplyEngine,
        ProviderId::SearXngEngine,
        ProviderId::TavilySearch,
        ProviderId::DuckDuckGoEngine,
    ];

    /// Provider used when the configured id is absent or unknown.
    pub const DEFAULT: ProviderId = ProviderId::GoogleSearchEngine;

    /// The configuration identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleSearchEngine => "google-search-engine",
            Self::SearchApi => "searchapi",
            Self::SerperDotDev => "serper-dot-dev",
            Self::BingSearch => "bing-search",
            Self::SerplyEngine => "serply-engine",
            Self::SearXngEngine => "searxng-engine",
            Self::TavilySearch => "tavily-search",
            Self::DuckDuckGoEngine => "duckduckgo-engine",
        }
    }

    /// Human-readable name used in narration.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GoogleSearchEngine => "Google",
            Self::SearchApi => "SearchApi",
            Self::SerperDotDev => "Serper.dev",
            Self::BingSearch => "Bing Web Search",
            Self::SerplyEngine => "Serply",
            Self::SearXngEngine => "SearXNG",
            Self::TavilySearch => "Tavily",
            Self::DuckDuckGoEngine => "DuckDuckGo",
        }
    }

    /// Secrets or endpoints that must be configured before any request.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::GoogleSearchEngine => &["AGENT_GSE_KEY", "AGENT_GSE_CTX"],
            Self::SearchApi => &["AGENT_SEARCHAPI_API_KEY"],
            Self::SerperDotDev => &["AGENT_SERPER_DEV_KEY"],
            Self::BingSearch => &["AGENT_BING_SEARCH_API_KEY"],
            Self::SerplyEngine => &["AGENT_SERPLY_API_KEY"],
            Self::SearXngEngine => &["AGENT_SEARXNG_API_URL"],
            Self::TavilySearch => &["AGENT_TAVILY_API_KEY"],
            Self::DuckDuckGoEngine => &[],
        }
    }

    /// What the missing configuration is for and where to get it.
    pub fn setup_hint(&self) -> &'static str {
        match self {
            Self::GoogleSearchEngine => "Google searching needs an API key and a search engine ID. Visit: https://programmablesearchengine.google.com/controlpanel/create to create the API keys.",
            Self::SearchApi => "SearchApi searching needs an API key. Visit: https://www.searchapi.io/ to create the API key for free.",
            Self::SerperDotDev => "Serper.dev searching needs an API key. Visit: https://serper.dev to create the API key for free.",
            Self::BingSearch => "Bing Web Search needs a subscription key. Visit: https://portal.azure.com/ to create the API key.",
            Self::SerplyEngine => "Serply searching needs an API key. Visit: https://serply.io to create the API key for free.",
            Self::SearXngEngine => "SearXNG searching needs the base URL of a SearXNG instance. Please set this value in the agent skill settings.",
            Self::TavilySearch => "Tavily searching needs an API key. Visit: https://tavily.com/ to create the API key.",
            Self::DuckDuckGoEngine => "DuckDuckGo searching needs no configuration.",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| SearchError::Other(format!("Unknown search provider '{}'", s)))
    }
}

/// Collaborators handed to a provider for the duration of one call.
pub struct SearchContext<'a> {
    /// Shared HTTP client.
    pub client: &'a Client,
    /// Where credentials are read from.
    pub secrets: &'a dyn ConfigSource,
    /// Progress channel.
    pub narrator: &'a dyn Narrator,
    /// Name narration is attributed to.
    pub actor: &'a str,
    /// Token estimator for the serialized payload.
    pub tokens: &'a dyn TokenCounter,
    /// Aborts the in-flight request when cancelled.
    pub cancel: &'a CancellationToken,
    /// Upper bound for the outbound request.
    pub timeout: Duration,
}

impl SearchContext<'_> {
    /// Sends a narration message as this context's actor.
    pub fn narrate(&self, message: &str) {
        self.narrator.narrate(self.actor, message);
    }
}

/// A search backend behind the common search capability.
///
/// Implementors only supply [`fetch`](SearchProvider::fetch). The provided
/// [`execute`](SearchProvider::execute) gates on credentials, bounds the call
/// by the context's timeout and cancellation token, and turns every error
/// into a [`SearchOutcome`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Performs the request and extracts records in provider order.
    ///
    /// Only called once every required credential is present.
    async fn fetch(
        &self,
        query: &SearchQuery,
        credential: &ProviderCredential,
        ctx: &SearchContext<'_>,
    ) -> Result<Vec<SearchResultRecord>>;

    /// Runs one search and classifies the result.
    async fn execute(&self, query: &SearchQuery, ctx: &SearchContext<'_>) -> SearchOutcome {
        let id = self.id();
        let credential = ProviderCredential::resolve(id, ctx.secrets);
        if !credential.is_present() {
            debug!(provider = %id, missing = ?credential.missing(), "Provider not configured");
            return SearchOutcome::Disabled {
                reason: disabled_reason(id, credential.missing()),
            };
        }

        let fetched = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(SearchError::Cancelled),
            res = timeout(ctx.timeout, self.fetch(query, &credential, ctx)) => {
                res.unwrap_or_else(|_| Err(SearchError::Timeout(ctx.timeout)))
            }
        };

        classify(id, fetched, ctx.tokens)
    }
}

fn disabled_reason(id: ProviderId, missing: &[&str]) -> String {
    format!(
        "Missing configuration: {}. {}",
        missing.join(", "),
        id.setup_hint()
    )
}

fn classify(
    id: ProviderId,
    fetched: Result<Vec<SearchResultRecord>>,
    tokens: &dyn TokenCounter,
) -> SearchOutcome {
    let err = match fetched.and_then(|records| SearchOutcome::from_records(records, tokens)) {
        Ok(outcome) => return outcome,
        Err(err) => err,
    };
    warn!(provider = %id, kind = ?err.kind(), "{} search failed: {}", id.display_name(), err);
    match err {
        SearchError::InvalidConfig(message) => SearchOutcome::Disabled {
            reason: format!("{} {}", message, id.setup_hint()),
        },
        other => SearchOutcome::ProviderError {
            provider: id,
            message: other.to_string(),
        },
    }
}

/// Post-call narration line for an outcome.
pub(crate) fn describe_outcome(id: ProviderId, outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Ok {
            records,
            approx_tokens,
            ..
        } => format!(
            "I found {} results - reviewing the results now. (~{} tokens)",
            records.len(),
            format_thousands(*approx_tokens)
        ),
        SearchOutcome::Disabled { reason } => format!(
            "I can't use {} searching because it is not set up. {}",
            id.display_name(),
            reason
        ),
        SearchOutcome::ProviderError { message, .. } => {
            format!("{} search failed: {}", id.display_name(), message)
        }
        SearchOutcome::Empty => format!(
            "{} returned nothing for this query. {}",
            id.display_name(),
            crate::result::NO_RESULTS_MESSAGE
        ),
    }
}

/// Returns the body of a successful response, or a `Status` error carrying
/// the already-redacted request parameters.
pub(crate) async fn read_body(response: Response, redacted: serde_json::Value) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            params: redacted.to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Deserializes a JSON body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))
}
