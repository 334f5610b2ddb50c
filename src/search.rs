//! Search dispatch: one provider call per invocation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::provider::describe_outcome;
use crate::settings::{ConfigSource, EnvSource, ProviderCredential, SEARCH_PROVIDER_KEY};
use crate::{
    Narrator, ProviderRegistry, Result, SearchContext, SearchOutcome, SearchQuery, TokenCounter,
    TracingNarrator,
};

/// Returned when the agent called the tool without a query.
pub const NOTHING_TO_SEARCH_MESSAGE: &str =
    "There is nothing we can do. This function call returns no information.";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_ACTOR: &str = "@agent";
const NARRATED_QUERY_CHARS: usize = 100;

/// Web search tool that dispatches each query to the configured provider.
///
/// Holds no per-call state. The active provider and its credentials are
/// read from the configured sources on every call.
pub struct WebSearch {
    registry: ProviderRegistry,
    settings: Arc<dyn ConfigSource>,
    secrets: Arc<dyn ConfigSource>,
    narrator: Arc<dyn Narrator>,
    tokens: Arc<dyn TokenCounter>,
    client: Client,
    timeout: Duration,
    actor: String,
}

impl WebSearch {
    /// Creates a search tool reading settings and secrets from the
    /// environment and narrating through `tracing`.
    pub fn new(tokens: Arc<dyn TokenCounter>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("agent-websearch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            registry: ProviderRegistry::new(),
            settings: Arc::new(EnvSource),
            secrets: Arc::new(EnvSource),
            narrator: Arc::new(TracingNarrator),
            tokens,
            client,
            timeout: DEFAULT_TIMEOUT,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// Sets where the active provider id is read from.
    pub fn with_settings(mut self, settings: Arc<dyn ConfigSource>) -> Self {
        self.settings = settings;
        self
    }

    /// Sets where provider credentials are read from.
    pub fn with_secrets(mut self, secrets: Arc<dyn ConfigSource>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Sets the narration sink.
    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Replaces the provider registry.
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sets the name narration is attributed to.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Sets the per-call timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Returns the provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Searches for `query` and returns text for the agent's context.
    ///
    /// Never fails: errors come back as a diagnostic sentence.
    pub async fn search(&self, query: &str) -> String {
        self.search_cancellable(query, &CancellationToken::new()).await
    }

    /// Like [`search`](Self::search), aborting the provider call when
    /// `cancel` fires.
    pub async fn search_cancellable(&self, query: &str, cancel: &CancellationToken) -> String {
        let query = SearchQuery::new(query);
        if query.is_blank() {
            return NOTHING_TO_SEARCH_MESSAGE.to_string();
        }
        self.run(&query, cancel).await.to_text()
    }

    /// Runs one search and returns the typed outcome.
    pub async fn run(&self, query: &SearchQuery, cancel: &CancellationToken) -> SearchOutcome {
        let configured = self.settings.get(SEARCH_PROVIDER_KEY);
        let provider = self.registry.resolve(configured.as_deref());
        let id = provider.id();
        debug!(provider = %id, "Dispatching search");

        let ctx = SearchContext {
            client: &self.client,
            secrets: self.secrets.as_ref(),
            narrator: self.narrator.as_ref(),
            actor: &self.actor,
            tokens: self.tokens.as_ref(),
            cancel,
            timeout: self.timeout,
        };

        // An unconfigured provider only narrates why it can't search.
        if ProviderCredential::resolve(id, ctx.secrets).is_present() {
            ctx.narrate(&format!(
                "Using {} to search for \"{}\"",
                id.display_name(),
                query.truncated(NARRATED_QUERY_CHARS)
            ));
        }

        let outcome = match AssertUnwindSafe(provider.execute(query, &ctx))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(provider = %id, "Search provider panicked: {}", message);
                SearchOutcome::ProviderError {
                    provider: id,
                    message,
                }
            }
        };

        ctx.narrate(&describe_outcome(id, &outcome));
        outcome
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "search provider failed unexpectedly".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MapSource;
    use crate::{ProviderId, RecordingNarrator, SearchError, SearchProvider, SearchResultRecord};
    use async_trait::async_trait;

    struct FixedTokens(usize);

    impl TokenCounter for FixedTokens {
        fn count_tokens(&self, _text: &str) -> usize {
            self.0
        }
    }

    enum Behavior {
        Records(Vec<SearchResultRecord>),
        Fail,
        Panic,
        Hang,
    }

    struct MockProvider {
        id: ProviderId,
        behavior: Behavior,
    }

    impl MockProvider {
        fn new(id: ProviderId, behavior: Behavior) -> Self {
            Self { id, behavior }
        }
    }

    #[async_trait]
    impl SearchProvider for MockProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn fetch(
            &self,
            _query: &SearchQuery,
            _credential: &ProviderCredential,
            _ctx: &SearchContext<'_>,
        ) -> Result<Vec<SearchResultRecord>> {
            match &self.behavior {
                Behavior::Records(records) => Ok(records.clone()),
                Behavior::Fail => Err(SearchError::Other("Engine failed".to_string())),
                Behavior::Panic => panic!("adapter bug"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn tool(provider: MockProvider, narrator: Arc<RecordingNarrator>) -> WebSearch {
        let id = provider.id();
        WebSearch::new(Arc::new(FixedTokens(1234)))
            .unwrap()
            .with_settings(Arc::new(MapSource::new().with(SEARCH_PROVIDER_KEY, id.as_str())))
            .with_secrets(Arc::new(MapSource::new().with("AGENT_TAVILY_API_KEY", "tvly-test-key")))
            .with_registry(ProviderRegistry::new().with_provider(provider))
            .with_narrator(narrator)
    }

    fn two_records() -> Vec<SearchResultRecord> {
        vec![
            SearchResultRecord::new("First", "https://one.example", "one"),
            SearchResultRecord::new("Second", "https://two.example", "two"),
        ]
    }

    #[tokio::test]
    async fn test_search_returns_serialized_records() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Records(two_records())),
            narrator.clone(),
        );

        let text = search.search("world series").await;
        assert!(text.contains("First"));
        assert!(text.contains("Second"));

        let messages = narrator.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            "@agent: Using Tavily to search for \"world series\""
        );
        assert!(messages[1].contains("2 results"));
        assert!(messages[1].contains("~1,234 tokens"));
    }

    #[tokio::test]
    async fn test_search_blank_query_does_not_dispatch() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Panic),
            narrator.clone(),
        );
        assert_eq!(search.search("   ").await, NOTHING_TO_SEARCH_MESSAGE);
        assert!(narrator.messages().is_empty());
    }

    #[tokio::test]
    async fn test_search_converts_errors_to_text() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Fail),
            narrator.clone(),
        );
        let text = search.search("rust").await;
        assert_eq!(text, "There was an error searching for content. Engine failed");
        assert!(narrator.messages()[1].contains("Tavily search failed: Engine failed"));
    }

    #[tokio::test]
    async fn test_search_contains_panics() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Panic),
            narrator,
        );
        let outcome = search
            .run(&SearchQuery::new("rust"), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            SearchOutcome::ProviderError {
                provider: ProviderId::TavilySearch,
                message: "adapter bug".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_search_empty_outcome() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Records(Vec::new())),
            narrator,
        );
        let outcome = search
            .run(&SearchQuery::new("rust"), &CancellationToken::new())
            .await;
        assert_eq!(outcome, SearchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_search_disabled_without_credentials() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::SerperDotDev, Behavior::Panic),
            narrator.clone(),
        );
        let text = search.search("test").await;
        assert!(text.to_lowercase().contains("disabled"));

        let messages = narrator.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("I can't use Serper.dev searching"));
        assert!(messages[0].contains("AGENT_SERPER_DEV_KEY"));
        assert!(!messages[0].contains("Using Serper.dev"));
    }

    #[tokio::test]
    async fn test_search_times_out() {
        let narrator = Arc::new(RecordingNarrator::new());
        let mut search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Hang),
            narrator,
        );
        search.set_timeout(Duration::from_millis(20));
        let outcome = search
            .run(&SearchQuery::new("rust"), &CancellationToken::new())
            .await;
        match outcome {
            SearchOutcome::ProviderError { message, .. } => assert!(message.contains("timed out")),
            other => panic!("Expected ProviderError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_cancelled() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Hang),
            narrator,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = search.run(&SearchQuery::new("rust"), &cancel).await;
        assert_eq!(
            outcome,
            SearchOutcome::ProviderError {
                provider: ProviderId::TavilySearch,
                message: "Search was cancelled".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_long_query_truncated_in_narration() {
        let narrator = Arc::new(RecordingNarrator::new());
        let search = tool(
            MockProvider::new(ProviderId::TavilySearch, Behavior::Records(two_records())),
            narrator.clone(),
        );
        let long = "q".repeat(250);
        search.search(&long).await;
        let first = &narrator.messages()[0];
        assert!(first.contains(&format!("\"{}...\"", "q".repeat(100))));
        assert!(!first.contains(&"q".repeat(101)));
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "search provider failed unexpectedly");
    }
}
