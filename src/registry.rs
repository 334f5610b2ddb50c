//! Provider registry: maps a configured identifier to its adapter.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::providers::{
    BingSearch, GoogleSearchEngine, SearXngEngine, SearchApi, SerperDotDev, SerplyEngine,
    TavilySearch,
};
use crate::{ProviderId, SearchProvider};

/// Typed dispatch table from [`ProviderId`] to adapter.
///
/// Resolution is permissive: an absent, unknown or unavailable identifier
/// resolves to the [`ProviderId::DEFAULT`] adapter instead of failing.
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn SearchProvider>>,
}

impl ProviderRegistry {
    /// Creates a registry holding every provider compiled into this build,
    /// each pointed at its public endpoint.
    pub fn new() -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
        };
        for id in ProviderId::ALL {
            if let Some(provider) = builtin(id) {
                registry.providers.insert(id, provider);
            }
        }
        registry
    }

    /// Replaces the adapter registered under the provider's own id.
    pub fn with_provider<P: SearchProvider + 'static>(mut self, provider: P) -> Self {
        self.register(Arc::new(provider));
        self
    }

    /// Replaces the adapter registered under the provider's own id.
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    /// Returns the adapter for a known, available id.
    pub fn get(&self, id: ProviderId) -> Option<&Arc<dyn SearchProvider>> {
        self.providers.get(&id)
    }

    /// Ids with a registered adapter, in listing order.
    pub fn available(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    /// Resolves a configured identifier to an adapter, falling back to the
    /// default provider.
    pub fn resolve(&self, configured: Option<&str>) -> Arc<dyn SearchProvider> {
        let requested = configured.and_then(|raw| match raw.parse::<ProviderId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(provider = raw, "Unknown search provider, using default");
                None
            }
        });

        if let Some(provider) = requested.and_then(|id| self.providers.get(&id)) {
            debug!(provider = %provider.id(), "Resolved search provider");
            return Arc::clone(provider);
        }
        if let Some(id) = requested {
            warn!(provider = %id, "Search provider not available in this build, using default");
        }

        match self.providers.get(&ProviderId::DEFAULT) {
            Some(provider) => Arc::clone(provider),
            None => Arc::new(GoogleSearchEngine::new()),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin(id: ProviderId) -> Option<Arc<dyn SearchProvider>> {
    let provider: Arc<dyn SearchProvider> = match id {
        ProviderId::GoogleSearchEngine => Arc::new(GoogleSearchEngine::new()),
        ProviderId::SearchApi => Arc::new(SearchApi::new()),
        ProviderId::SerperDotDev => Arc::new(SerperDotDev::new()),
        ProviderId::BingSearch => Arc::new(BingSearch::new()),
        ProviderId::SerplyEngine => Arc::new(SerplyEngine::new()),
        ProviderId::SearXngEngine => Arc::new(SearXngEngine::new()),
        ProviderId::TavilySearch => Arc::new(TavilySearch::new()),
        #[cfg(feature = "duckduckgo")]
        ProviderId::DuckDuckGoEngine => Arc::new(crate::providers::DuckDuckGoEngine::new()),
        #[cfg(not(feature = "duckduckgo"))]
        ProviderId::DuckDuckGoEngine => return None,
    };
    Some(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new_has_every_builtin() {
        let registry = ProviderRegistry::new();
        for id in ProviderId::ALL {
            if cfg!(not(feature = "duckduckgo")) && id == ProviderId::DuckDuckGoEngine {
                assert!(registry.get(id).is_none());
                continue;
            }
            assert_eq!(registry.get(id).map(|p| p.id()), Some(id));
        }
    }

    #[test]
    fn test_resolve_known_ids() {
        let registry = ProviderRegistry::new();
        assert_eq!(
            registry.resolve(Some("serper-dot-dev")).id(),
            ProviderId::SerperDotDev
        );
        assert_eq!(
            registry.resolve(Some("tavily-search")).id(),
            ProviderId::TavilySearch
        );
    }

    #[test]
    fn test_resolve_absent_uses_default() {
        let registry = ProviderRegistry::new();
        assert_eq!(registry.resolve(None).id(), ProviderId::DEFAULT);
    }

    #[test]
    fn test_resolve_unknown_uses_default() {
        let registry = ProviderRegistry::new();
        assert_eq!(
            registry.resolve(Some("made-up-provider")).id(),
            ProviderId::GoogleSearchEngine
        );
        assert_eq!(registry.resolve(Some("")).id(), ProviderId::DEFAULT);
    }

    #[test]
    fn test_with_provider_replaces_entry() {
        let registry = ProviderRegistry::new()
            .with_provider(BingSearch::new().with_endpoint("http://127.0.0.1:1/bing"));
        assert_eq!(registry.available().len(), ProviderRegistry::new().available().len());
        assert_eq!(
            registry.resolve(Some("bing-search")).id(),
            ProviderId::BingSearch
        );
    }

    #[test]
    fn test_available_in_listing_order() {
        let available = ProviderRegistry::new().available();
        assert_eq!(available.first(), Some(&ProviderId::GoogleSearchEngine));
    }
}
