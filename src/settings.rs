//! Configuration lookup and credential gating.
//!
//! Nothing here is cached: every search re-reads its sources so that a
//! changed provider or newly added key takes effect on the next call.

use std::collections::HashMap;

use crate::ProviderId;

/// Settings key naming the active search provider.
pub const SEARCH_PROVIDER_KEY: &str = "agent_search_provider";

/// Read-only key/value configuration.
pub trait ConfigSource: Send + Sync {
    /// Returns the raw value for `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Returns the value for `key`, treating blank values as absent.
    fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).filter(|v| !v.trim().is_empty())
    }
}

/// Reads the process environment. Keys are upper-cased before lookup, so
/// `agent_search_provider` reads `AGENT_SEARCH_PROVIDER`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key.to_ascii_uppercase()).ok()
    }
}

/// In-memory configuration.
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Layers two sources: `primary` wins, `fallback` fills the gaps.
pub struct Layered<A, B> {
    primary: A,
    fallback: B,
}

impl<A: ConfigSource, B: ConfigSource> Layered<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: ConfigSource, B: ConfigSource> ConfigSource for Layered<A, B> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.primary.get(key).or_else(|| self.fallback.lookup(key))
    }
}

/// Snapshot of one provider's required credentials, taken for a single call.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    provider: ProviderId,
    values: HashMap<&'static str, String>,
    missing: Vec<&'static str>,
}

impl ProviderCredential {
    /// Reads every required key of `provider` from `source`.
    pub fn resolve(provider: ProviderId, source: &dyn ConfigSource) -> Self {
        let mut values = HashMap::new();
        let mut missing = Vec::new();
        for &key in provider.required_keys() {
            match source.get(key) {
                Some(value) => {
                    values.insert(key, value);
                }
                None => missing.push(key),
            }
        }
        Self {
            provider,
            values,
            missing,
        }
    }

    /// The provider this snapshot belongs to.
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// The keys the provider needs.
    pub fn required_keys(&self) -> &'static [&'static str] {
        self.provider.required_keys()
    }

    /// True when every required key has a value.
    pub fn is_present(&self) -> bool {
        self.missing.is_empty()
    }

    /// Required keys without a value.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    /// Returns the value of a required key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but an error naming the key when absent.
    pub fn require(&self, key: &str) -> crate::Result<&str> {
        self.get(key).ok_or_else(|| {
            crate::SearchError::InvalidConfig(format!("{} is not set", key))
        })
    }
}

/// Masks the middle of a secret for diagnostics.
///
/// Keeps `keep` characters at each end. Values too short to keep both ends
/// without revealing most of the secret are replaced entirely.
pub fn middle_truncate(secret: &str, keep: usize) -> String {
    let len = secret.chars().count();
    if len <= keep * 2 {
        return "***".to_string();
    }
    let head: String = secret.chars().take(keep).collect();
    let tail: String = secret.chars().skip(len - keep).collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_blank_is_absent() {
        let source = MapSource::new().with("A", "value").with("B", "   ");
        assert_eq!(source.get("A").as_deref(), Some("value"));
        assert!(source.get("B").is_none());
        assert!(source.get("C").is_none());
    }

    #[test]
    fn test_env_source_upper_cases_keys() {
        std::env::set_var("AGENT_WEBSEARCH_TEST_ENV_KEY", "from-env");
        assert_eq!(
            EnvSource.get("agent_websearch_test_env_key").as_deref(),
            Some("from-env")
        );
        std::env::remove_var("AGENT_WEBSEARCH_TEST_ENV_KEY");
    }

    #[test]
    fn test_layered_prefers_primary() {
        let layered = Layered::new(
            MapSource::new().with("k", "primary"),
            MapSource::new().with("k", "fallback").with("other", "x"),
        );
        assert_eq!(layered.get("k").as_deref(), Some("primary"));
        assert_eq!(layered.get("other").as_deref(), Some("x"));
    }

    #[test]
    fn test_credential_missing_keys() {
        let source = MapSource::new().with("AGENT_GSE_KEY", "abc");
        let cred = ProviderCredential::resolve(ProviderId::GoogleSearchEngine, &source);
        assert!(!cred.is_present());
        assert_eq!(cred.missing(), &["AGENT_GSE_CTX"]);
        assert_eq!(cred.get("AGENT_GSE_KEY"), Some("abc"));
        assert!(cred.require("AGENT_GSE_CTX").is_err());
    }

    #[test]
    fn test_credential_present() {
        let source = MapSource::new().with("AGENT_TAVILY_API_KEY", "tvly-123");
        let cred = ProviderCredential::resolve(ProviderId::TavilySearch, &source);
        assert!(cred.is_present());
        assert_eq!(cred.required_keys(), &["AGENT_TAVILY_API_KEY"]);
        assert_eq!(cred.provider(), ProviderId::TavilySearch);
    }

    #[test]
    fn test_credential_none_required() {
        let cred = ProviderCredential::resolve(ProviderId::DuckDuckGoEngine, &MapSource::new());
        assert!(cred.is_present());
    }

    #[test]
    fn test_middle_truncate() {
        assert_eq!(middle_truncate("sk-1234567890abcdef", 5), "sk-12...bcdef");
        assert_eq!(middle_truncate("short", 5), "***");
        assert_eq!(middle_truncate("exactly10c", 5), "***");
        assert_eq!(middle_truncate("", 5), "***");
    }

    #[test]
    fn test_middle_truncate_never_contains_middle() {
        let secret = "AAAAA-the-secret-middle-ZZZZZ";
        let masked = middle_truncate(secret, 5);
        assert!(!masked.contains("secret"));
        assert!(masked.starts_with("AAAAA"));
        assert!(masked.ends_with("ZZZZZ"));
    }
}
