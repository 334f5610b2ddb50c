//! Search query representation.

use serde::{Deserialize, Serialize};

/// Device class to request results for, where the provider supports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceHint {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceHint {
    /// Returns the wire name of the device class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

/// A single search request.
///
/// Built once per invocation. Providers read the optional hints they
/// understand and ignore the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms.
    pub text: String,
    /// Maximum number of results to ask the provider for.
    pub result_limit: Option<u32>,
    /// Language code (e.g., "en").
    pub language: Option<String>,
    /// Region/country code (e.g., "us").
    pub region: Option<String>,
    /// Device class.
    pub device: Option<DeviceHint>,
}

impl SearchQuery {
    /// Creates a new search query with the given terms.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            result_limit: None,
            language: None,
            region: None,
            device: None,
        }
    }

    /// Sets the maximum number of results.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.result_limit = Some(limit);
        self
    }

    /// Sets the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the device class.
    pub fn with_device(mut self, device: DeviceHint) -> Self {
        self.device = Some(device);
        self
    }

    /// Returns true when there is nothing to search for.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns the query text cut to `max` characters, with an ellipsis
    /// when anything was dropped.
    pub fn truncated(&self, max: usize) -> String {
        if self.text.chars().count() <= max {
            return self.text.clone();
        }
        let head: String = self.text.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_new() {
        let query = SearchQuery::new("test query");
        assert_eq!(query.text, "test query");
        assert!(query.result_limit.is_none());
        assert!(query.language.is_none());
        assert!(query.region.is_none());
        assert!(query.device.is_none());
    }

    #[test]
    fn test_search_query_builder_chain() {
        let query = SearchQuery::new("rust programming")
            .with_limit(20)
            .with_language("de")
            .with_region("at")
            .with_device(DeviceHint::Mobile);

        assert_eq!(query.result_limit, Some(20));
        assert_eq!(query.language.as_deref(), Some("de"));
        assert_eq!(query.region.as_deref(), Some("at"));
        assert_eq!(query.device, Some(DeviceHint::Mobile));
    }

    #[test]
    fn test_is_blank() {
        assert!(SearchQuery::new("").is_blank());
        assert!(SearchQuery::new(" \t\n").is_blank());
        assert!(!SearchQuery::new("a").is_blank());
    }

    #[test]
    fn test_truncated_short_query_untouched() {
        let query = SearchQuery::new("world series");
        assert_eq!(query.truncated(100), "world series");
    }

    #[test]
    fn test_truncated_long_query() {
        let query = SearchQuery::new("x".repeat(150));
        let cut = query.truncated(100);
        assert_eq!(cut.len(), 103);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        let query = SearchQuery::new("日本語のクエリ");
        assert_eq!(query.truncated(3), "日本語...");
    }

    #[test]
    fn test_device_hint_serialization() {
        let json = serde_json::to_string(&DeviceHint::Mobile).unwrap();
        assert_eq!(json, "\"mobile\"");
        assert_eq!(DeviceHint::default().as_str(), "desktop");
    }
}
