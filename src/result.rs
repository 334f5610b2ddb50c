//! Search result types and normalization.

use serde::{Deserialize, Serialize};

use crate::{ProviderId, Result, SearchError, TokenCounter};

/// Sentence returned when a provider produced nothing usable.
pub const NO_RESULTS_MESSAGE: &str = "No information was found online for the search query.";

/// Sentence returned when the selected provider is not configured.
pub const DISABLED_MESSAGE: &str = "Search is disabled and no content was found. This functionality is disabled because the user has not set it up yet.";

/// A single normalized search result.
///
/// `snippet` and `published_date` are left out of the serialized form when
/// the provider did not supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRecord {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Result description/snippet.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    /// Published date, as the provider formatted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

impl SearchResultRecord {
    /// Creates a new record.
    pub fn new(title: impl Into<String>, link: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            published_date: None,
        }
    }

    /// Builds a record from optional provider fields.
    ///
    /// Returns `None` unless both a title and a link are present.
    pub fn from_parts(
        title: Option<String>,
        link: Option<String>,
        snippet: Option<String>,
    ) -> Option<Self> {
        let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let link = link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
        Some(Self::new(title, link, snippet.unwrap_or_default().trim()))
    }

    /// Sets the published date.
    pub fn with_published_date(mut self, date: Option<String>) -> Self {
        self.published_date = date.filter(|d| !d.is_empty());
        self
    }
}

/// Serializes an ordered record sequence into the prompt payload.
pub fn serialize_records(records: &[SearchResultRecord]) -> Result<String> {
    serde_json::to_string(records).map_err(|e| SearchError::Other(e.to_string()))
}

/// Parses a payload produced by [`serialize_records`].
pub fn parse_records(serialized: &str) -> Result<Vec<SearchResultRecord>> {
    serde_json::from_str(serialized).map_err(|e| SearchError::Parse(e.to_string()))
}

/// Terminal state of one search invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one record was found.
    Ok {
        records: Vec<SearchResultRecord>,
        serialized: String,
        approx_tokens: usize,
    },
    /// The provider is not configured; no request was sent.
    Disabled { reason: String },
    /// The provider call failed.
    ProviderError { provider: ProviderId, message: String },
    /// The provider answered but nothing matched.
    Empty,
}

impl SearchOutcome {
    /// Normalizes extracted records into `Ok`, or `Empty` when there are none.
    pub fn from_records(records: Vec<SearchResultRecord>, tokens: &dyn TokenCounter) -> Result<Self> {
        if records.is_empty() {
            return Ok(Self::Empty);
        }
        let serialized = serialize_records(&records)?;
        let approx_tokens = tokens.count_tokens(&serialized);
        Ok(Self::Ok {
            records,
            serialized,
            approx_tokens,
        })
    }

    /// Returns true for the `Ok` variant.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Returns the records, empty for every non-`Ok` variant.
    pub fn records(&self) -> &[SearchResultRecord] {
        match self {
            Self::Ok { records, .. } => records,
            _ => &[],
        }
    }

    /// Returns the functional payload handed back to the agent.
    pub fn to_text(&self) -> String {
        match self {
            Self::Ok { serialized, .. } => serialized.clone(),
            Self::Disabled { reason } => format!("{} {}", DISABLED_MESSAGE, reason),
            Self::ProviderError { message, .. } => {
                format!("There was an error searching for content. {}", message)
            }
            Self::Empty => NO_RESULTS_MESSAGE.to_string(),
        }
    }
}
