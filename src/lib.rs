//! # agent-websearch
//!
//! Web search tool for LLM agents.
//!
//! Each call goes to exactly one configured provider. Provider responses
//! are normalized into a common record shape and serialized into a single
//! string for the agent's context; failures come back as a diagnostic
//! sentence rather than an error. Progress is reported through a separate
//! narration channel.
//!
//! Supported providers:
//!
//! - Google Programmable Search (default)
//! - SearchApi
//! - Serper.dev
//! - Bing Web Search
//! - Serply
//! - SearXNG
//! - Tavily
//! - DuckDuckGo (HTML scraping, `duckduckgo` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_websearch::{TiktokenCounter, WebSearch};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = WebSearch::new(Arc::new(TiktokenCounter::cl100k()?))?;
//!
//!     // Provider from AGENT_SEARCH_PROVIDER, credentials from the environment.
//!     let text = search.search("rust programming").await;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

mod error;
mod narration;
mod provider;
mod query;
mod registry;
mod result;
mod search;
mod tokens;

pub mod providers;
pub mod settings;
pub mod tool;

pub use error::{ErrorKind, Result, SearchError};
pub use narration::{Narrator, RecordingNarrator, TracingNarrator};
pub use provider::{ProviderId, SearchContext, SearchProvider};
pub use query::{DeviceHint, SearchQuery};
pub use registry::ProviderRegistry;
pub use result::{
    parse_records, serialize_records, SearchOutcome, SearchResultRecord, DISABLED_MESSAGE,
    NO_RESULTS_MESSAGE,
};
pub use search::{WebSearch, NOTHING_TO_SEARCH_MESSAGE};
pub use tokens::{format_thousands, TiktokenCounter, TokenCounter};
