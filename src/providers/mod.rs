//! Search provider adapters.

// Contract-backed JSON APIs
mod bing;
mod google;
mod searchapi;
mod searxng;
mod serper;
mod serply;
mod tavily;

// HTML scraping
#[cfg(feature = "duckduckgo")]
mod duckduckgo;

pub use bing::BingSearch;
pub use google::GoogleSearchEngine;
pub use searchapi::SearchApi;
pub use searxng::SearXngEngine;
pub use serper::SerperDotDev;
pub use serply::SerplyEngine;
pub use tavily::TavilySearch;

#[cfg(feature = "duckduckgo")]
pub use duckduckgo::DuckDuckGoEngine;
