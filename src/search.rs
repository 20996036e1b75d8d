//! # Search Module
//!
//! The source fetcher: one query against the search provider, normalized
//! into [`Source`] records. Search failures are routine, so the public
//! contract never fails; a broken round simply contributes no sources.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ResearchConfig;
use crate::error::ResearchError;
use crate::models::Source;

// =============================================================================
// SEARCH SEAM
// =============================================================================
/// Anything that can turn a query into sources.
///
/// # Rust Concept: async-trait
///
/// `async fn` in a trait used as `dyn SourceSearch` needs the
/// `#[async_trait]` macro, which boxes the returned future.
#[async_trait]
pub trait SourceSearch: Send + Sync {
    /// Return at most `limit` sources for `query`. Never fails: any upstream
    /// problem yields an empty list.
    async fn search(&self, query: &str, limit: usize) -> Vec<Source>;
}

// =============================================================================
// DUCKDUCKGO SEARCH
// =============================================================================
/// Source fetcher backed by the DuckDuckGo Instant Answer API.
///
/// One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

impl DuckDuckGoSearch {
    pub fn new(config: &ResearchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.search_timeout)
            .user_agent(concat!("deep-research/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.search_endpoint.clone(),
            timeout_secs: config.search_timeout.as_secs(),
        })
    }

    fn request_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&format=json&no_redirect=1",
            self.endpoint,
            urlencoding::encode(query)
        )
    }

    /// The fallible half of [`SourceSearch::search`].
    pub async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<Source>, ResearchError> {
        let url = self.request_url(query);
        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResearchError::Timeout {
                    what: "search request",
                    secs: self.timeout_secs,
                }
            } else {
                ResearchError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResearchError::UpstreamUnavailable(format!("HTTP {}", status)));
        }

        // The provider does not always label its JSON as such, so decode the
        // body ourselves instead of trusting the content type.
        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ResearchError::MalformedResponse(format!("search body is not JSON: {}", e)))?;

        Ok(parse_related_topics(&data, limit))
    }
}

#[async_trait]
impl SourceSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Vec<Source> {
        info!(query = %query, limit, "Performing web search");

        match self.try_search(query, limit).await {
            Ok(sources) => {
                if sources.is_empty() {
                    warn!(query = %query, "No search results found");
                } else {
                    info!(query = %query, count = sources.len(), "Search completed");
                }
                sources
            }
            Err(e) => {
                warn!(
                    query = %query,
                    error = %e,
                    upstream = e.is_upstream(),
                    "Search failed, round contributes no sources"
                );
                Vec::new()
            }
        }
    }
}

/// Normalize a provider response into sources.
///
/// The first `limit` related-topic entries are considered; those that are
/// not objects or carry no string `Text` are skipped, so fewer than `limit`
/// sources may come back. A missing `FirstURL` becomes an empty url.
pub fn parse_related_topics(data: &Value, limit: usize) -> Vec<Source> {
    let Some(topics) = data.get("RelatedTopics").and_then(Value::as_array) else {
        return Vec::new();
    };

    topics
        .iter()
        .take(limit)
        .filter_map(|topic| {
            let text = topic.get("Text")?.as_str()?;
            let url = topic
                .get("FirstURL")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(Source::new(text, url, text))
        })
        .collect()
}

/// Render sources as a numbered Markdown list.
pub fn format_sources(query: &str, sources: &[Source]) -> String {
    if sources.is_empty() {
        return format!("No results found for: {}", query);
    }

    let formatted: String = sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. **{}**\n   URL: {}\n   {}\n", i + 1, s.title, s.url, s.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!("## Search Results for: {}\n\n{}", query, formatted)
}
