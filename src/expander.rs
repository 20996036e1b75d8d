//! # Query Expander
//!
//! Asks the completion service for related queries so that later rounds
//! search from a different angle. Expansion is optional: on any failure the
//! run continues with the original query alone.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Outcome, ResearchError};
use crate::llm::CompletionService;
use crate::models::Depth;

/// Upper bound on additional queries per run.
pub const MAX_EXPANSIONS: usize = 2;

pub struct QueryExpander {
    llm: Arc<dyn CompletionService>,
}

impl QueryExpander {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Produce 0 to 2 additional queries for `query`.
    ///
    /// Tiers that do not expand return immediately without an external call.
    pub async fn expand(&self, query: &str, depth: &Depth) -> Vec<String> {
        if !depth.expands_queries() {
            debug!(depth = %depth, "Skipping query expansion");
            return Vec::new();
        }

        let outcome = Outcome::or_fallback(self.request(query).await, Vec::new);
        if let Some(reason) = outcome.reason() {
            warn!(error = %reason, "Query expansion failed, using the original query only");
        }
        outcome.into_inner()
    }

    async fn request(&self, query: &str) -> Result<Vec<String>, ResearchError> {
        let text = self.llm.complete(&expansion_prompt(query)).await?;
        let queries = parse_expansions(&text);
        if queries.is_empty() {
            return Err(ResearchError::MalformedResponse(
                "expansion produced no queries".to_string(),
            ));
        }
        debug!(?queries, "Expanded queries");
        Ok(queries)
    }
}

pub fn expansion_prompt(query: &str) -> String {
    format!(
        "Generate {} related search queries for: {}. One line each.",
        MAX_EXPANSIONS, query
    )
}

/// Non-empty trimmed lines, at most [`MAX_EXPANSIONS`] of them.
pub fn parse_expansions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_EXPANSIONS)
        .map(str::to_string)
        .collect()
}
