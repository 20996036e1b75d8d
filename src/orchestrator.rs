//! # Orchestrator Module
//!
//! Drives one research run from query to report:
//!
//! ```text
//! query ─► expand ─► search round × N ─► dedup by url ─► synthesize ─► result
//! ```
//!
//! Everything runs strictly in sequence. No stage failure aborts the run;
//! the worst case is an empty source set handed to synthesis, which has
//! its own fallback.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ResearchConfig;
use crate::expander::QueryExpander;
use crate::llm::{CompletionService, RigCompletion};
use crate::models::{Depth, ResearchResult, Source};
use crate::search::{DuckDuckGoSearch, SourceSearch};
use crate::synthesis::Synthesizer;

// =============================================================================
// RESEARCH ORCHESTRATOR
// =============================================================================
/// Owns the pipeline components for research runs.
///
/// Each call to [`conduct_research`](Self::conduct_research) keeps its own
/// accumulator, so nothing mutable is shared between runs.
pub struct ResearchOrchestrator {
    config: ResearchConfig,
    search: Arc<dyn SourceSearch>,
    expander: QueryExpander,
    synthesizer: Synthesizer,
}

impl ResearchOrchestrator {
    /// Wire the pipeline from explicit parts.
    pub fn new(
        config: ResearchConfig,
        search: Arc<dyn SourceSearch>,
        llm: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            config,
            search,
            expander: QueryExpander::new(llm.clone()),
            synthesizer: Synthesizer::new(llm),
        }
    }

    /// Validate `config` and build the production search and completion
    /// clients from it. An invalid configuration is the only error here.
    pub fn from_config(config: ResearchConfig) -> Result<Self> {
        config.validate()?;

        let search = DuckDuckGoSearch::new(&config).context("Failed to build search client")?;
        let llm = RigCompletion::new(&config).context("Failed to build completion client")?;

        debug!(
            provider = %config.provider,
            model = %config.model,
            endpoint = %config.search_endpoint,
            "Research pipeline configured"
        );

        Ok(Self::new(config, Arc::new(search), Arc::new(llm)))
    }

    /// Run the full multi-round pipeline for `query`.
    pub async fn conduct_research(&self, query: &str, depth: &Depth) -> ResearchResult {
        info!(query = %query, depth = %depth, "Starting research");
        let budget = depth.budget();

        let mut queries = vec![query.to_string()];
        queries.extend(self.expander.expand(query, depth).await);
        queries.truncate(budget.rounds);

        let mut collected = Vec::new();
        let last_round = queries.len();
        for (round, search_query) in queries.iter().enumerate() {
            info!(round = round + 1, query = %search_query, "Search round");
            let sources = self.search.search(search_query, budget.sources_per_round).await;
            collected.extend(sources);

            // The pause only separates rounds; after the last one it would
            // delay nothing.
            if round + 1 < last_round && !self.config.search_delay.is_zero() {
                tokio::time::sleep(self.config.search_delay).await;
            }
        }

        let sources = dedup_by_url(collected);
        debug!(unique = sources.len(), "Deduplicated sources");

        let report = self.synthesizer.synthesize(query, &sources).await;

        let result = ResearchResult::new(query, report, sources);
        info!(sources_found = result.sources_found, "Research completed");
        result
    }

    /// One search round without expansion or synthesis.
    pub async fn quick_search(&self, query: &str, depth: &Depth) -> Vec<Source> {
        info!(query = %query, "Performing quick search");
        let sources = self
            .search
            .search(query, depth.budget().sources_per_round)
            .await;
        dedup_by_url(sources)
    }
}

// =============================================================================
// DEDUPLICATION
// =============================================================================
/// Collapse sources sharing a url.
///
/// Sources with an empty url are dropped. Each url keeps the position of its
/// first appearance but the fields of its last appearance.
pub fn dedup_by_url(sources: Vec<Source>) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for source in sources {
        if source.url.is_empty() {
            continue;
        }
        match position.get(&source.url) {
            Some(&idx) => unique[idx] = source,
            None => {
                position.insert(source.url.clone(), unique.len());
                unique.push(source);
            }
        }
    }

    unique
}
