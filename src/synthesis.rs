//! # Synthesis Module
//!
//! Turns the aggregated sources into a report with two sequential
//! completion calls:
//!
//! 1. **Analysis**: themes and insights as JSON, from the concatenated
//!    snippets.
//! 2. **Composition**: a sectioned report from the query, the leading
//!    sources and the analysis.
//!
//! Each stage has a fixed fallback, so synthesis always yields text.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Outcome, ResearchError};
use crate::llm::CompletionService;
use crate::models::Source;

/// Cap on the concatenated snippet text sent to the analysis stage, in
/// characters.
pub const ANALYSIS_CONTENT_LIMIT: usize = 4000;

/// How many sources the composition prompt lists.
pub const REPORT_SOURCE_LIMIT: usize = 5;

/// Per-source snippet prefix in the composition prompt, in characters.
pub const REPORT_SNIPPET_LIMIT: usize = 200;

pub const FALLBACK_THEME: &str = "Information synthesis";
pub const FALLBACK_INSIGHT: &str = "Comprehensive analysis";

// =============================================================================
// ANALYSIS
// =============================================================================
/// Intermediate result of stage 1. Not kept in the research result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Analysis {
    pub themes: Vec<String>,
    pub insights: Vec<String>,
}

impl Analysis {
    /// The value used whenever the analysis call fails or cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            themes: vec![FALLBACK_THEME.to_string()],
            insights: vec![FALLBACK_INSIGHT.to_string()],
        }
    }

    /// Parse a completion as `{"themes": [...], "insights": [...]}`.
    ///
    /// A surrounding Markdown code fence is tolerated.
    pub fn parse(text: &str) -> Result<Self, ResearchError> {
        serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            ResearchError::MalformedResponse(format!("analysis is not the expected JSON: {}", e))
        })
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

// =============================================================================
// SYNTHESIZER
// =============================================================================
pub struct Synthesizer {
    llm: Arc<dyn CompletionService>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Run both stages and return the report text (or its fallback).
    pub async fn synthesize(&self, query: &str, sources: &[Source]) -> String {
        info!(sources = sources.len(), "Analyzing unique sources");
        let analysis = self.analyze(query, sources).await;
        if let Some(reason) = analysis.reason() {
            warn!(error = %reason, "Analysis failed, using default themes and insights");
        }

        info!("Generating comprehensive report");
        let report = self.compose(query, sources, analysis.value()).await;
        if let Some(reason) = report.reason() {
            warn!(error = %reason, "Report generation failed, using fallback report");
        }

        report.into_inner()
    }

    /// Stage 1: themes and insights.
    pub async fn analyze(&self, query: &str, sources: &[Source]) -> Outcome<Analysis> {
        let prompt = analysis_prompt(query, sources);
        let result = match self.llm.complete(&prompt).await {
            Ok(text) => Analysis::parse(&text),
            Err(e) => Err(e),
        };
        Outcome::or_fallback(result, Analysis::fallback)
    }

    /// Stage 2: the report text.
    pub async fn compose(&self, query: &str, sources: &[Source], analysis: &Analysis) -> Outcome<String> {
        let prompt = report_prompt(query, sources, analysis);
        let result = self.llm.complete(&prompt).await;
        Outcome::or_fallback(result, || fallback_report(query, sources.len()))
    }
}

// =============================================================================
// PROMPTS
// =============================================================================
/// Snippets joined with single spaces, then cut to
/// [`ANALYSIS_CONTENT_LIMIT`] characters as a whole.
pub fn analysis_content(sources: &[Source]) -> String {
    let joined = sources
        .iter()
        .map(|s| s.snippet.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    truncate_chars(&joined, ANALYSIS_CONTENT_LIMIT).to_string()
}

pub fn analysis_prompt(query: &str, sources: &[Source]) -> String {
    format!(
        "Analyze the following research content on '{}'. Provide 3-4 key themes and 3-4 main \
         insights. Format as JSON with keys: themes, insights.\n\nContent: {}",
        query,
        analysis_content(sources)
    )
}

pub fn report_prompt(query: &str, sources: &[Source], analysis: &Analysis) -> String {
    let source_lines = sources
        .iter()
        .take(REPORT_SOURCE_LIMIT)
        .map(|s| format!("- {}: {}", s.title, truncate_chars(&s.snippet, REPORT_SNIPPET_LIMIT)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create a comprehensive research report on '{}' based on the following sources and \
         analysis:\n\nSources:\n{}\n\nAnalysis:\nThemes: {:?}\nInsights: {:?}\n\n\
         Structure the report with an Executive Summary, Key Findings, Detailed Analysis, \
         and Conclusions.",
        query, source_lines, analysis.themes, analysis.insights
    )
}

/// Minimal report used when composition fails.
pub fn fallback_report(query: &str, source_count: usize) -> String {
    format!(
        "# Research Report: {}\n\n## Executive Summary\n\nNo report generated due to API error. \
         A comprehensive analysis was attempted on {} sources.",
        query, source_count
    )
}

/// Prefix of at most `max` characters, on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
