//! # Data Models
//!
//! Plain data shared by the pipeline stages: discovered sources, the final
//! research result, and the depth tiers with their search budgets.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SOURCE
// =============================================================================
/// One discovered unit of evidence.
///
/// The `url` is the identity key: two sources with the same non-empty url are
/// the same source, and sources with an empty url are never kept after
/// deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    /// May be empty.
    pub snippet: String,
}

impl Source {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

// =============================================================================
// RESEARCH RESULT
// =============================================================================
/// Everything one research run produced. Built once, then only read.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    pub query: String,
    pub sources_found: usize,
    /// Markdown-structured report text.
    pub report: String,
    /// Deduplicated sources in first-seen order.
    pub sources: Vec<Source>,
}

impl ResearchResult {
    pub fn new(query: impl Into<String>, report: String, sources: Vec<Source>) -> Self {
        Self {
            query: query.into(),
            sources_found: sources.len(),
            report,
            sources,
        }
    }
}

// =============================================================================
// DEPTH
// =============================================================================
/// Caller-selected budget tier.
///
/// Unrecognized names are kept as `Other` rather than rejected; they run
/// with the standard budget but without query expansion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Depth {
    Basic,
    #[default]
    Standard,
    Deep,
    Other(String),
}

/// How many rounds to run and how many sources to request per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub rounds: usize,
    pub sources_per_round: usize,
}

impl Depth {
    pub fn budget(&self) -> SearchBudget {
        let (rounds, sources_per_round) = match self {
            Depth::Basic => (1, 3),
            Depth::Standard => (2, 5),
            Depth::Deep => (3, 7),
            Depth::Other(_) => (2, 5),
        };
        SearchBudget {
            rounds,
            sources_per_round,
        }
    }

    /// Only the standard and deep tiers pay for an expansion call.
    pub fn expands_queries(&self) -> bool {
        matches!(self, Depth::Standard | Depth::Deep)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Depth::Basic => "basic",
            Depth::Standard => "standard",
            Depth::Deep => "deep",
            Depth::Other(name) => name,
        }
    }
}

/// # Rust Concept: Infallible Parsing
///
/// `FromStr` with `Err = Infallible` lets clap and callers use `.parse()`
/// while guaranteeing that every string maps to some depth.
impl FromStr for Depth {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "basic" => Depth::Basic,
            "standard" => Depth::Standard,
            "deep" => Depth::Deep,
            other => Depth::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Depth {
        s.parse().unwrap()
    }

    #[test]
    fn test_budget_table() {
        let cases = [
            ("basic", 1, 3),
            ("standard", 2, 5),
            ("deep", 3, 7),
            ("exhaustive", 2, 5),
            ("", 2, 5),
        ];
        for (name, rounds, per_round) in cases {
            let budget = parse(name).budget();
            assert_eq!(budget.rounds, rounds, "rounds for {name:?}");
            assert_eq!(budget.sources_per_round, per_round, "cap for {name:?}");
        }
    }

    #[test]
    fn test_depth_parsing_is_case_sensitive() {
        assert_eq!(parse("deep"), Depth::Deep);
        assert_eq!(parse("Deep"), Depth::Other("Deep".to_string()));
    }

    #[test]
    fn test_expansion_tiers() {
        assert!(!Depth::Basic.expands_queries());
        assert!(Depth::Standard.expands_queries());
        assert!(Depth::Deep.expands_queries());
        assert!(!Depth::Other("wide".into()).expands_queries());
    }

    #[test]
    fn test_result_counts_sources() {
        let sources = vec![
            Source::new("A", "https://a.example", "a"),
            Source::new("B", "https://b.example", ""),
        ];
        let result = ResearchResult::new("q", "# Report".to_string(), sources);
        assert_eq!(result.sources_found, 2);
        assert_eq!(result.query, "q");
    }
}
