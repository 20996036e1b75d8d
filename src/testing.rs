//! In-process fakes for the search and completion seams.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::ResearchError;
use crate::llm::CompletionService;
use crate::models::Source;
use crate::search::SourceSearch;

/// Replays scripted completions in order and records every prompt.
/// Once the script runs out, every call fails as unavailable.
#[derive(Default)]
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, ResearchError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, ResearchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A service whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

pub fn ok(text: &str) -> Result<String, ResearchError> {
    Ok(text.to_string())
}

pub fn unavailable() -> Result<String, ResearchError> {
    Err(ResearchError::UpstreamUnavailable("connection refused".to_string()))
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ResearchError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unavailable)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Serves canned sources per query and records `(query, limit)` calls.
/// Unknown queries return nothing, like a failed round.
#[derive(Default)]
pub struct CannedSearch {
    results: HashMap<String, Vec<Source>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl CannedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, sources: Vec<Source>) -> Self {
        self.results.insert(query.to_string(), sources);
        self
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceSearch for CannedSearch {
    async fn search(&self, query: &str, limit: usize) -> Vec<Source> {
        self.calls.lock().unwrap().push((query.to_string(), limit));
        self.results
            .get(query)
            .map(|sources| sources.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

pub fn source(title: &str, url: &str) -> Source {
    Source::new(title, url, format!("{} snippet", title))
}
