//! Collaborator boundaries. Production impls live next to their concern
//! (`search`, `extractor`, `scrape::apify`, `feed`); mocks live in `testing`.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extractor::DiscoveryResult;

// --- WebSearcher ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Synthesized answer, when the provider produces one.
    pub answer: Option<String>,
    pub results: Vec<SearchHit>,
    /// Provider-reported failure that was not worth retrying.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
    pub url: String,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// `Ok(None)` means the provider had nothing for this query.
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        depth: &str,
        want_answer: bool,
    ) -> Result<Option<SearchResponse>>;
}

// --- StructuredExtractor ---

#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Fill the discovery schema from `evidence`. `Ok(None)` when the model produced
    /// nothing usable.
    async fn extract(&self, instructions: &str, evidence: &str)
        -> Result<Option<DiscoveryResult>>;
}

// --- ScrapeBackend ---

#[async_trait]
pub trait ScrapeBackend: Send + Sync {
    /// Run one scraper job to completion and return its raw result items.
    async fn run(&self, actor: &str, input: serde_json::Value) -> Result<Vec<serde_json::Value>>;
}

// --- FeedFetcher ---

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
