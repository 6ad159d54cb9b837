// Test mocks for the enrichment pipeline.
//
// One mock per collaborator boundary:
// - MockSearcher (WebSearcher): substring rules query -> response or failure
// - MockExtractor (StructuredExtractor): fixed outcome, records prompts
// - MockBackend (ScrapeBackend): actor/input rules -> items or failure, records calls
// - MockFeedFetcher (FeedFetcher): URL -> feed body
//
// Mocks are cheap to clone; clones share their call logs, so a test can keep a
// handle after moving one into an `Arc<dyn ...>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use ai_client::AiError;
use podsignal_common::{EnrichmentConfig, RetryPolicy};

use crate::extractor::DiscoveryResult;
use crate::traits::{FeedFetcher, ScrapeBackend, SearchHit, SearchResponse, StructuredExtractor, WebSearcher};

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Default config with no retry backoff and no delay between searches.
pub fn fast_config() -> EnrichmentConfig {
    let mut config = EnrichmentConfig::default();
    config.retry = RetryPolicy::immediate();
    config.discovery.inter_search_delay_ms = 0;
    config
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SearchRule {
    Respond(SearchResponse),
    Fail,
}

/// Rules match when their needle is a substring of the query; first match wins.
/// Unmatched queries return `Ok(None)`.
#[derive(Clone, Default)]
pub struct MockSearcher {
    rules: Vec<(String, SearchRule)>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(mut self, needle: &str, response: SearchResponse) -> Self {
        self.rules
            .push((needle.to_string(), SearchRule::Respond(response)));
        self
    }

    /// Answer-only response.
    pub fn on_answer(self, needle: &str, answer: &str) -> Self {
        self.on_query(
            needle,
            SearchResponse {
                answer: Some(answer.to_string()),
                ..Default::default()
            },
        )
    }

    /// Single-result response.
    pub fn on_result(self, needle: &str, url: &str, content: &str) -> Self {
        self.on_query(
            needle,
            SearchResponse {
                answer: None,
                results: vec![SearchHit {
                    title: url.to_string(),
                    content: content.to_string(),
                    url: url.to_string(),
                }],
                error: None,
            },
        )
    }

    pub fn failing(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), SearchRule::Fail));
        self
    }

    /// Every query received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(
        &self,
        query: &str,
        _max_results: u32,
        _depth: &str,
        _want_answer: bool,
    ) -> Result<Option<SearchResponse>> {
        self.queries.lock().unwrap().push(query.to_string());
        match self.rules.iter().find(|(needle, _)| query.contains(needle.as_str())) {
            Some((_, SearchRule::Respond(response))) => Ok(Some(response.clone())),
            Some((_, SearchRule::Fail)) => Err(anyhow!("MockSearcher: search failed for {query}")),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum ExtractOutcome {
    Return(DiscoveryResult),
    Empty,
    Fail,
}

/// Returns one fixed outcome and records every (instructions, evidence) pair.
#[derive(Clone)]
pub struct MockExtractor {
    outcome: ExtractOutcome,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockExtractor {
    fn with(outcome: ExtractOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(result: DiscoveryResult) -> Self {
        Self::with(ExtractOutcome::Return(result))
    }

    pub fn empty() -> Self {
        Self::with(ExtractOutcome::Empty)
    }

    pub fn failing() -> Self {
        Self::with(ExtractOutcome::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_instructions(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(i, _)| i.clone())
    }

    pub fn last_evidence(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(_, e)| e.clone())
    }
}

#[async_trait]
impl StructuredExtractor for MockExtractor {
    async fn extract(
        &self,
        instructions: &str,
        evidence: &str,
    ) -> Result<Option<DiscoveryResult>> {
        self.calls
            .lock()
            .unwrap()
            .push((instructions.to_string(), evidence.to_string()));
        match &self.outcome {
            ExtractOutcome::Return(result) => Ok(Some(result.clone())),
            ExtractOutcome::Empty => Ok(None),
            ExtractOutcome::Fail => {
                Err(AiError::Parse("MockExtractor: malformed model output".into()).into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum BackendRule {
    Items(Vec<Value>),
    Fail,
}

/// Scraper backend keyed by actor. Input rules (`on_input`, `fail_input`) match
/// when the serialized input contains the needle and take precedence over actor
/// rules. Unregistered actors return no items.
#[derive(Clone, Default)]
pub struct MockBackend {
    actors: HashMap<String, BackendRule>,
    inputs: Vec<(String, String, BackendRule)>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_actor(mut self, actor: &str, items: Vec<Value>) -> Self {
        self.actors.insert(actor.to_string(), BackendRule::Items(items));
        self
    }

    pub fn fail_actor(mut self, actor: &str) -> Self {
        self.actors.insert(actor.to_string(), BackendRule::Fail);
        self
    }

    pub fn on_input(mut self, actor: &str, needle: &str, items: Vec<Value>) -> Self {
        self.inputs
            .push((actor.to_string(), needle.to_string(), BackendRule::Items(items)));
        self
    }

    pub fn fail_input(mut self, actor: &str, needle: &str) -> Self {
        self.inputs
            .push((actor.to_string(), needle.to_string(), BackendRule::Fail));
        self
    }

    /// Every (actor, input) the backend was asked to run, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScrapeBackend for MockBackend {
    async fn run(&self, actor: &str, input: Value) -> Result<Vec<Value>> {
        let serialized = input.to_string();
        self.calls.lock().unwrap().push((actor.to_string(), input));

        let rule = self
            .inputs
            .iter()
            .find(|(a, needle, _)| a == actor && serialized.contains(needle.as_str()))
            .map(|(_, _, rule)| rule)
            .or_else(|| self.actors.get(actor));

        match rule {
            Some(BackendRule::Items(items)) => Ok(items.clone()),
            Some(BackendRule::Fail) => Err(anyhow!("MockBackend: actor {actor} failed")),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockFeedFetcher
// ---------------------------------------------------------------------------

/// URL -> feed body. Unregistered URLs are an error.
#[derive(Clone, Default)]
pub struct MockFeedFetcher {
    feeds: HashMap<String, String>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_feed(mut self, url: &str, body: impl Into<String>) -> Self {
        self.feeds.insert(url.to_string(), body.into());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.feeds
            .get(url)
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| anyhow!("MockFeedFetcher: no feed registered for {url}"))
    }
}

/// Minimal podcast RSS document with one item per publication date.
pub fn rss_feed(title: &str, owner_email: &str, published: &[DateTime<Utc>]) -> String {
    let items: String = published
        .iter()
        .enumerate()
        .map(|(i, date)| {
            format!(
                "<item><title>Episode {n}</title><guid>ep-{n}</guid><pubDate>{date}</pubDate></item>",
                n = i + 1,
                date = date.to_rfc2822()
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
<channel>
<title>{title}</title>
<description>All about {title}.</description>
<language>en</language>
<itunes:owner><itunes:name>{title}</itunes:name><itunes:email>{owner_email}</itunes:email></itunes:owner>
{items}
</channel>
</rss>"#
    )
}
