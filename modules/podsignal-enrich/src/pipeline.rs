//! End-to-end enrichment for one podcast: discovery, social scrape and feed read,
//! reconciled by the confidence merger.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use podsignal_common::{
    CanonicalProfile, ConfidenceBands, EnrichmentConfig, FieldKey, ProfileRecord, RetryPolicy,
    ScoreBreakdown, SocialPlatform, UrlNormalizer,
};

use crate::discovery::{DiscoveryOrchestrator, DiscoveryOutcome};
use crate::feed::{read_feed, FeedMetadata};
use crate::merge::ConfidenceMerger;
use crate::scoring::QualityScorer;
use crate::scrape::{ScrapeResults, SocialScrapeAdapter};
use crate::traits::{FeedFetcher, ScrapeBackend, StructuredExtractor, WebSearcher};

/// Per-run switches.
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    pub skip_discovery: bool,
    pub skip_scrape: bool,
    pub skip_feed: bool,
    /// Budget for the discovery searches. Extraction still runs on what was gathered.
    pub deadline: Option<Duration>,
}

/// The enriched profile plus what each source contributed.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichReport {
    pub profile: CanonicalProfile,
    pub discovery: Option<DiscoveryOutcome>,
    pub scrape: ScrapeResults,
    pub feed: Option<FeedMetadata>,
}

pub struct Enricher {
    discovery: DiscoveryOrchestrator,
    scraper: SocialScrapeAdapter,
    feeds: Arc<dyn FeedFetcher>,
    merger: ConfidenceMerger,
    scorer: QualityScorer,
    bands: ConfidenceBands,
    retry: RetryPolicy,
    options: EnrichOptions,
}

impl Enricher {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        extractor: Arc<dyn StructuredExtractor>,
        backend: Arc<dyn ScrapeBackend>,
        feeds: Arc<dyn FeedFetcher>,
        config: EnrichmentConfig,
    ) -> Self {
        let normalizer = UrlNormalizer::new(config.blocklist.clone());
        Self {
            discovery: DiscoveryOrchestrator::new(
                searcher,
                extractor,
                config.discovery.clone(),
                config.retry.clone(),
            ),
            scraper: SocialScrapeAdapter::new(
                backend,
                config.scrape.clone(),
                config.retry.clone(),
                normalizer.clone(),
            ),
            feeds,
            merger: ConfidenceMerger::new(config.bands.clone(), normalizer),
            scorer: QualityScorer::new(config.scoring.clone()),
            bands: config.bands,
            retry: config.retry,
            options: EnrichOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EnrichOptions) -> Self {
        self.options = options;
        self
    }

    /// Enrich one profile. Source failures degrade to "no data from that source";
    /// a profile is always returned.
    pub async fn enrich(&self, initial: CanonicalProfile) -> Result<CanonicalProfile> {
        Ok(self.enrich_report(initial).await?.profile)
    }

    /// Build the initial profile from a system-of-record row, then enrich it.
    pub async fn enrich_record(
        &self,
        record: ProfileRecord,
        manual: &[FieldKey],
    ) -> Result<CanonicalProfile> {
        let initial = CanonicalProfile::from_record(record, manual, &self.bands);
        self.enrich(initial).await
    }

    pub async fn enrich_report(&self, initial: CanonicalProfile) -> Result<EnrichReport> {
        let started = Instant::now();
        let deadline = self.options.deadline.map(|d| started + d);
        info!(podcast = %initial.name, id = %initial.id, "Enrichment started");

        // 1. Discovery
        let discovery = if self.options.skip_discovery {
            None
        } else {
            Some(self.discovery.discover(&initial, deadline).await)
        };
        let discovered = discovery.as_ref().and_then(|d| d.result.as_ref());

        // 2. Scrape the canonical URLs known after discovery.
        let scrape = if self.options.skip_scrape {
            ScrapeResults::new()
        } else {
            let interim =
                self.merger
                    .merge(&initial, discovered, &ScrapeResults::new(), None, Utc::now());
            let urls = social_urls(&interim);
            if urls.is_empty() {
                ScrapeResults::new()
            } else {
                self.scraper.batch_fetch(&urls).await
            }
        };

        // 3. Feed
        let feed = match initial.text(FieldKey::RssUrl) {
            Some(url) if !self.options.skip_feed => {
                match read_feed(self.feeds.as_ref(), url, &self.retry).await {
                    Ok(meta) => Some(meta),
                    Err(e) => {
                        warn!(podcast = %initial.name, url, error = %e, "Feed unavailable");
                        None
                    }
                }
            }
            _ => None,
        };

        // 4. Merge everything from the initial profile in one pass.
        let profile = self
            .merger
            .merge(&initial, discovered, &scrape, feed.as_ref(), Utc::now());

        info!(
            podcast = %profile.name,
            fields = profile.fields().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment complete"
        );

        Ok(EnrichReport {
            profile,
            discovery,
            scrape,
            feed,
        })
    }

    /// Score as of now.
    pub fn score(&self, profile: &CanonicalProfile) -> ScoreBreakdown {
        self.scorer.score(profile, Utc::now())
    }
}

/// Populated social URL fields grouped by platform.
fn social_urls(profile: &CanonicalProfile) -> HashMap<SocialPlatform, Vec<String>> {
    let mut urls: HashMap<SocialPlatform, Vec<String>> = HashMap::new();
    for (key, platform, _) in FieldKey::platform_url_fields() {
        if let Some(url) = profile.text(key) {
            urls.entry(platform).or_default().push(url.to_string());
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use podsignal_common::{FieldSource, FieldValue};

    #[test]
    fn social_urls_group_podcast_and_host_profiles() {
        let mut profile = CanonicalProfile::new("Tech Show");
        for (key, url) in [
            (FieldKey::TwitterUrl, "https://twitter.com/techshow"),
            (FieldKey::HostTwitterUrl, "https://twitter.com/janedoe"),
            (FieldKey::LinkedinUrl, "https://www.linkedin.com/company/tech-show"),
            (FieldKey::WebsiteUrl, "https://techshow.fm/"),
        ] {
            profile.offer(key, FieldValue::Text(url.into()), FieldSource::ApiPrimary, 0.9);
        }

        let urls = social_urls(&profile);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[&SocialPlatform::Twitter].len(), 2);
        assert_eq!(urls[&SocialPlatform::LinkedIn].len(), 1);
    }
}
