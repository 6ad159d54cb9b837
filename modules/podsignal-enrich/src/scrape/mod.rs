//! Social scrape adapter: batches profile URLs per platform through a
//! [`ScrapeBackend`] and normalizes the results.

pub mod apify;
pub mod cast;
pub mod mapping;

pub use apify::ApifyScrapeBackend;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use apify_client::{
    InstagramProfileInput, LinkedInProfileInput, TikTokProfileInput, TwitterProfileInput,
};
use podsignal_common::{PlatformRecord, RetryPolicy, ScrapeSettings, SocialPlatform, UrlNormalizer};

use crate::retry::with_retry;
use crate::traits::ScrapeBackend;

/// Results keyed by canonical profile URL (or the raw input when it could not be
/// canonicalized). `None` means no data for that URL.
pub type ScrapeResults = HashMap<String, Option<PlatformRecord>>;

/// Backend used when no scraping credentials are configured. Every run yields nothing.
pub struct NoopScrapeBackend;

#[async_trait]
impl ScrapeBackend for NoopScrapeBackend {
    async fn run(&self, actor: &str, _input: serde_json::Value) -> Result<Vec<serde_json::Value>> {
        debug!(actor, "Scraping disabled, skipping actor run");
        Ok(Vec::new())
    }
}

pub struct SocialScrapeAdapter {
    backend: Arc<dyn ScrapeBackend>,
    settings: ScrapeSettings,
    retry: RetryPolicy,
    normalizer: UrlNormalizer,
}

impl SocialScrapeAdapter {
    pub fn new(
        backend: Arc<dyn ScrapeBackend>,
        settings: ScrapeSettings,
        retry: RetryPolicy,
        normalizer: UrlNormalizer,
    ) -> Self {
        Self {
            backend,
            settings,
            retry,
            normalizer,
        }
    }

    /// Scrape every URL. Platforms run concurrently; a failing platform (or a failing
    /// TikTok call) only blanks its own URLs.
    pub async fn batch_fetch(
        &self,
        urls_by_platform: &HashMap<SocialPlatform, Vec<String>>,
    ) -> ScrapeResults {
        let mut results = ScrapeResults::new();
        let mut work = Vec::new();

        for (platform, raw_urls) in urls_by_platform {
            let mut canonical = BTreeSet::new();
            for raw in raw_urls {
                match self.normalizer.canonical_profile_url(raw, *platform) {
                    Some(url) => {
                        canonical.insert(url);
                    }
                    None => {
                        debug!(platform = %platform, url = raw.as_str(), "Skipping non-profile URL");
                        results.insert(raw.clone(), None);
                    }
                }
            }
            if !canonical.is_empty() {
                work.push(self.fetch_platform(*platform, canonical.into_iter().collect()));
            }
        }

        for platform_results in join_all(work).await {
            results.extend(platform_results);
        }

        let hits = results.values().filter(|r| r.is_some()).count();
        info!(urls = results.len(), hits, "Social scrape complete");
        results
    }

    async fn fetch_platform(
        &self,
        platform: SocialPlatform,
        urls: Vec<String>,
    ) -> Vec<(String, Option<PlatformRecord>)> {
        let Some(actor) = self.settings.actor_for(platform) else {
            debug!(platform = %platform, urls = urls.len(), "Platform not supported for scraping");
            return urls.into_iter().map(|u| (u, None)).collect();
        };

        info!(platform = %platform, urls = urls.len(), "Scraping platform");

        if platform == SocialPlatform::TikTok {
            let mut out = Vec::with_capacity(urls.len());
            for url in urls {
                let record = match self.tiktok_single(actor, &url).await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(platform = %platform, url = url.as_str(), error = %e, "TikTok scrape failed");
                        None
                    }
                };
                out.push((url, record));
            }
            return out;
        }

        match self.batch(platform, actor, &urls).await {
            Ok(mut found) => urls
                .into_iter()
                .map(|u| {
                    let record = found.remove(&u);
                    (u, record)
                })
                .collect(),
            Err(e) => {
                warn!(platform = %platform, urls = urls.len(), error = %e, "Platform scrape failed");
                urls.into_iter().map(|u| (u, None)).collect()
            }
        }
    }

    /// One backend call for the whole batch. Only items that correlate to a requested
    /// URL are kept; pad accounts and strays are dropped.
    async fn batch(
        &self,
        platform: SocialPlatform,
        actor: &str,
        urls: &[String],
    ) -> Result<HashMap<String, PlatformRecord>> {
        let input = match platform {
            SocialPlatform::Twitter => {
                let mut handles = self.usernames(urls, platform);
                for pad in &self.settings.twitter_pad_accounts {
                    if handles.len() >= self.settings.twitter_min_batch {
                        break;
                    }
                    if let Some(h) = self.normalizer.extract_username(pad, platform) {
                        if !handles.contains(&h) {
                            handles.push(h);
                        }
                    }
                }
                to_input(&TwitterProfileInput {
                    max_items: handles.len() as u32,
                    twitter_handles: handles,
                    get_followers: false,
                    get_following: false,
                })?
            }
            SocialPlatform::Instagram => to_input(&InstagramProfileInput {
                usernames: self.usernames(urls, platform),
            })?,
            _ => to_input(&LinkedInProfileInput {
                profile_urls: urls.to_vec(),
            })?,
        };

        let items = self.run(actor, input).await?;

        let mut found = HashMap::new();
        for item in &items {
            if !mapping::has_profile_data(item, platform) {
                continue;
            }
            let Some(url) = mapping::identify(item, platform, &self.normalizer) else {
                continue;
            };
            if urls.contains(&url) && !found.contains_key(&url) {
                let record = mapping::to_record(item, platform, url.clone());
                found.insert(url, record);
            }
        }
        debug!(platform = %platform, items = items.len(), matched = found.len(), "Correlated scrape items");
        Ok(found)
    }

    async fn tiktok_single(&self, actor: &str, url: &str) -> Result<Option<PlatformRecord>> {
        let platform = SocialPlatform::TikTok;
        let username = self
            .normalizer
            .extract_username(url, platform)
            .context("TikTok URL without a username")?;
        let input = to_input(&TikTokProfileInput {
            profiles: vec![username],
            results_per_page: 1,
            should_download_videos: false,
        })?;

        let items = self.run(actor, input).await?;

        let mut fallback = None;
        for item in items.iter().filter(|i| mapping::has_profile_data(i, platform)) {
            match mapping::identify(item, platform, &self.normalizer) {
                Some(found) if found == url => {
                    return Ok(Some(mapping::to_record(item, platform, found)));
                }
                Some(_) => {}
                // One profile per call, so an anonymous item can only be ours.
                None if fallback.is_none() => fallback = Some(item),
                None => {}
            }
        }
        Ok(fallback.map(|item| mapping::to_record(item, platform, url.to_string())))
    }

    async fn run(&self, actor: &str, input: serde_json::Value) -> Result<Vec<serde_json::Value>> {
        with_retry(&self.retry, actor, || self.backend.run(actor, input.clone())).await
    }

    fn usernames(&self, urls: &[String], platform: SocialPlatform) -> Vec<String> {
        urls.iter()
            .filter_map(|u| self.normalizer.extract_username(u, platform))
            .collect()
    }
}

fn to_input<T: Serialize>(input: &T) -> Result<serde_json::Value> {
    serde_json::to_value(input).context("Failed to serialize actor input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use serde_json::json;

    fn adapter(backend: MockBackend) -> (SocialScrapeAdapter, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let adapter = SocialScrapeAdapter::new(
            backend.clone(),
            ScrapeSettings::default(),
            RetryPolicy::immediate(),
            UrlNormalizer::default(),
        );
        (adapter, backend)
    }

    fn request(platform: SocialPlatform, urls: &[&str]) -> HashMap<SocialPlatform, Vec<String>> {
        HashMap::from([(platform, urls.iter().map(|u| u.to_string()).collect())])
    }

    #[tokio::test]
    async fn twitter_batches_are_padded_and_pads_never_leak() {
        let settings = ScrapeSettings::default();
        let backend = MockBackend::new().on_actor(
            &settings.twitter_actor,
            vec![
                json!({"userName": "techshow", "followers": 1500}),
                json!({"userName": "nasa", "followers": 80_000_000}),
                json!({"userName": "nytimes", "followers": 50_000_000}),
            ],
        );
        let (adapter, backend) = adapter(backend);

        let results = adapter
            .batch_fetch(&request(SocialPlatform::Twitter, &["http://x.com/TechShow/"]))
            .await;

        assert_eq!(results.len(), 1);
        let record = results["https://twitter.com/techshow"].as_ref().unwrap();
        assert_eq!(record.followers, Some(1500));

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        let handles = calls[0].1["twitterHandles"].as_array().unwrap();
        assert_eq!(handles.len(), 5);
        assert_eq!(handles[0], "techshow");
    }

    #[tokio::test]
    async fn duplicate_urls_collapse_to_one_request() {
        let settings = ScrapeSettings::default();
        let backend = MockBackend::new().on_actor(
            &settings.instagram_actor,
            vec![json!({"username": "techshow", "followersCount": 10})],
        );
        let (adapter, backend) = adapter(backend);

        let results = adapter
            .batch_fetch(&request(
                SocialPlatform::Instagram,
                &["instagram.com/techshow", "https://www.instagram.com/TechShow/?hl=en"],
            ))
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(backend.calls()[0].1["usernames"], json!(["techshow"]));
    }

    #[tokio::test]
    async fn unsupported_platforms_map_to_none_without_calls() {
        let (adapter, backend) = adapter(MockBackend::new());
        let mut urls = request(SocialPlatform::YouTube, &["https://youtube.com/@techshow"]);
        urls.insert(SocialPlatform::Facebook, vec!["https://facebook.com/techshow".into()]);

        let results = adapter.batch_fetch(&urls).await;

        assert_eq!(results.len(), 2);
        assert!(results.values().all(Option::is_none));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn failing_platform_does_not_blank_others() {
        let settings = ScrapeSettings::default();
        let backend = MockBackend::new()
            .fail_actor(&settings.linkedin_actor)
            .on_actor(
                &settings.instagram_actor,
                vec![json!({"username": "techshow", "followersCount": 10})],
            );
        let (adapter, _) = adapter(backend);

        let mut urls = request(SocialPlatform::LinkedIn, &["linkedin.com/company/tech-show"]);
        urls.insert(SocialPlatform::Instagram, vec!["instagram.com/techshow".into()]);
        let results = adapter.batch_fetch(&urls).await;

        assert!(results["https://www.linkedin.com/company/tech-show"].is_none());
        assert_eq!(
            results["https://instagram.com/techshow"].as_ref().and_then(|r| r.followers),
            Some(10)
        );
    }

    #[tokio::test]
    async fn non_profile_urls_are_kept_as_none() {
        let (adapter, backend) = adapter(MockBackend::new());
        let results = adapter
            .batch_fetch(&request(SocialPlatform::Twitter, &["https://twitter.com/i/lists/1"]))
            .await;
        assert_eq!(results.get("https://twitter.com/i/lists/1"), Some(&None));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn tiktok_anonymous_item_counts_for_the_single_request() {
        let settings = ScrapeSettings::default();
        let backend = MockBackend::new().on_actor(
            &settings.tiktok_actor,
            vec![json!({"fans": 777, "nickname": "Tech Show"})],
        );
        let (adapter, _) = adapter(backend);

        let results = adapter
            .batch_fetch(&request(SocialPlatform::TikTok, &["tiktok.com/@techshow"]))
            .await;
        let record = results["https://www.tiktok.com/@techshow"].as_ref().unwrap();
        assert_eq!(record.followers, Some(777));
    }
}
