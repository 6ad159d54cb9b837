use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EnrichError;
use crate::types::{FieldSource, SocialPlatform};

/// Secrets and env-specific values. Tunables live in [`EnrichmentConfig`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub tavily_api_key: String,
    pub apify_api_key: Option<String>,
    pub extraction_model: Option<String>,
    pub config_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is required")?,
            tavily_api_key: std::env::var("TAVILY_API_KEY").context("TAVILY_API_KEY is required")?,
            apify_api_key: std::env::var("APIFY_API_KEY").ok().filter(|k| !k.is_empty()),
            extraction_model: std::env::var("PODSIGNAL_EXTRACTION_MODEL").ok(),
            config_path: std::env::var("PODSIGNAL_CONFIG").ok(),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  TAVILY_API_KEY: {}", preview(&self.tavily_api_key));
        tracing::info!("  APIFY_API_KEY: {}", preview_opt(&self.apify_api_key));
        tracing::info!(
            "  PODSIGNAL_EXTRACTION_MODEL: {}",
            self.extraction_model.as_deref().unwrap_or("<default>")
        );
    }
}

/// All tunables of an enrichment run. Every section has production defaults and can be
/// overridden piecemeal from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub bands: ConfidenceBands,
    pub scoring: ScoringPolicy,
    pub discovery: DiscoverySettings,
    pub scrape: ScrapeSettings,
    pub retry: RetryPolicy,
    pub blocklist: UrlBlocklist,
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<EnrichmentConfig, EnrichError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| EnrichError::Config(format!("Failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| EnrichError::Config(format!("Failed to parse {}: {e}", path.display())))
}

// --- Confidence ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBands {
    pub manual: f64,
    pub api_primary: f64,
    pub social_scrape: f64,
    pub rss_feed: f64,
    pub llm_discovery: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            manual: 1.0,
            api_primary: 0.9,
            social_scrape: 0.8,
            rss_feed: 0.7,
            llm_discovery: 0.6,
        }
    }
}

impl ConfidenceBands {
    pub fn for_source(&self, source: FieldSource) -> f64 {
        match source {
            FieldSource::Manual => self.manual,
            FieldSource::ApiPrimary => self.api_primary,
            FieldSource::SocialScrape => self.social_scrape,
            FieldSource::RssFeed => self.rss_feed,
            FieldSource::LlmDiscovery => self.llm_discovery,
        }
    }
}

// --- Retry ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based), without jitter: base * 3^attempt, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 3u64.saturating_pow(attempt);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// No waiting and a single attempt. Used by tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }
}

// --- Scoring ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub weights: ScoreWeights,
    pub recency: RecencyBands,
    pub frequency: FrequencyBands,
    pub audience: AudiencePolicy,
    pub social: SocialPolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            recency: RecencyBands::default(),
            frequency: FrequencyBands::default(),
            audience: AudiencePolicy::default(),
            social: SocialPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub recency: f64,
    pub frequency: f64,
    pub audience: f64,
    pub social: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            recency: 0.25,
            frequency: 0.25,
            audience: 0.30,
            social: 0.20,
        }
    }
}

/// Days since last publication: 1.0 up to `full_days`, linear to `mid_score` at
/// `mid_days`, linear to `tail_score` at `tail_days`, then 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyBands {
    pub full_days: f64,
    pub mid_days: f64,
    pub mid_score: f64,
    pub tail_days: f64,
    pub tail_score: f64,
}

impl Default for RecencyBands {
    fn default() -> Self {
        Self {
            full_days: 30.0,
            mid_days: 90.0,
            mid_score: 0.5,
            tail_days: 180.0,
            tail_score: 0.1,
        }
    }
}

/// Average days between episodes: 1.0 up to `full_days`, linear to `mid_score` at
/// `mid_days`, linear to 0 at `mid_days * tail_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyBands {
    pub full_days: f64,
    pub mid_days: f64,
    pub mid_score: f64,
    pub tail_multiplier: f64,
    /// Episodes needed before an interval is derived from first/last dates.
    pub min_episodes: u64,
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            full_days: 14.0,
            mid_days: 35.0,
            mid_score: 0.5,
            tail_multiplier: 2.5,
            min_episodes: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudiencePolicy {
    pub popularity_weight: f64,
    pub audience_size_weight: f64,
    pub apple_weight: f64,
    pub spotify_weight: f64,
    pub high_popularity: f64,
    pub high_audience_size: f64,
    /// Threshold for `rating * rating_count`.
    pub high_rating_volume: f64,
}

impl Default for AudiencePolicy {
    fn default() -> Self {
        Self {
            popularity_weight: 0.3,
            audience_size_weight: 0.3,
            apple_weight: 0.2,
            spotify_weight: 0.2,
            high_popularity: 80.0,
            high_audience_size: 50_000.0,
            high_rating_volume: 5_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPolicy {
    pub youtube_weight: f64,
    pub instagram_weight: f64,
    pub tiktok_weight: f64,
    pub twitter_weight: f64,
    pub linkedin_weight: f64,
    pub high_followers: f64,
}

impl Default for SocialPolicy {
    fn default() -> Self {
        Self {
            youtube_weight: 0.4,
            instagram_weight: 0.2,
            tiktok_weight: 0.2,
            twitter_weight: 0.1,
            linkedin_weight: 0.1,
            high_followers: 100_000.0,
        }
    }
}

// --- Discovery ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub max_results: u32,
    /// Result snippets appended to the evidence buffer per search.
    pub max_snippets: usize,
    pub search_depth: String,
    pub include_answer: bool,
    pub inter_search_delay_ms: u64,
    pub extraction_model: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_snippets: 3,
            search_depth: "advanced".to_string(),
            include_answer: true,
            inter_search_delay_ms: 1000,
            extraction_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl DiscoverySettings {
    pub fn inter_search_delay(&self) -> Duration {
        Duration::from_millis(self.inter_search_delay_ms)
    }
}

// --- Scrape ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    pub twitter_actor: String,
    pub instagram_actor: String,
    pub linkedin_actor: String,
    pub tiktok_actor: String,
    /// Smallest batch the Twitter actor accepts.
    pub twitter_min_batch: usize,
    /// Stable public accounts used to pad short Twitter batches.
    pub twitter_pad_accounts: Vec<String>,
    /// Minute-long polls to wait for one actor run.
    pub max_polls: u32,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            twitter_actor: "apidojo~twitter-user-scraper".to_string(),
            instagram_actor: "apify~instagram-profile-scraper".to_string(),
            linkedin_actor: "dev_fusion~linkedin-profile-scraper".to_string(),
            tiktok_actor: "clockworks~tiktok-profile-scraper".to_string(),
            twitter_min_batch: 5,
            twitter_pad_accounts: ["nasa", "nytimes", "bbcworld", "github", "spacex"]
                .iter()
                .map(|h| format!("https://twitter.com/{h}"))
                .collect(),
            max_polls: 10,
        }
    }
}

impl ScrapeSettings {
    pub fn actor_for(&self, platform: SocialPlatform) -> Option<&str> {
        match platform {
            SocialPlatform::Twitter => Some(&self.twitter_actor),
            SocialPlatform::Instagram => Some(&self.instagram_actor),
            SocialPlatform::LinkedIn => Some(&self.linkedin_actor),
            SocialPlatform::TikTok => Some(&self.tiktok_actor),
            SocialPlatform::YouTube | SocialPlatform::Facebook => None,
        }
    }
}

// --- Blocklist ---

/// Placeholder domains and handles that are never real identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlBlocklist {
    /// Blocked together with all of their subdomains.
    pub domains: Vec<String>,
    /// Blocked usernames on any social platform.
    pub handles: Vec<String>,
}

impl Default for UrlBlocklist {
    fn default() -> Self {
        Self {
            domains: [
                "example.com",
                "example.org",
                "example.net",
                "test.com",
                "domain.com",
                "yourdomain.com",
                "yourwebsite.com",
                "website.com",
                "placeholder.com",
                "localhost",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            handles: [
                "username",
                "yourusername",
                "yourhandle",
                "handle",
                "user",
                "podcast",
                "yourpodcast",
                "podcastname",
                "example",
                "johndoe",
                "janedoe",
                "test",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl UrlBlocklist {
    /// Whether `host` is a blocked domain or a subdomain of one.
    pub fn blocks_host(&self, host: &str) -> bool {
        self.domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{d}")))
    }

    pub fn blocks_handle(&self, handle: &str) -> bool {
        let handle = handle.trim_start_matches('@');
        self.handles.iter().any(|h| h.eq_ignore_ascii_case(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_strictly_ordered() {
        let b = ConfidenceBands::default();
        assert!(b.manual > b.api_primary);
        assert!(b.api_primary > b.social_scrape);
        assert!(b.social_scrape > b.rss_feed);
        assert!(b.rss_feed > b.llm_discovery);
    }

    #[test]
    fn score_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.recency + w.frequency + w.audience + w.social - 1.0).abs() < 1e-9);
        let s = SocialPolicy::default();
        let social = s.youtube_weight
            + s.instagram_weight
            + s.tiktok_weight
            + s.twitter_weight
            + s.linkedin_weight;
        assert!((social - 1.0).abs() < 1e-9);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let r = RetryPolicy::default();
        assert_eq!(r.backoff(0), Duration::from_millis(1000));
        assert_eq!(r.backoff(1), Duration::from_millis(3000));
        assert_eq!(r.backoff(2), Duration::from_millis(9000));
        assert_eq!(r.backoff(10), Duration::from_millis(30_000));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EnrichmentConfig = toml::from_str(
            r#"
            [bands]
            llm_discovery = 0.55

            [scrape]
            twitter_min_batch = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.bands.llm_discovery, 0.55);
        assert_eq!(config.bands.api_primary, 0.9);
        assert_eq!(config.scrape.twitter_min_batch, 3);
        assert_eq!(config.scrape.twitter_pad_accounts.len(), 5);
        assert_eq!(config.scrape.max_polls, 10);
        assert_eq!(config.scoring.recency.full_days, 30.0);
    }

    #[test]
    fn unknown_section_is_rejected() {
        let err = toml::from_str::<EnrichmentConfig>("[graph]\nuri = \"x\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn unreadable_or_malformed_file_is_a_config_error() {
        let missing = std::env::temp_dir().join("podsignal-no-such-config.toml");
        assert!(matches!(load_config(&missing), Err(EnrichError::Config(_))));

        let path = std::env::temp_dir().join(format!("podsignal-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[retry]\nmax_attempts = \"three\"\n").unwrap();
        let result = load_config(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(EnrichError::Config(msg)) if msg.contains("Failed to parse")));
    }

    #[test]
    fn blocklist_matches_subdomains() {
        let b = UrlBlocklist::default();
        assert!(b.blocks_host("example.com"));
        assert!(b.blocks_host("shop.example.com"));
        assert!(!b.blocks_host("notexample.com"));
        assert!(b.blocks_handle("@Username"));
        assert!(!b.blocks_handle("techshow"));
    }
}
