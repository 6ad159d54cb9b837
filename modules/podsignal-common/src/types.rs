use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfidenceBands;
use crate::error::EnrichError;
use crate::fields::FieldKey;

// --- Provenance ---

/// Where a field value came from. Each source has a fixed confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Manual,
    ApiPrimary,
    SocialScrape,
    LlmDiscovery,
    RssFeed,
}

impl FieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSource::Manual => "manual",
            FieldSource::ApiPrimary => "api_primary",
            FieldSource::SocialScrape => "social_scrape",
            FieldSource::LlmDiscovery => "llm_discovery",
            FieldSource::RssFeed => "rss_feed",
        }
    }
}

impl std::fmt::Display for FieldSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Social Platform ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Twitter,
    Instagram,
    TikTok,
    LinkedIn,
    YouTube,
    Facebook,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 6] = [
        SocialPlatform::Twitter,
        SocialPlatform::Instagram,
        SocialPlatform::TikTok,
        SocialPlatform::LinkedIn,
        SocialPlatform::YouTube,
        SocialPlatform::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::TikTok => "tiktok",
            SocialPlatform::LinkedIn => "linkedin",
            SocialPlatform::YouTube => "youtube",
            SocialPlatform::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Field values ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Names(Vec<String>),
    Count(u64),
    Number(f64),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Render for evidence text.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Names(names) => names.join(", "),
            FieldValue::Count(n) => n.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Names(names) => names.iter().all(|n| n.trim().is_empty()),
            FieldValue::Number(n) => !n.is_finite(),
            FieldValue::Count(_) | FieldValue::Date(_) => false,
        }
    }
}

/// A field value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: FieldValue,
    pub source: FieldSource,
    pub confidence: f64,
}

// --- Canonical Profile ---

/// The reconciled representation of one podcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    fields: BTreeMap<FieldKey, FieldState>,
    /// Set whenever a scrape produced at least one platform record.
    #[serde(default)]
    pub social_stats_fetched_at: Option<DateTime<Utc>>,
}

impl CanonicalProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            fields: BTreeMap::new(),
            social_stats_fetched_at: None,
        }
    }

    /// Build from a system-of-record row. Populated fields are stamped `api_primary`,
    /// except keys listed in `manual`, which are stamped `manual`.
    pub fn from_record(record: ProfileRecord, manual: &[FieldKey], bands: &ConfidenceBands) -> Self {
        let mut profile = CanonicalProfile {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            name: record.name.clone(),
            fields: BTreeMap::new(),
            social_stats_fetched_at: record.social_stats_fetched_at,
        };
        for (key, value) in record.entries() {
            let source = if manual.contains(&key) {
                FieldSource::Manual
            } else {
                FieldSource::ApiPrimary
            };
            profile.offer(key, value, source, bands.for_source(source));
        }
        profile
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldState> {
        self.fields.get(&key)
    }

    pub fn value(&self, key: FieldKey) -> Option<&FieldValue> {
        self.fields.get(&key).map(|s| &s.value)
    }

    pub fn source(&self, key: FieldKey) -> Option<FieldSource> {
        self.fields.get(&key).map(|s| s.source)
    }

    /// Stored confidence, 0.0 when the field is absent.
    pub fn confidence(&self, key: FieldKey) -> f64 {
        self.fields.get(&key).map(|s| s.confidence).unwrap_or(0.0)
    }

    pub fn is_populated(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn is_manual(&self, key: FieldKey) -> bool {
        self.source(key) == Some(FieldSource::Manual)
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        match self.value(key)? {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn names(&self, key: FieldKey) -> Option<&[String]> {
        match self.value(key)? {
            FieldValue::Names(n) => Some(n.as_slice()),
            _ => None,
        }
    }

    pub fn count(&self, key: FieldKey) -> Option<u64> {
        match self.value(key)? {
            FieldValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of count and number fields.
    pub fn number(&self, key: FieldKey) -> Option<f64> {
        match self.value(key)? {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Count(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn date(&self, key: FieldKey) -> Option<DateTime<Utc>> {
        match self.value(key)? {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (FieldKey, &FieldState)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Offer a candidate value. Accepted only when the field is not manual, the
    /// value is non-empty and of the right kind, and `confidence` is at least the
    /// stored confidence. Returns whether the field changed.
    pub fn offer(
        &mut self,
        key: FieldKey,
        value: FieldValue,
        source: FieldSource,
        confidence: f64,
    ) -> bool {
        if self.is_manual(key) || value.is_empty() {
            return false;
        }
        if !key.kind().accepts(&value) {
            debug_assert!(false, "{value:?} is not a valid value for {key}");
            tracing::warn!(field = %key, ?value, "Rejected value of the wrong kind");
            return false;
        }
        if confidence < self.confidence(key) {
            return false;
        }
        let next = FieldState {
            value,
            source,
            confidence,
        };
        if self.fields.get(&key) == Some(&next) {
            return false;
        }
        self.fields.insert(key, next);
        true
    }

    /// String-keyed variant of [`offer`](Self::offer). An unknown name means the
    /// caller is out of sync with the field table.
    pub fn set_by_name(
        &mut self,
        name: &str,
        value: FieldValue,
        source: FieldSource,
        confidence: f64,
    ) -> Result<bool, EnrichError> {
        let key =
            FieldKey::from_name(name).ok_or_else(|| EnrichError::UnknownField(name.to_string()))?;
        Ok(self.offer(key, value, source, confidence))
    }

    /// Human override: always wins and is never overwritten by automated runs.
    pub fn set_manual(&mut self, key: FieldKey, value: FieldValue) {
        self.fields.insert(
            key,
            FieldState {
                value,
                source: FieldSource::Manual,
                confidence: 1.0,
            },
        );
    }

    /// Remove a field. Manual fields are never cleared.
    pub fn clear(&mut self, key: FieldKey) -> Option<FieldState> {
        if self.is_manual(key) {
            return None;
        }
        self.fields.remove(&key)
    }
}

// --- System-of-record row ---

/// Flat row as delivered by the primary API. Every attribute is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub id: Option<Uuid>,
    pub name: String,
    pub website_url: Option<String>,
    pub rss_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub youtube_url: Option<String>,
    pub facebook_url: Option<String>,
    pub host_linkedin_url: Option<String>,
    pub host_twitter_url: Option<String>,
    pub contact_email: Option<String>,
    pub rss_owner_email: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub host_names: Option<Vec<String>>,
    pub twitter_followers: Option<u64>,
    pub instagram_followers: Option<u64>,
    pub tiktok_followers: Option<u64>,
    pub linkedin_followers: Option<u64>,
    pub youtube_subscribers: Option<u64>,
    pub facebook_followers: Option<u64>,
    pub host_linkedin_followers: Option<u64>,
    pub host_twitter_followers: Option<u64>,
    pub episode_count: Option<u64>,
    pub audience_size: Option<u64>,
    pub apple_rating_count: Option<u64>,
    pub spotify_rating_count: Option<u64>,
    pub popularity_score: Option<f64>,
    pub apple_rating: Option<f64>,
    pub spotify_rating: Option<f64>,
    pub avg_publish_interval_days: Option<f64>,
    pub first_publish_date: Option<DateTime<Utc>>,
    pub last_publish_date: Option<DateTime<Utc>>,
    pub social_stats_fetched_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Populated attributes keyed by field. Values are raw; URL canonicalization
    /// happens when the merger sanitizes the profile.
    pub fn entries(&self) -> Vec<(FieldKey, FieldValue)> {
        use FieldKey as K;

        let text = |key: K, v: &Option<String>| v.clone().map(|s| (key, FieldValue::Text(s)));
        let count = |key: K, v: Option<u64>| v.map(|n| (key, FieldValue::Count(n)));
        let number = |key: K, v: Option<f64>| v.map(|n| (key, FieldValue::Number(n)));
        let date = |key: K, v: Option<DateTime<Utc>>| v.map(|d| (key, FieldValue::Date(d)));

        [
            text(K::WebsiteUrl, &self.website_url),
            text(K::RssUrl, &self.rss_url),
            text(K::TwitterUrl, &self.twitter_url),
            text(K::InstagramUrl, &self.instagram_url),
            text(K::TiktokUrl, &self.tiktok_url),
            text(K::LinkedinUrl, &self.linkedin_url),
            text(K::YoutubeUrl, &self.youtube_url),
            text(K::FacebookUrl, &self.facebook_url),
            text(K::HostLinkedinUrl, &self.host_linkedin_url),
            text(K::HostTwitterUrl, &self.host_twitter_url),
            text(K::ContactEmail, &self.contact_email),
            text(K::RssOwnerEmail, &self.rss_owner_email),
            text(K::Description, &self.description),
            text(K::Publisher, &self.publisher),
            text(K::Language, &self.language),
            self.host_names
                .clone()
                .map(|n| (K::HostNames, FieldValue::Names(n))),
            count(K::TwitterFollowers, self.twitter_followers),
            count(K::InstagramFollowers, self.instagram_followers),
            count(K::TiktokFollowers, self.tiktok_followers),
            count(K::LinkedinFollowers, self.linkedin_followers),
            count(K::YoutubeSubscribers, self.youtube_subscribers),
            count(K::FacebookFollowers, self.facebook_followers),
            count(K::HostLinkedinFollowers, self.host_linkedin_followers),
            count(K::HostTwitterFollowers, self.host_twitter_followers),
            count(K::EpisodeCount, self.episode_count),
            count(K::AudienceSize, self.audience_size),
            count(K::AppleRatingCount, self.apple_rating_count),
            count(K::SpotifyRatingCount, self.spotify_rating_count),
            number(K::PopularityScore, self.popularity_score),
            number(K::AppleRating, self.apple_rating),
            number(K::SpotifyRating, self.spotify_rating),
            number(K::AvgPublishIntervalDays, self.avg_publish_interval_days),
            date(K::FirstPublishDate, self.first_publish_date),
            date(K::LastPublishDate, self.last_publish_date),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// --- Scrape results ---

/// Normalized scrape result for one social profile. Absent fields stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub platform: SocialPlatform,
    pub profile_url: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub verified: Option<bool>,
    pub post_count: Option<u64>,
}

// --- Scoring ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub frequency: f64,
    pub audience: f64,
    pub social: f64,
    /// Weighted composite in [0, 100].
    pub composite: f64,
    pub days_since_last_publish: Option<f64>,
    pub avg_publish_interval_days: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bands() -> ConfidenceBands {
        ConfidenceBands::default()
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn offer_fills_empty_field() {
        let mut p = CanonicalProfile::new("Tech Show");
        assert!(p.offer(FieldKey::Description, text("About tech"), FieldSource::LlmDiscovery, 0.6));
        assert_eq!(p.text(FieldKey::Description), Some("About tech"));
        assert_eq!(p.source(FieldKey::Description), Some(FieldSource::LlmDiscovery));
    }

    #[test]
    fn lower_confidence_never_overwrites() {
        let mut p = CanonicalProfile::new("Tech Show");
        p.offer(FieldKey::Description, text("primary"), FieldSource::ApiPrimary, 0.9);
        assert!(!p.offer(FieldKey::Description, text("llm"), FieldSource::LlmDiscovery, 0.6));
        assert_eq!(p.text(FieldKey::Description), Some("primary"));
    }

    #[test]
    fn equal_confidence_overwrites() {
        let mut p = CanonicalProfile::new("Tech Show");
        p.offer(FieldKey::Description, text("first"), FieldSource::LlmDiscovery, 0.6);
        assert!(p.offer(FieldKey::Description, text("second"), FieldSource::LlmDiscovery, 0.6));
        assert_eq!(p.text(FieldKey::Description), Some("second"));
    }

    #[test]
    fn manual_fields_are_frozen() {
        let mut p = CanonicalProfile::new("Tech Show");
        p.set_manual(FieldKey::TwitterUrl, text("https://twitter.com/real"));
        assert!(!p.offer(FieldKey::TwitterUrl, text("https://twitter.com/fake"), FieldSource::Manual, 1.0));
        assert!(p.clear(FieldKey::TwitterUrl).is_none());
        assert_eq!(p.text(FieldKey::TwitterUrl), Some("https://twitter.com/real"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut p = CanonicalProfile::new("Tech Show");
        assert!(!p.offer(FieldKey::Description, text("   "), FieldSource::ApiPrimary, 0.9));
        assert!(!p.offer(FieldKey::HostNames, FieldValue::Names(vec![]), FieldSource::ApiPrimary, 0.9));
        assert!(!p.is_populated(FieldKey::Description));
    }

    #[test]
    fn set_by_name_rejects_unknown_field() {
        let mut p = CanonicalProfile::new("Tech Show");
        let err = p
            .set_by_name("podcast_myspace_url", text("x"), FieldSource::LlmDiscovery, 0.6)
            .unwrap_err();
        assert!(matches!(err, EnrichError::UnknownField(name) if name == "podcast_myspace_url"));
        assert!(p
            .set_by_name("twitter_url", text("https://twitter.com/a"), FieldSource::LlmDiscovery, 0.6)
            .unwrap());
    }

    #[test]
    fn from_record_stamps_sources() {
        let record = ProfileRecord {
            name: "Tech Show".to_string(),
            twitter_url: Some("https://twitter.com/techshow".to_string()),
            description: Some("Weekly tech news".to_string()),
            episode_count: Some(120),
            ..Default::default()
        };
        let p = CanonicalProfile::from_record(record, &[FieldKey::TwitterUrl], &bands());
        assert_eq!(p.source(FieldKey::TwitterUrl), Some(FieldSource::Manual));
        assert_eq!(p.confidence(FieldKey::TwitterUrl), 1.0);
        assert_eq!(p.source(FieldKey::Description), Some(FieldSource::ApiPrimary));
        assert_eq!(p.confidence(FieldKey::Description), 0.9);
        assert_eq!(p.count(FieldKey::EpisodeCount), Some(120));
    }

    #[test]
    fn record_entries_cover_every_field() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = || Some("x".to_string());
        let record = ProfileRecord {
            id: None,
            name: "Full".to_string(),
            website_url: s(),
            rss_url: s(),
            twitter_url: s(),
            instagram_url: s(),
            tiktok_url: s(),
            linkedin_url: s(),
            youtube_url: s(),
            facebook_url: s(),
            host_linkedin_url: s(),
            host_twitter_url: s(),
            contact_email: s(),
            rss_owner_email: s(),
            description: s(),
            publisher: s(),
            language: s(),
            host_names: Some(vec!["A".to_string()]),
            twitter_followers: Some(1),
            instagram_followers: Some(1),
            tiktok_followers: Some(1),
            linkedin_followers: Some(1),
            youtube_subscribers: Some(1),
            facebook_followers: Some(1),
            host_linkedin_followers: Some(1),
            host_twitter_followers: Some(1),
            episode_count: Some(1),
            audience_size: Some(1),
            apple_rating_count: Some(1),
            spotify_rating_count: Some(1),
            popularity_score: Some(1.0),
            apple_rating: Some(1.0),
            spotify_rating: Some(1.0),
            avg_publish_interval_days: Some(1.0),
            first_publish_date: Some(date),
            last_publish_date: Some(date),
            social_stats_fetched_at: None,
        };
        let entries = record.entries();
        assert_eq!(entries.len(), FieldKey::ALL.len());
        for (key, value) in &entries {
            assert!(key.kind().accepts(value), "{key} got {value:?}");
        }
    }

    #[test]
    fn profile_serializes_field_map_by_name() {
        let mut p = CanonicalProfile::new("Tech Show");
        p.offer(FieldKey::TwitterFollowers, FieldValue::Count(10), FieldSource::SocialScrape, 0.8);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["fields"]["twitter_followers"]["value"]["count"], 10);
        assert_eq!(json["fields"]["twitter_followers"]["source"], "social_scrape");
        let back: CanonicalProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
