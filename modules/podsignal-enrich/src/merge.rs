//! Confidence merger.
//!
//! Every source offers candidate values into a copy of the initial profile; each
//! field keeps the candidate with the highest source confidence, and manual fields
//! are never touched. Merging the same inputs twice gives the same profile.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use podsignal_common::urls::find_email;
use podsignal_common::{
    CanonicalProfile, ConfidenceBands, FieldKey, FieldKind, FieldSource, FieldValue,
    SocialPlatform, UrlNormalizer,
};

use crate::extractor::DiscoveryResult;
use crate::feed::FeedMetadata;
use crate::scrape::ScrapeResults;

pub struct ConfidenceMerger {
    bands: ConfidenceBands,
    normalizer: UrlNormalizer,
}

impl ConfidenceMerger {
    pub fn new(bands: ConfidenceBands, normalizer: UrlNormalizer) -> Self {
        Self { bands, normalizer }
    }

    /// Merge all sources into a new profile. `now` stamps `social_stats_fetched_at`.
    pub fn merge(
        &self,
        initial: &CanonicalProfile,
        discovery: Option<&DiscoveryResult>,
        scrape: &ScrapeResults,
        feed: Option<&FeedMetadata>,
        now: DateTime<Utc>,
    ) -> CanonicalProfile {
        let mut profile = initial.clone();
        let mut changed = self.sanitize(&mut profile);

        if let Some(result) = discovery {
            let band = self.bands.for_source(FieldSource::LlmDiscovery);
            for (key, value) in result.entries() {
                let Some(value) = self.clean(key, value) else {
                    debug!(field = %key, "Discarding unusable discovery value");
                    continue;
                };
                changed += profile.offer(key, value, FieldSource::LlmDiscovery, band) as usize;
            }
        }

        changed += self.apply_scrape(&mut profile, scrape, now);

        if let Some(feed) = feed {
            changed += self.apply_feed(&mut profile, feed);
        }

        // An explicit contact email always beats the feed owner's address.
        if !profile.is_populated(FieldKey::ContactEmail) {
            if let Some(owner) = profile.text(FieldKey::RssOwnerEmail).map(str::to_string) {
                changed += profile.offer(
                    FieldKey::ContactEmail,
                    FieldValue::Text(owner),
                    FieldSource::RssFeed,
                    self.bands.for_source(FieldSource::RssFeed),
                ) as usize;
            }
        }

        info!(podcast = %profile.name, changed, "Merge complete");
        profile
    }

    /// Repair values already on the profile: emails in URL fields move to
    /// `contact_email`, URLs are re-canonicalized or cleared, emails normalized.
    fn sanitize(&self, profile: &mut CanonicalProfile) -> usize {
        let mut changed = 0;
        let keys: Vec<FieldKey> = profile
            .fields()
            .filter(|(_, state)| state.source != FieldSource::Manual)
            .map(|(key, _)| key)
            .collect();

        for key in keys {
            let Some(state) = profile.get(key).cloned() else {
                continue;
            };
            let FieldValue::Text(raw) = &state.value else {
                continue;
            };
            let kind = key.kind();

            if kind.is_url() {
                if let Some(fixed) = self.clean_url(kind, raw) {
                    if &fixed != raw {
                        profile.offer(key, FieldValue::Text(fixed), state.source, state.confidence);
                        changed += 1;
                    }
                    continue;
                }
                if let Some(email) = find_email(raw) {
                    if !profile.is_populated(FieldKey::ContactEmail) {
                        debug!(field = %key, "Moving email out of URL field");
                        profile.offer(
                            FieldKey::ContactEmail,
                            FieldValue::Text(email),
                            state.source,
                            state.confidence,
                        );
                    }
                }
                debug!(field = %key, value = %raw, "Clearing invalid URL");
                profile.clear(key);
                changed += 1;
            } else if kind == FieldKind::Email {
                match find_email(raw) {
                    Some(email) if &email == raw => {}
                    Some(email) => {
                        profile.offer(key, FieldValue::Text(email), state.source, state.confidence);
                        changed += 1;
                    }
                    None => {
                        profile.clear(key);
                        changed += 1;
                    }
                }
            }
        }
        changed
    }

    /// Canonical form of a candidate value, or `None` when it is unusable for `key`.
    fn clean(&self, key: FieldKey, value: FieldValue) -> Option<FieldValue> {
        let kind = key.kind();
        match value {
            FieldValue::Text(raw) if kind.is_url() => {
                let url = self.clean_url(kind, &raw)?;
                // The podcast website must not be one of its social profiles.
                if key == FieldKey::WebsiteUrl && SocialPlatform::from_url(&url).is_some() {
                    return None;
                }
                Some(FieldValue::Text(url))
            }
            FieldValue::Text(raw) if kind == FieldKind::Email => {
                find_email(&raw).map(FieldValue::Text)
            }
            FieldValue::Text(raw) => Some(FieldValue::Text(raw.trim().to_string())),
            other => Some(other),
        }
    }

    fn clean_url(&self, kind: FieldKind, raw: &str) -> Option<String> {
        match kind {
            FieldKind::PlatformUrl { platform, .. } => {
                self.normalizer.canonical_profile_url(raw, platform)
            }
            _ => self.normalizer.normalize(raw),
        }
    }

    /// Follower counts and URL confirmation from platform records.
    fn apply_scrape(
        &self,
        profile: &mut CanonicalProfile,
        scrape: &ScrapeResults,
        now: DateTime<Utc>,
    ) -> usize {
        let band = self.bands.for_source(FieldSource::SocialScrape);
        let mut changed = 0;

        for (url_key, platform, followers_key) in FieldKey::platform_url_fields() {
            // Manual URLs may be stored in a non-canonical form.
            let Some(url) = profile
                .text(url_key)
                .and_then(|u| self.normalizer.canonical_profile_url(u, platform))
            else {
                continue;
            };
            let Some(Some(record)) = scrape.get(&url) else {
                continue;
            };
            if let Some(followers) = record.followers {
                changed += profile.offer(
                    followers_key,
                    FieldValue::Count(followers),
                    FieldSource::SocialScrape,
                    band,
                ) as usize;
            }
            changed += profile.offer(
                url_key,
                FieldValue::Text(record.profile_url.clone()),
                FieldSource::SocialScrape,
                band,
            ) as usize;
        }

        if scrape.values().any(Option::is_some) {
            profile.social_stats_fetched_at = Some(now);
        }
        changed
    }

    fn apply_feed(&self, profile: &mut CanonicalProfile, feed: &FeedMetadata) -> usize {
        let band = self.bands.for_source(FieldSource::RssFeed);
        let text = |s: &Option<String>| s.clone().map(FieldValue::Text);

        let candidates = [
            (
                FieldKey::RssOwnerEmail,
                feed.owner_email.as_deref().and_then(find_email).map(FieldValue::Text),
            ),
            (FieldKey::Description, text(&feed.description)),
            (FieldKey::Language, text(&feed.language)),
            (FieldKey::Publisher, text(&feed.author)),
            (FieldKey::FirstPublishDate, feed.first_published.map(FieldValue::Date)),
            (FieldKey::LastPublishDate, feed.last_published.map(FieldValue::Date)),
            (FieldKey::EpisodeCount, feed.episode_count.map(FieldValue::Count)),
            (
                FieldKey::AvgPublishIntervalDays,
                feed.avg_interval_days.map(FieldValue::Number),
            ),
        ];

        candidates
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .filter(|(key, value)| profile.offer(*key, value.clone(), FieldSource::RssFeed, band))
            .count()
    }
}

/// Whether the profile has social URLs whose stats are missing or older than `max_age`.
pub fn needs_social_refresh(
    profile: &CanonicalProfile,
    now: DateTime<Utc>,
    max_age: Duration,
) -> bool {
    let has_social = FieldKey::platform_url_fields().any(|(key, _, _)| profile.is_populated(key));
    if !has_social {
        return false;
    }
    match profile.social_stats_fetched_at {
        Some(fetched) => now - fetched > max_age,
        None => true,
    }
}
