//! Declarative table of every mergeable profile field.
//!
//! `FieldKey::spec` is an exhaustive match, so adding a key without metadata is a
//! compile error. String lookups (`FieldKey::from_name`) go through the same table.

use serde::{Deserialize, Serialize};

use crate::types::{FieldValue, SocialPlatform};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    WebsiteUrl,
    RssUrl,
    TwitterUrl,
    InstagramUrl,
    TiktokUrl,
    LinkedinUrl,
    YoutubeUrl,
    FacebookUrl,
    HostLinkedinUrl,
    HostTwitterUrl,
    ContactEmail,
    RssOwnerEmail,
    Description,
    Publisher,
    Language,
    HostNames,
    TwitterFollowers,
    InstagramFollowers,
    TiktokFollowers,
    LinkedinFollowers,
    YoutubeSubscribers,
    FacebookFollowers,
    HostLinkedinFollowers,
    HostTwitterFollowers,
    EpisodeCount,
    AudienceSize,
    AppleRatingCount,
    SpotifyRatingCount,
    PopularityScore,
    AppleRating,
    SpotifyRating,
    AvgPublishIntervalDays,
    FirstPublishDate,
    LastPublishDate,
}

/// How a field's value is shaped and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Canonical social profile URL; scrape results for it land in `followers`.
    PlatformUrl {
        platform: SocialPlatform,
        followers: FieldKey,
    },
    Url,
    Email,
    Text,
    Names,
    Count,
    Number,
    Date,
}

impl FieldKind {
    /// Whether `value` has the shape this kind stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (
                FieldKind::PlatformUrl { .. } | FieldKind::Url | FieldKind::Email | FieldKind::Text,
                FieldValue::Text(_),
            ) => true,
            (FieldKind::Names, FieldValue::Names(_)) => true,
            (FieldKind::Count, FieldValue::Count(_)) => true,
            (FieldKind::Number, FieldValue::Number(_) | FieldValue::Count(_)) => true,
            (FieldKind::Date, FieldValue::Date(_)) => true,
            _ => false,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, FieldKind::PlatformUrl { .. } | FieldKind::Url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    /// snake_case name, identical to the serde form.
    pub name: &'static str,
    /// Human label used in evidence text and discovery targets.
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn spec(key: FieldKey, name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        key,
        name,
        label,
        kind,
    }
}

const fn platform(platform: SocialPlatform, followers: FieldKey) -> FieldKind {
    FieldKind::PlatformUrl {
        platform,
        followers,
    }
}

impl FieldKey {
    pub const ALL: [FieldKey; 34] = [
        FieldKey::WebsiteUrl,
        FieldKey::RssUrl,
        FieldKey::TwitterUrl,
        FieldKey::InstagramUrl,
        FieldKey::TiktokUrl,
        FieldKey::LinkedinUrl,
        FieldKey::YoutubeUrl,
        FieldKey::FacebookUrl,
        FieldKey::HostLinkedinUrl,
        FieldKey::HostTwitterUrl,
        FieldKey::ContactEmail,
        FieldKey::RssOwnerEmail,
        FieldKey::Description,
        FieldKey::Publisher,
        FieldKey::Language,
        FieldKey::HostNames,
        FieldKey::TwitterFollowers,
        FieldKey::InstagramFollowers,
        FieldKey::TiktokFollowers,
        FieldKey::LinkedinFollowers,
        FieldKey::YoutubeSubscribers,
        FieldKey::FacebookFollowers,
        FieldKey::HostLinkedinFollowers,
        FieldKey::HostTwitterFollowers,
        FieldKey::EpisodeCount,
        FieldKey::AudienceSize,
        FieldKey::AppleRatingCount,
        FieldKey::SpotifyRatingCount,
        FieldKey::PopularityScore,
        FieldKey::AppleRating,
        FieldKey::SpotifyRating,
        FieldKey::AvgPublishIntervalDays,
        FieldKey::FirstPublishDate,
        FieldKey::LastPublishDate,
    ];

    pub fn spec(self) -> FieldSpec {
        use FieldKey as K;
        use FieldKind::*;
        use SocialPlatform as P;
        match self {
            K::WebsiteUrl => spec(self, "website_url", "Podcast Website URL", Url),
            K::RssUrl => spec(self, "rss_url", "Podcast RSS Feed URL", Url),
            K::TwitterUrl => spec(
                self,
                "twitter_url",
                "Podcast Twitter URL",
                platform(P::Twitter, K::TwitterFollowers),
            ),
            K::InstagramUrl => spec(
                self,
                "instagram_url",
                "Podcast Instagram URL",
                platform(P::Instagram, K::InstagramFollowers),
            ),
            K::TiktokUrl => spec(
                self,
                "tiktok_url",
                "Podcast TikTok URL",
                platform(P::TikTok, K::TiktokFollowers),
            ),
            K::LinkedinUrl => spec(
                self,
                "linkedin_url",
                "Podcast LinkedIn Page URL",
                platform(P::LinkedIn, K::LinkedinFollowers),
            ),
            K::YoutubeUrl => spec(
                self,
                "youtube_url",
                "Podcast YouTube Channel URL",
                platform(P::YouTube, K::YoutubeSubscribers),
            ),
            K::FacebookUrl => spec(
                self,
                "facebook_url",
                "Podcast Facebook Page URL",
                platform(P::Facebook, K::FacebookFollowers),
            ),
            K::HostLinkedinUrl => spec(
                self,
                "host_linkedin_url",
                "Primary Host LinkedIn URL",
                platform(P::LinkedIn, K::HostLinkedinFollowers),
            ),
            K::HostTwitterUrl => spec(
                self,
                "host_twitter_url",
                "Primary Host Twitter URL",
                platform(P::Twitter, K::HostTwitterFollowers),
            ),
            K::ContactEmail => spec(self, "contact_email", "Podcast Contact Email", Email),
            K::RssOwnerEmail => spec(self, "rss_owner_email", "RSS Feed Owner Email", Email),
            K::Description => spec(self, "description", "Podcast Description", Text),
            K::Publisher => spec(self, "publisher", "Podcast Publisher", Text),
            K::Language => spec(self, "language", "Podcast Language", Text),
            K::HostNames => spec(self, "host_names", "Podcast Host Names", Names),
            K::TwitterFollowers => spec(self, "twitter_followers", "Twitter Followers", Count),
            K::InstagramFollowers => {
                spec(self, "instagram_followers", "Instagram Followers", Count)
            }
            K::TiktokFollowers => spec(self, "tiktok_followers", "TikTok Followers", Count),
            K::LinkedinFollowers => spec(self, "linkedin_followers", "LinkedIn Followers", Count),
            K::YoutubeSubscribers => {
                spec(self, "youtube_subscribers", "YouTube Subscribers", Count)
            }
            K::FacebookFollowers => spec(self, "facebook_followers", "Facebook Followers", Count),
            K::HostLinkedinFollowers => spec(
                self,
                "host_linkedin_followers",
                "Host LinkedIn Followers",
                Count,
            ),
            K::HostTwitterFollowers => spec(
                self,
                "host_twitter_followers",
                "Host Twitter Followers",
                Count,
            ),
            K::EpisodeCount => spec(self, "episode_count", "Episode Count", Count),
            K::AudienceSize => spec(self, "audience_size", "Audience Size", Count),
            K::AppleRatingCount => {
                spec(self, "apple_rating_count", "Apple Podcasts Rating Count", Count)
            }
            K::SpotifyRatingCount => {
                spec(self, "spotify_rating_count", "Spotify Rating Count", Count)
            }
            K::PopularityScore => spec(self, "popularity_score", "Popularity Score", Number),
            K::AppleRating => spec(self, "apple_rating", "Apple Podcasts Rating", Number),
            K::SpotifyRating => spec(self, "spotify_rating", "Spotify Rating", Number),
            K::AvgPublishIntervalDays => spec(
                self,
                "avg_publish_interval_days",
                "Average Days Between Episodes",
                Number,
            ),
            K::FirstPublishDate => spec(self, "first_publish_date", "First Episode Date", Date),
            K::LastPublishDate => spec(self, "last_publish_date", "Latest Episode Date", Date),
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    pub fn from_name(name: &str) -> Option<FieldKey> {
        FieldKey::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Social platform this URL field points at, if any.
    pub fn platform(self) -> Option<SocialPlatform> {
        match self.kind() {
            FieldKind::PlatformUrl { platform, .. } => Some(platform),
            _ => None,
        }
    }

    /// Every (url field, platform, follower field) triple.
    pub fn platform_url_fields() -> impl Iterator<Item = (FieldKey, SocialPlatform, FieldKey)> {
        FieldKey::ALL.iter().filter_map(|k| match k.kind() {
            FieldKind::PlatformUrl {
                platform,
                followers,
            } => Some((*k, platform, followers)),
            _ => None,
        })
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_keys_are_distinct() {
        let set: HashSet<FieldKey> = FieldKey::ALL.iter().copied().collect();
        assert_eq!(set.len(), FieldKey::ALL.len());
    }

    #[test]
    fn names_match_serde_form() {
        for key in FieldKey::ALL {
            let json = serde_json::to_value(key).unwrap();
            assert_eq!(json.as_str(), Some(key.name()), "mismatch for {key:?}");
        }
    }

    #[test]
    fn from_name_round_trips_every_key() {
        for key in FieldKey::ALL {
            assert_eq!(FieldKey::from_name(key.name()), Some(key));
        }
        assert_eq!(FieldKey::from_name("podcast_myspace_url"), None);
    }

    #[test]
    fn follower_fields_are_counts() {
        for (url_key, _, followers) in FieldKey::platform_url_fields() {
            assert_eq!(followers.kind(), FieldKind::Count, "{url_key} pairs with non-count");
        }
    }

    #[test]
    fn host_scoped_urls_have_their_own_follower_fields() {
        let followers: Vec<FieldKey> = FieldKey::platform_url_fields().map(|(_, _, f)| f).collect();
        let distinct: HashSet<FieldKey> = followers.iter().copied().collect();
        assert_eq!(followers.len(), distinct.len());
    }

    #[test]
    fn number_kind_accepts_counts() {
        assert!(FieldKind::Number.accepts(&FieldValue::Count(4)));
        assert!(!FieldKind::Count.accepts(&FieldValue::Number(4.5)));
        assert!(!FieldKind::Url.accepts(&FieldValue::Count(1)));
    }
}
