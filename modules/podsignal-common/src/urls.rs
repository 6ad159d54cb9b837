//! URL and social identity normalization.
//!
//! Every URL that enters a profile goes through [`UrlNormalizer::normalize`]; social
//! profile URLs additionally go through [`UrlNormalizer::canonical_profile_url`] so each
//! account has exactly one string form per platform.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::UrlBlocklist;
use crate::types::SocialPlatform;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mailto:)?[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$")
        .expect("valid email regex")
});

static EMAIL_FIND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9\-]+(\.[a-z0-9\-]+)*\.[a-z]{2,}")
        .expect("valid email regex")
});

static TWITTER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,15}$").expect("valid regex"));
static INSTAGRAM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{1,30}$").expect("valid regex"));
static TIKTOK_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{2,24}$").expect("valid regex"));
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9._%\-]{0,99}$").expect("valid regex"));

static DEFAULT: LazyLock<UrlNormalizer> = LazyLock::new(UrlNormalizer::default);

const TWITTER_RESERVED: &[&str] = &[
    "i", "intent", "search", "home", "share", "hashtag", "explore", "settings", "login",
    "signup", "messages", "notifications", "compose", "privacy", "tos", "about", "web",
];

const INSTAGRAM_RESERVED: &[&str] = &[
    "p", "reel", "reels", "explore", "stories", "tv", "accounts", "direct", "about", "legal",
    "developer",
];

const FACEBOOK_RESERVED: &[&str] = &[
    "profile.php", "pages", "groups", "watch", "events", "sharer", "sharer.php", "share",
    "marketplace", "gaming", "login", "help", "policies", "photo.php", "story.php",
    "permalink.php", "people", "hashtag",
];

/// Canonical host per platform.
fn canonical_host(platform: SocialPlatform) -> &'static str {
    match platform {
        SocialPlatform::Twitter => "twitter.com",
        SocialPlatform::Instagram => "instagram.com",
        SocialPlatform::TikTok => "www.tiktok.com",
        SocialPlatform::LinkedIn => "www.linkedin.com",
        SocialPlatform::YouTube => "youtube.com",
        SocialPlatform::Facebook => "facebook.com",
    }
}

/// Fold host aliases onto the canonical host. Input is lowercase.
fn fold_host(host: &str) -> String {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.") {
        host = rest;
    }
    match host {
        "x.com" | "mobile.twitter.com" | "m.twitter.com" | "mobile.x.com" => {
            "twitter.com".to_string()
        }
        "m.facebook.com" | "mobile.facebook.com" | "fb.com" => "facebook.com".to_string(),
        "m.youtube.com" => "youtube.com".to_string(),
        "m.instagram.com" => "instagram.com".to_string(),
        "tiktok.com" | "m.tiktok.com" => "www.tiktok.com".to_string(),
        h if h == "linkedin.com" || h.ends_with(".linkedin.com") => {
            "www.linkedin.com".to_string()
        }
        other => other.to_string(),
    }
}

fn host_platform(host: &str) -> Option<SocialPlatform> {
    SocialPlatform::ALL
        .into_iter()
        .find(|p| canonical_host(*p) == host)
}

/// A platform identity: the canonical path prefix plus the account name.
struct Identity {
    prefix: &'static str,
    name: String,
}

fn identity(platform: SocialPlatform, segments: &[&str]) -> Option<Identity> {
    let first = *segments.first()?;

    match platform {
        SocialPlatform::Twitter => plain_identity(first, TWITTER_RESERVED, &TWITTER_NAME_RE),
        SocialPlatform::Instagram => {
            plain_identity(first, INSTAGRAM_RESERVED, &INSTAGRAM_NAME_RE)
        }
        SocialPlatform::Facebook => plain_identity(first, FACEBOOK_RESERVED, &SLUG_RE),
        SocialPlatform::TikTok => {
            let name = segments.iter().find_map(|s| s.strip_prefix('@'))?;
            TIKTOK_NAME_RE.is_match(name).then(|| Identity {
                prefix: "@",
                name: name.to_string(),
            })
        }
        SocialPlatform::LinkedIn => {
            let prefix = match first {
                "in" => "in/",
                "company" => "company/",
                "school" => "school/",
                _ => return None,
            };
            let name = *segments.get(1)?;
            SLUG_RE.is_match(name).then(|| Identity {
                prefix,
                name: name.to_string(),
            })
        }
        SocialPlatform::YouTube => {
            if let Some(handle) = first.strip_prefix('@') {
                return SLUG_RE.is_match(handle).then(|| Identity {
                    prefix: "@",
                    name: handle.to_string(),
                });
            }
            let prefix = match first {
                "channel" => "channel/",
                "c" => "c/",
                "user" => "user/",
                _ => return None,
            };
            let name = *segments.get(1)?;
            SLUG_RE.is_match(name).then(|| Identity {
                prefix,
                name: name.to_string(),
            })
        }
    }
}

/// Account name in the first path segment, unless that segment is reserved.
fn plain_identity(first: &str, reserved: &[&str], re: &Regex) -> Option<Identity> {
    let name = first.trim_start_matches('@');
    (!reserved.contains(&first) && re.is_match(name)).then(|| Identity {
        prefix: "",
        name: name.to_string(),
    })
}

/// Normalizes URLs against an injectable blocklist.
#[derive(Debug, Clone, Default)]
pub struct UrlNormalizer {
    blocklist: UrlBlocklist,
}

impl UrlNormalizer {
    pub fn new(blocklist: UrlBlocklist) -> Self {
        Self { blocklist }
    }

    /// Absolute lowercase `https://host/path` with no query, fragment, port or
    /// trailing slash on non-root paths. `None` for emails, non-http schemes,
    /// hostless or dotless hosts and blocklisted URLs.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) || EMAIL_RE.is_match(raw) {
            return None;
        }

        let lower = raw.to_lowercase();
        let with_scheme = if let Some((scheme, _)) = lower.split_once("://") {
            if scheme != "http" && scheme != "https" {
                return None;
            }
            lower.clone()
        } else if lower.starts_with("//") {
            format!("https:{lower}")
        } else {
            format!("https://{lower}")
        };

        let parsed = Url::parse(&with_scheme).ok()?;
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return None;
        }
        let domain = parsed.domain()?;
        let host = fold_host(domain.trim_end_matches('.'));
        if !host.contains('.') || self.blocklist.blocks_host(&host) {
            return None;
        }

        // Percent escapes come back uppercase.
        let path = parsed.path().trim_end_matches('/').to_lowercase();
        let normalized = if path.is_empty() {
            format!("https://{host}/")
        } else {
            format!("https://{host}{path}")
        };

        if let Some(platform) = host_platform(&host) {
            let segments = path_segments(&normalized);
            if let Some(id) = identity(platform, &segments) {
                if self.blocklist.blocks_handle(&id.name) {
                    return None;
                }
            }
        }

        Some(normalized)
    }

    /// Stable account name for `url` on `platform`, without any `@`. `None` when the
    /// URL is on another platform or does not point at a profile.
    pub fn extract_username(&self, url: &str, platform: SocialPlatform) -> Option<String> {
        self.identity(url, platform).map(|id| id.name)
    }

    /// Normalize, extract the account and rebuild the platform's single canonical form.
    pub fn canonical_profile_url(&self, url: &str, platform: SocialPlatform) -> Option<String> {
        let id = self.identity(url, platform)?;
        Some(format!(
            "https://{}/{}{}",
            canonical_host(platform),
            id.prefix,
            id.name
        ))
    }

    fn identity(&self, url: &str, platform: SocialPlatform) -> Option<Identity> {
        let normalized = self.normalize(url)?;
        let host = host_of(&normalized)?;
        if host_platform(host) != Some(platform) {
            return None;
        }
        identity(platform, &path_segments(&normalized))
    }
}

fn host_of(normalized: &str) -> Option<&str> {
    let rest = normalized.strip_prefix("https://")?;
    Some(rest.split('/').next().unwrap_or(rest))
}

fn path_segments(normalized: &str) -> Vec<&str> {
    normalized
        .strip_prefix("https://")
        .unwrap_or(normalized)
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty())
        .collect()
}

impl SocialPlatform {
    /// Platform of a social URL, detected from its host.
    pub fn from_url(url: &str) -> Option<SocialPlatform> {
        let normalized = DEFAULT.normalize(url)?;
        host_platform(host_of(&normalized)?)
    }
}

/// [`UrlNormalizer::normalize`] with the default blocklist.
pub fn normalize(url: &str) -> Option<String> {
    DEFAULT.normalize(url)
}

/// [`UrlNormalizer::extract_username`] with the default blocklist.
pub fn extract_username(url: &str, platform: SocialPlatform) -> Option<String> {
    DEFAULT.extract_username(url, platform)
}

/// [`UrlNormalizer::canonical_profile_url`] with the default blocklist.
pub fn canonical_profile_url(url: &str, platform: SocialPlatform) -> Option<String> {
    DEFAULT.canonical_profile_url(url, platform)
}

/// Whole-string email check, `mailto:` prefix allowed.
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// First email address embedded anywhere in `value`, lowercased.
pub fn find_email(value: &str) -> Option<String> {
    EMAIL_FIND_RE
        .find(value)
        .map(|m| m.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SocialPlatform::*;

    #[test]
    fn collapses_scheme_www_and_trailing_slash_variants() {
        let expected = Some("https://techshow.fm/about".to_string());
        for raw in [
            "http://techshow.fm/about",
            "https://www.techshow.fm/about/",
            "techshow.fm/about",
            "WWW.TechShow.fm/About?utm_source=x#top",
            "//techshow.fm/about",
        ] {
            assert_eq!(normalize(raw), expected, "input: {raw}");
        }
    }

    #[test]
    fn root_path_keeps_single_slash() {
        assert_eq!(normalize("techshow.fm"), Some("https://techshow.fm/".to_string()));
        assert_eq!(normalize("https://techshow.fm/"), Some("https://techshow.fm/".to_string()));
    }

    #[test]
    fn normalization_is_a_projection() {
        for raw in [
            "http://x.com/TechShow?s=20",
            "www.linkedin.com/in/jane-doe-123/",
            "tiktok.com/@techshow",
            "https://m.youtube.com/@TechShow/videos",
            "https://techshow.fm:8080/feed.xml",
            "https://techshow.fm/über",
            "https://techshow.fm/{ep}",
        ] {
            let once = normalize(raw).unwrap();
            assert_eq!(once, once.to_lowercase(), "input: {raw}");
            assert_eq!(normalize(&once), Some(once.clone()), "input: {raw}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize("host@techshow.fm"), None);
        assert_eq!(normalize("mailto:host@techshow.fm"), None);
        assert_eq!(normalize("https://host@techshow.fm"), None);
        assert_eq!(normalize("ftp://techshow.fm/file"), None);
        assert_eq!(normalize("javascript:alert(1)"), None);
        assert_eq!(normalize("localhost"), None);
        assert_eq!(normalize("not a url"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("https://"), None);
    }

    #[test]
    fn rejects_blocklisted_domains_and_handles() {
        assert_eq!(normalize("https://example.com/podcast"), None);
        assert_eq!(normalize("https://www.example.org"), None);
        assert_eq!(normalize("https://twitter.com/username"), None);
        assert_eq!(normalize("https://instagram.com/yourpodcast"), None);

        let permissive = UrlNormalizer::new(UrlBlocklist {
            domains: vec![],
            handles: vec![],
        });
        assert!(permissive.normalize("https://twitter.com/username").is_some());
    }

    #[test]
    fn folds_twitter_aliases() {
        for raw in [
            "https://x.com/techshow",
            "https://mobile.twitter.com/techshow",
            "https://www.twitter.com/TechShow/",
        ] {
            assert_eq!(
                canonical_profile_url(raw, Twitter),
                Some("https://twitter.com/techshow".to_string()),
                "input: {raw}"
            );
        }
    }

    #[test]
    fn linkedin_and_tiktok_keep_www() {
        assert_eq!(
            canonical_profile_url("linkedin.com/in/jane-doe", LinkedIn),
            Some("https://www.linkedin.com/in/jane-doe".to_string())
        );
        assert_eq!(
            canonical_profile_url("https://uk.linkedin.com/company/tech-show/about", LinkedIn),
            Some("https://www.linkedin.com/company/tech-show".to_string())
        );
        assert_eq!(
            canonical_profile_url("https://tiktok.com/@techshow/video/123", TikTok),
            Some("https://www.tiktok.com/@techshow".to_string())
        );
    }

    #[test]
    fn youtube_forms() {
        assert_eq!(
            canonical_profile_url("https://www.youtube.com/@TechShow/videos", YouTube),
            Some("https://youtube.com/@techshow".to_string())
        );
        assert_eq!(
            canonical_profile_url("https://youtube.com/channel/UC123abc", YouTube),
            Some("https://youtube.com/channel/uc123abc".to_string())
        );
        assert_eq!(canonical_profile_url("https://youtube.com/watch?v=abc", YouTube), None);
    }

    #[test]
    fn reserved_segments_are_not_usernames() {
        assert_eq!(extract_username("https://twitter.com/i/lists/1", Twitter), None);
        assert_eq!(extract_username("https://twitter.com/intent/follow", Twitter), None);
        assert_eq!(extract_username("https://instagram.com/p/abc123", Instagram), None);
        assert_eq!(extract_username("https://instagram.com/reel/abc", Instagram), None);
        assert_eq!(extract_username("https://facebook.com/groups/abc", Facebook), None);
        assert_eq!(extract_username("https://www.tiktok.com/discover", TikTok), None);
        assert_eq!(extract_username("https://www.linkedin.com/feed", LinkedIn), None);
    }

    #[test]
    fn usernames_per_platform() {
        assert_eq!(extract_username("twitter.com/TechShow", Twitter).as_deref(), Some("techshow"));
        assert_eq!(
            extract_username("instagram.com/tech.show_/", Instagram).as_deref(),
            Some("tech.show_")
        );
        assert_eq!(extract_username("tiktok.com/@tech.show", TikTok).as_deref(), Some("tech.show"));
        assert_eq!(
            extract_username("m.facebook.com/TechShowPod", Facebook).as_deref(),
            Some("techshowpod")
        );
    }

    #[test]
    fn platform_mismatch_yields_none() {
        assert_eq!(extract_username("https://instagram.com/techshow", Twitter), None);
        assert_eq!(canonical_profile_url("https://techshow.fm/twitter", Twitter), None);
    }

    #[test]
    fn twitter_usernames_longer_than_fifteen_are_rejected() {
        assert_eq!(extract_username("https://twitter.com/abcdefghijklmnop", Twitter), None);
    }

    #[test]
    fn detects_platform_from_host() {
        assert_eq!(SocialPlatform::from_url("x.com/techshow"), Some(Twitter));
        assert_eq!(SocialPlatform::from_url("https://www.tiktok.com/@a1"), Some(TikTok));
        assert_eq!(SocialPlatform::from_url("https://fb.com/techshow"), Some(Facebook));
        assert_eq!(SocialPlatform::from_url("https://techshow.fm"), None);
    }

    #[test]
    fn finds_embedded_emails() {
        assert!(is_email("Host@TechShow.fm"));
        assert!(is_email("mailto:host@techshow.fm"));
        assert!(!is_email("https://www.tiktok.com/@techshow"));
        assert_eq!(
            find_email("https://Host@TechShow.fm"),
            Some("host@techshow.fm".to_string())
        );
        assert_eq!(find_email("https://www.tiktok.com/@tech.show"), None);
    }
}
