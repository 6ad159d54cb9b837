//! Maps raw scraper items onto [`PlatformRecord`] and correlates them with the
//! requested profile URLs.
//!
//! Each actor names the same facts differently, and the names drift between actor
//! versions, so every fact has an ordered list of candidate keys. Dotted keys walk
//! into nested objects (`authorMeta.fans`).

use serde_json::Value;

use podsignal_common::{PlatformRecord, SocialPlatform, UrlNormalizer};

use super::cast::{to_bool, to_count, to_text};

/// A key holding a bare handle, rebuilt into a URL with `template` (`{}` = handle).
struct HandleKey {
    path: &'static str,
    template: &'static str,
}

struct FieldPaths {
    urls: &'static [&'static str],
    handles: &'static [HandleKey],
    display_name: &'static [&'static str],
    bio: &'static [&'static str],
    followers: &'static [&'static str],
    following: &'static [&'static str],
    verified: &'static [&'static str],
    posts: &'static [&'static str],
}

const TWITTER: FieldPaths = FieldPaths {
    urls: &["url", "twitterUrl", "profileUrl", "author.url"],
    handles: &[
        HandleKey { path: "userName", template: "https://twitter.com/{}" },
        HandleKey { path: "screen_name", template: "https://twitter.com/{}" },
        HandleKey { path: "username", template: "https://twitter.com/{}" },
        HandleKey { path: "author.userName", template: "https://twitter.com/{}" },
    ],
    display_name: &["name", "displayName", "author.name"],
    bio: &["description", "bio", "author.description"],
    followers: &["followers", "followersCount", "followers_count", "author.followers"],
    following: &["following", "followingCount", "friends_count", "author.following"],
    verified: &["isBlueVerified", "isVerified", "verified"],
    posts: &["statusesCount", "statuses_count", "tweetsCount"],
};

const INSTAGRAM: FieldPaths = FieldPaths {
    urls: &["url", "inputUrl", "profileUrl"],
    handles: &[HandleKey { path: "username", template: "https://instagram.com/{}" }],
    display_name: &["fullName", "full_name", "name"],
    bio: &["biography", "bio"],
    followers: &["followersCount", "followers", "edge_followed_by.count"],
    following: &["followsCount", "followingCount", "edge_follow.count"],
    verified: &["verified", "isVerified", "is_verified"],
    posts: &["postsCount", "mediaCount"],
};

const LINKEDIN: FieldPaths = FieldPaths {
    urls: &["linkedinUrl", "profileUrl", "url", "inputUrl", "companyUrl"],
    handles: &[
        HandleKey { path: "publicIdentifier", template: "https://www.linkedin.com/in/{}" },
        HandleKey { path: "universalName", template: "https://www.linkedin.com/company/{}" },
    ],
    display_name: &["fullName", "name", "companyName"],
    bio: &["headline", "about", "description", "tagline"],
    followers: &["followers", "followerCount", "followersCount"],
    following: &["connections", "connectionsCount"],
    verified: &["isVerified", "verified"],
    posts: &["postsCount"],
};

const TIKTOK: FieldPaths = FieldPaths {
    urls: &["authorMeta.profileUrl", "profileUrl", "authorUrl"],
    handles: &[
        HandleKey { path: "authorMeta.name", template: "https://www.tiktok.com/@{}" },
        HandleKey { path: "uniqueId", template: "https://www.tiktok.com/@{}" },
        HandleKey { path: "username", template: "https://www.tiktok.com/@{}" },
    ],
    display_name: &["authorMeta.nickName", "nickname", "nickName"],
    bio: &["authorMeta.signature", "signature"],
    followers: &["authorMeta.fans", "fans", "followerCount"],
    following: &["authorMeta.following", "followingCount"],
    verified: &["authorMeta.verified", "verified"],
    posts: &["authorMeta.video", "videoCount"],
};

fn paths(platform: SocialPlatform) -> Option<&'static FieldPaths> {
    match platform {
        SocialPlatform::Twitter => Some(&TWITTER),
        SocialPlatform::Instagram => Some(&INSTAGRAM),
        SocialPlatform::LinkedIn => Some(&LINKEDIN),
        SocialPlatform::TikTok => Some(&TIKTOK),
        SocialPlatform::YouTube | SocialPlatform::Facebook => None,
    }
}

/// Walk a dotted path through nested objects. JSON null counts as absent.
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    (!current.is_null()).then_some(current)
}

fn first<T>(item: &Value, keys: &[&str], cast: impl Fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter().find_map(|k| lookup(item, k).and_then(&cast))
}

/// Canonical profile URL this item describes, if any URL-like or handle field
/// resolves to one on `platform`.
pub fn identify(
    item: &Value,
    platform: SocialPlatform,
    normalizer: &UrlNormalizer,
) -> Option<String> {
    let paths = paths(platform)?;

    let from_url = paths.urls.iter().find_map(|k| {
        let raw = lookup(item, k)?.as_str()?;
        normalizer.canonical_profile_url(raw, platform)
    });
    if from_url.is_some() {
        return from_url;
    }

    paths.handles.iter().find_map(|h| {
        let handle = lookup(item, h.path)?.as_str()?.trim().trim_start_matches('@');
        if handle.is_empty() {
            return None;
        }
        normalizer.canonical_profile_url(&h.template.replace("{}", handle), platform)
    })
}

/// Whether the item carries any profile data at all (error rows do not).
pub fn has_profile_data(item: &Value, platform: SocialPlatform) -> bool {
    let Some(paths) = paths(platform) else {
        return false;
    };
    paths
        .followers
        .iter()
        .chain(paths.display_name)
        .chain(paths.bio)
        .any(|k| lookup(item, k).is_some())
}

/// Map one item onto a record for `profile_url`.
pub fn to_record(item: &Value, platform: SocialPlatform, profile_url: String) -> PlatformRecord {
    let Some(paths) = paths(platform) else {
        return PlatformRecord {
            platform,
            profile_url,
            display_name: None,
            bio: None,
            followers: None,
            following: None,
            verified: None,
            post_count: None,
        };
    };

    PlatformRecord {
        platform,
        profile_url,
        display_name: first(item, paths.display_name, to_text),
        bio: first(item, paths.bio, to_text),
        followers: first(item, paths.followers, to_count),
        following: first(item, paths.following, to_count),
        verified: first(item, paths.verified, to_bool),
        post_count: first(item, paths.posts, to_count),
    }
}
