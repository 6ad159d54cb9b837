// RSS/Atom feed reader.
// Produces the feed-level facts the merger consumes at the rss_feed band.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use podsignal_common::urls::find_email;
use podsignal_common::RetryPolicy;

use crate::retry::with_retry;
use crate::traits::FeedFetcher;

static ITUNES_OWNER_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<itunes:owner>.*?<itunes:email>\s*([^<\s]+)\s*</itunes:email>")
        .expect("valid itunes owner regex")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub author: Option<String>,
    pub owner_email: Option<String>,
    pub first_published: Option<DateTime<Utc>>,
    pub last_published: Option<DateTime<Utc>>,
    pub episode_count: Option<u64>,
    /// (last - first) / (episodes - 1), in days.
    pub avg_interval_days: Option<f64>,
}

/// Parse an RSS/Atom/JSON feed body.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMetadata> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    let mut dates: Vec<DateTime<Utc>> = feed
        .entries
        .iter()
        .filter_map(|entry| entry.published.or(entry.updated))
        .map(|dt| dt.with_timezone(&Utc))
        .collect();
    dates.sort();

    let first_published = dates.first().copied();
    let last_published = dates.last().copied();
    let episode_count = (!feed.entries.is_empty()).then_some(feed.entries.len() as u64);

    let avg_interval_days = match (first_published, last_published) {
        (Some(first), Some(last)) if dates.len() >= 2 => {
            let span_days = (last - first).num_seconds() as f64 / 86_400.0;
            Some(span_days / (dates.len() - 1) as f64)
        }
        _ => None,
    };

    // feed-rs does not surface <itunes:owner>, so read it from the raw document.
    let raw = String::from_utf8_lossy(bytes);
    let owner_email = ITUNES_OWNER_EMAIL
        .captures(&raw)
        .and_then(|c| c.get(1))
        .and_then(|m| find_email(m.as_str()))
        .or_else(|| {
            feed.authors
                .iter()
                .chain(feed.contributors.iter())
                .find_map(|p| p.email.as_deref().and_then(find_email).or_else(|| find_email(&p.name)))
        });

    let author = feed
        .authors
        .first()
        .map(|p| p.name.trim().to_string())
        .filter(|n| !n.is_empty() && find_email(n).is_none());

    Ok(FeedMetadata {
        title: feed.title.map(|t| t.content.trim().to_string()),
        description: feed
            .description
            .map(|t| t.content.trim().to_string())
            .filter(|d| !d.is_empty()),
        language: feed.language.map(|l| l.trim().to_lowercase()),
        author,
        owner_email,
        first_published,
        last_published,
        episode_count,
        avg_interval_days,
    })
}

/// Fetch (with retry) and parse. Parse failures are not retried.
pub async fn read_feed(
    fetcher: &dyn FeedFetcher,
    url: &str,
    retry: &RetryPolicy,
) -> Result<FeedMetadata> {
    let bytes = with_retry(retry, "rss feed", || fetcher.fetch(url)).await?;
    let meta = parse_feed(&bytes).with_context(|| format!("Feed at {url}"))?;
    info!(url, episodes = meta.episode_count.unwrap_or(0), "feed: parsed successfully");
    Ok(meta)
}

/// HTTP feed fetcher.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build RSS HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", "podsignal/0.1")
            .send()
            .await
            .context("RSS feed fetch failed")?
            .error_for_status()
            .context("RSS feed fetch rejected")?;

        let bytes = resp.bytes().await.context("Failed to read RSS feed body")?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>The Tech Show</title>
    <description>Weekly conversations about technology.</description>
    <language>en-US</language>
    <itunes:owner>
      <itunes:name>Tech Show Media</itunes:name>
      <itunes:email>Owner@TechShow.fm</itunes:email>
    </itunes:owner>
    <item>
      <title>Episode 3</title>
      <guid>ep3</guid>
      <pubDate>Mon, 15 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Episode 2</title>
      <guid>ep2</guid>
      <pubDate>Mon, 08 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Episode 1</title>
      <guid>ep1</guid>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_channel_facts() {
        let meta = parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(meta.title.as_deref(), Some("The Tech Show"));
        assert_eq!(meta.language.as_deref(), Some("en-us"));
        assert_eq!(meta.owner_email.as_deref(), Some("owner@techshow.fm"));
        assert_eq!(meta.episode_count, Some(3));
        assert_eq!(
            meta.first_published,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            meta.last_published,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );
        assert!((meta.avg_interval_days.unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn single_episode_has_no_interval() {
        let feed = r#"<rss version="2.0"><channel><title>Solo</title>
            <managingEditor>host@solo.fm (Solo Host)</managingEditor>
            <item><guid>1</guid><pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate></item>
            </channel></rss>"#;
        let meta = parse_feed(feed.as_bytes()).unwrap();
        assert_eq!(meta.episode_count, Some(1));
        assert!(meta.avg_interval_days.is_none());
        assert_eq!(meta.first_published, meta.last_published);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_feed(b"<html><body>not a feed</body></html>").is_err());
    }
}
