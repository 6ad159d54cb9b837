use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an actor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    /// FAILED, ABORTED or TIMED-OUT.
    Terminal,
}

impl RunData {
    pub fn run_status(&self) -> RunStatus {
        match self.status.as_str() {
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" | "ABORTED" | "TIMED-OUT" => RunStatus::Terminal,
            _ => RunStatus::Running,
        }
    }
}

/// Input for apidojo/twitter-user-scraper. Handles without `@`.
#[derive(Debug, Clone, Serialize)]
pub struct TwitterProfileInput {
    #[serde(rename = "twitterHandles")]
    pub twitter_handles: Vec<String>,
    #[serde(rename = "getFollowers")]
    pub get_followers: bool,
    #[serde(rename = "getFollowing")]
    pub get_following: bool,
    #[serde(rename = "maxItems")]
    pub max_items: u32,
}

/// Input for apify/instagram-profile-scraper.
#[derive(Debug, Clone, Serialize)]
pub struct InstagramProfileInput {
    pub usernames: Vec<String>,
}

/// Input for dev_fusion/linkedin-profile-scraper.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedInProfileInput {
    #[serde(rename = "profileUrls")]
    pub profile_urls: Vec<String>,
}

/// Input for clockworks/tiktok-profile-scraper. One profile per run; we only need the
/// author metadata attached to the first video.
#[derive(Debug, Clone, Serialize)]
pub struct TikTokProfileInput {
    pub profiles: Vec<String>,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: u32,
    #[serde(rename = "shouldDownloadVideos")]
    pub should_download_videos: bool,
}
