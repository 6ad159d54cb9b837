use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::traits::{SearchHit, SearchResponse, WebSearcher};

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Tavily web search adapter.
pub struct TavilySearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilySearcher {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Tavily HTTP client")?;
        Ok(Self {
            api_key: api_key.to_string(),
            client,
        })
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        depth: &str,
        want_answer: bool,
    ) -> Result<Option<SearchResponse>> {
        info!(query, max_results, "Tavily search");

        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: depth,
            include_answer: want_answer,
        };

        let resp = self
            .client
            .post(TAVILY_URL)
            .json(&request)
            .send()
            .await
            .context("Tavily API request failed")?;

        let status = resp.status();
        if status.as_u16() == 429 || status.is_server_error() {
            // Transient; surfaces as a reqwest status error so the retry layer sees it.
            resp.error_for_status_ref()
                .context("Tavily API transient error")?;
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(query, status = status.as_u16(), "Tavily search rejected");
            return Ok(Some(SearchResponse {
                error: Some(format!("status {}: {}", status.as_u16(), body)),
                ..Default::default()
            }));
        }

        let data: TavilySearchResponse = resp
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        let response = SearchResponse {
            answer: data.answer.filter(|a| !a.trim().is_empty()),
            results: data
                .results
                .into_iter()
                .map(|r| SearchHit {
                    title: r.title,
                    content: r.content,
                    url: r.url,
                })
                .collect(),
            error: None,
        };

        info!(query, count = response.results.len(), "Tavily search complete");
        if response.answer.is_none() && response.results.is_empty() {
            return Ok(None);
        }
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_tavily_field_names() {
        let request = TavilySearchRequest {
            api_key: "tvly-key",
            query: "Tech Show podcast host",
            max_results: 5,
            search_depth: "advanced",
            include_answer: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["search_depth"], "advanced");
        assert_eq!(json["include_answer"], true);
        assert_eq!(json["max_results"], 5);
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let data: TavilySearchResponse =
            serde_json::from_str(r#"{"results": [{"url": "https://techshow.fm"}]}"#).unwrap();
        assert!(data.answer.is_none());
        assert_eq!(data.results[0].url, "https://techshow.fm");
        assert_eq!(data.results[0].title, "");
    }
}
