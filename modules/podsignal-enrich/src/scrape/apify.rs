use anyhow::Result;
use async_trait::async_trait;

use apify_client::ApifyClient;

use crate::traits::ScrapeBackend;

/// Runs profile-scraper actors on Apify: start run, long-poll, fetch dataset items.
pub struct ApifyScrapeBackend {
    client: ApifyClient,
}

impl ApifyScrapeBackend {
    pub fn new(client: ApifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScrapeBackend for ApifyScrapeBackend {
    async fn run(&self, actor: &str, input: serde_json::Value) -> Result<Vec<serde_json::Value>> {
        let items: Vec<serde_json::Value> = self.client.run_actor(actor, &input).await?;
        Ok(items)
    }
}
