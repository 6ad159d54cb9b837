//! Minimal Apify client: run a profile-scraper actor and collect its dataset.

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    InstagramProfileInput, LinkedInProfileInput, RunData, RunStatus, TikTokProfileInput,
    TwitterProfileInput,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Seconds the server holds each poll open while a run is in progress.
const WAIT_FOR_FINISH_SECS: u32 = 60;

/// Polls before giving up on a run that never finishes.
const DEFAULT_MAX_POLLS: u32 = 10;

pub struct ApifyClient {
    http: reqwest::Client,
    token: String,
    max_polls: u32,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls.max(1);
        self
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Start a run of `actor` (an id or `owner~name`) and return immediately.
    pub async fn start_run<I: Serialize + ?Sized>(&self, actor: &str, input: &I) -> Result<RunData> {
        let resp = self
            .http
            .post(format!("{BASE_URL}/acts/{actor}/runs"))
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let envelope: ApiResponse<RunData> = Self::read(resp).await?;
        Ok(envelope.data)
    }

    /// Long-poll until the run leaves the running state. A run that is still going
    /// after `max_polls` polls is reported as `TIMED-OUT`.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        for poll in 1..=self.max_polls {
            let resp = self
                .http
                .get(format!("{BASE_URL}/actor-runs/{run_id}"))
                .query(&[("waitForFinish", WAIT_FOR_FINISH_SECS)])
                .bearer_auth(&self.token)
                .send()
                .await?;
            let run = Self::read::<ApiResponse<RunData>>(resp).await?.data;

            match run.run_status() {
                RunStatus::Succeeded => return Ok(run),
                RunStatus::Terminal => return Err(ApifyError::RunFailed(run.status)),
                RunStatus::Running => {
                    debug!(run_id, poll, status = %run.status, "Run still in progress");
                }
            }
        }
        Err(ApifyError::RunFailed("TIMED-OUT".to_string()))
    }

    /// Items of a dataset, cleaned of empty fields.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/datasets/{dataset_id}/items"))
            .query(&[("format", "json"), ("clean", "true")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::read(resp).await
    }

    /// Start, wait, fetch.
    pub async fn run_actor<I, T>(&self, actor: &str, input: &I) -> Result<Vec<T>>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let run = self.start_run(actor, input).await?;
        info!(actor, run_id = %run.id, "Apify run started");

        let finished = self.wait_for_run(&run.id).await?;
        let items: Vec<T> = self.get_dataset_items(&finished.default_dataset_id).await?;

        info!(
            actor,
            run_id = %finished.id,
            items = items.len(),
            "Apify run finished"
        );
        Ok(items)
    }
}
