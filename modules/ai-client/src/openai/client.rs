use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use super::types::{Completion, SchemaCompletionRequest};
use crate::error::{AiError, Result};

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Thin HTTP layer over `/chat/completions`.
pub(crate) struct OpenAiClient<'a> {
    api_key: &'a str,
    base_url: &'a str,
    http: reqwest::Client,
}

impl<'a> OpenAiClient<'a> {
    pub fn new(api_key: &'a str, base_url: &'a str) -> Self {
        Self {
            api_key,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| AiError::Config(format!("Invalid API key header: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Raw JSON text of the first choice. Refusals, missing content and truncated
    /// replies are errors.
    pub async fn complete(&self, request: &SchemaCompletionRequest<'_>) -> Result<String> {
        debug!(model = request.model, "OpenAI schema completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let completion: Completion = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse)?;

        if let Some(refusal) = choice.message.refusal {
            warn!(%refusal, "Model refused structured output");
            return Err(AiError::EmptyResponse);
        }
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(AiError::Parse("Reply truncated at the token limit".into()));
        }

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
