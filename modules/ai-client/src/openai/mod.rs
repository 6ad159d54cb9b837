mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use crate::error::{AiError, Result};
use crate::util::strip_code_blocks;

use client::{OpenAiClient, OPENAI_API_URL};
use types::SchemaCompletionRequest;

/// OpenAI chat model used for strict-schema extraction.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fill `T`'s strict schema from the prompts and deserialize the reply.
    pub async fn extract<T: StructuredOutput>(&self, system_prompt: &str, user_prompt: &str) -> Result<T> {
        let name = schema_name::<T>();
        let request = SchemaCompletionRequest::new(
            &self.model,
            system_prompt,
            user_prompt,
            &name,
            T::openai_schema(),
        );

        let reply = OpenAiClient::new(&self.api_key, OPENAI_API_URL)
            .complete(&request)
            .await?;

        serde_json::from_str(strip_code_blocks(&reply))
            .map_err(|e| AiError::Parse(format!("Failed to deserialize response: {e}")))
    }
}

/// OpenAI schema names allow only `[a-zA-Z0-9_-]`.
fn schema_name<T: StructuredOutput>() -> String {
    let name: String = T::type_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "structured_response".to_string()
    } else {
        name
    }
}
