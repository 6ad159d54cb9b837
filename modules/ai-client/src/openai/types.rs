//! Wire shapes for chat completions constrained to a strict JSON schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct SchemaCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: [PromptMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat<'a>,
}

impl<'a> SchemaCompletionRequest<'a> {
    pub fn new(
        model: &'a str,
        system: &'a str,
        user: &'a str,
        schema_name: &'a str,
        schema: serde_json::Value,
    ) -> Self {
        Self {
            model,
            messages: [
                PromptMessage {
                    role: "system",
                    content: system,
                },
                PromptMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: supports_temperature(model).then_some(0.0),
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: SchemaSpec {
                    name: schema_name,
                    strict: true,
                    schema,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub json_schema: SchemaSpec<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SchemaSpec<'a> {
    pub name: &'a str,
    pub strict: bool,
    pub schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Completion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: ReplyMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// Set when the model declines a strict-schema request.
    #[serde(default)]
    pub refusal: Option<String>,
}

/// Reasoning models reject an explicit temperature.
pub(crate) fn supports_temperature(model: &str) -> bool {
    !["o1", "o3", "o4", "gpt-5"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}
