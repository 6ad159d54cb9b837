use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ai_client::{AiError, OpenAi};
use podsignal_common::{FieldKey, FieldValue};

use crate::traits::StructuredExtractor;

/// Fixed discovery schema. Property names are field-table names so results map onto
/// profile fields without translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiscoveryResult {
    /// The podcast's own official website. Not a directory, network or platform page.
    pub website_url: Option<String>,
    /// Public contact email for the podcast or its booking team.
    pub contact_email: Option<String>,
    /// Official Twitter/X profile URL of the podcast itself.
    pub twitter_url: Option<String>,
    /// Official Instagram profile URL of the podcast itself.
    pub instagram_url: Option<String>,
    /// Official TikTok profile URL of the podcast itself.
    pub tiktok_url: Option<String>,
    /// Official LinkedIn company or showcase page URL of the podcast.
    pub linkedin_url: Option<String>,
    /// Official YouTube channel URL of the podcast.
    pub youtube_url: Option<String>,
    /// Official Facebook page URL of the podcast.
    pub facebook_url: Option<String>,
    /// Full names of every host of the podcast.
    pub host_names: Option<Vec<String>>,
    /// Personal LinkedIn profile URL of the primary host.
    pub host_linkedin_url: Option<String>,
    /// Personal Twitter/X profile URL of the primary host.
    pub host_twitter_url: Option<String>,
}

impl DiscoveryResult {
    /// Non-null values keyed by profile field.
    pub fn entries(&self) -> Vec<(FieldKey, FieldValue)> {
        use FieldKey as K;

        let text = |key: K, v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (key, FieldValue::Text(s.to_string())))
        };

        let names = self.host_names.as_ref().and_then(|names| {
            let mut cleaned: Vec<String> = Vec::new();
            for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
                if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                    cleaned.push(name.to_string());
                }
            }
            (!cleaned.is_empty()).then(|| (K::HostNames, FieldValue::Names(cleaned)))
        });

        [
            text(K::WebsiteUrl, &self.website_url),
            text(K::ContactEmail, &self.contact_email),
            text(K::TwitterUrl, &self.twitter_url),
            text(K::InstagramUrl, &self.instagram_url),
            text(K::TiktokUrl, &self.tiktok_url),
            text(K::LinkedinUrl, &self.linkedin_url),
            text(K::YoutubeUrl, &self.youtube_url),
            text(K::FacebookUrl, &self.facebook_url),
            names,
            text(K::HostLinkedinUrl, &self.host_linkedin_url),
            text(K::HostTwitterUrl, &self.host_twitter_url),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Null out one schema field. Keys outside the schema are ignored.
    pub fn clear(&mut self, key: FieldKey) {
        use FieldKey as K;
        match key {
            K::WebsiteUrl => self.website_url = None,
            K::ContactEmail => self.contact_email = None,
            K::TwitterUrl => self.twitter_url = None,
            K::InstagramUrl => self.instagram_url = None,
            K::TiktokUrl => self.tiktok_url = None,
            K::LinkedinUrl => self.linkedin_url = None,
            K::YoutubeUrl => self.youtube_url = None,
            K::FacebookUrl => self.facebook_url = None,
            K::HostNames => self.host_names = None,
            K::HostLinkedinUrl => self.host_linkedin_url = None,
            K::HostTwitterUrl => self.host_twitter_url = None,
            _ => {}
        }
    }
}

/// Structured extraction over OpenAI strict json_schema output.
pub struct OpenAiExtractor {
    client: OpenAi,
}

impl OpenAiExtractor {
    pub fn new(client: OpenAi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StructuredExtractor for OpenAiExtractor {
    async fn extract(
        &self,
        instructions: &str,
        evidence: &str,
    ) -> Result<Option<DiscoveryResult>> {
        info!(model = self.client.model(), evidence_len = evidence.len(), "Discovery extraction");

        match self.client.extract::<DiscoveryResult>(instructions, evidence).await {
            Ok(result) if result.is_empty() => {
                debug!("Extraction returned an all-null result");
                Ok(None)
            }
            Ok(result) => Ok(Some(result)),
            Err(AiError::EmptyResponse) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::StructuredOutput;

    #[test]
    fn schema_properties_are_profile_fields() {
        let schema = DiscoveryResult::openai_schema();
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), 11);
        for name in props.keys() {
            assert!(
                FieldKey::from_name(name).is_some(),
                "schema property {name} is not a profile field"
            );
        }
    }

    #[test]
    fn schema_is_strict() {
        let schema = DiscoveryResult::openai_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"].as_array().unwrap().len(), 11);
    }

    #[test]
    fn entries_skip_blanks_and_dedupe_names() {
        let result = DiscoveryResult {
            website_url: Some("  ".into()),
            twitter_url: Some("https://twitter.com/techshow".into()),
            host_names: Some(vec!["Jane Doe".into(), "jane doe".into(), "".into()]),
            ..Default::default()
        };
        let entries = result.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&(
            FieldKey::HostNames,
            FieldValue::Names(vec!["Jane Doe".into()])
        )));
    }

    #[test]
    fn all_null_result_is_empty() {
        assert!(DiscoveryResult::default().is_empty());
        let names_only_blank = DiscoveryResult {
            host_names: Some(vec![" ".into()]),
            ..Default::default()
        };
        assert!(names_only_blank.is_empty());
    }
}
