//! Discovery orchestrator.
//!
//! For one podcast: seed what is already known, run one web search per missing
//! schema field (host names first, so host-scoped searches can use a real name),
//! then hand the accumulated evidence to the extraction model once.
//!
//! The orchestrator never merges. Its output is the raw extraction result plus a
//! record of what was searched, skipped as known, or cut by the deadline.

pub mod evidence;
pub mod host_names;
pub mod targets;

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use podsignal_common::{CanonicalProfile, DiscoverySettings, FieldKey, RetryPolicy};

use crate::extractor::DiscoveryResult;
use crate::retry::with_retry;
use crate::traits::{SearchResponse, StructuredExtractor, WebSearcher};

use evidence::EvidenceBuffer;
use host_names::extract_host_names;
use targets::{DiscoveryTarget, TARGETS};

pub(crate) const SYSTEM_PROMPT: &str = "\
You extract official contact and social profile information about a podcast from web \
search evidence.

Rules:
- Only use information that appears in the evidence. Never guess or construct URLs, \
handles or email addresses.
- If the evidence does not clearly support a field, return null for it.
- Prefer the podcast's own official accounts over network, guest, directory or fan pages. \
If several candidates appear, choose the most official one, and among equally official \
candidates the URL repeated most often across the evidence.
- host_names is a list containing every host's full name.
- host_linkedin_url and host_twitter_url belong to the primary host personally, not to the \
podcast.
- \"Known profile data\" is already verified. Repeat it unchanged or return null.";

/// What one discovery run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryOutcome {
    /// Raw extraction output. `None` when extraction was skipped, failed or empty.
    pub result: Option<DiscoveryResult>,
    pub searched: Vec<FieldKey>,
    pub known: Vec<FieldKey>,
    /// Targets never searched because the deadline passed.
    pub cut: Vec<FieldKey>,
    pub host_name: Option<String>,
    pub evidence: String,
}

pub struct DiscoveryOrchestrator {
    searcher: Arc<dyn WebSearcher>,
    extractor: Arc<dyn StructuredExtractor>,
    settings: DiscoverySettings,
    retry: RetryPolicy,
}

impl DiscoveryOrchestrator {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        extractor: Arc<dyn StructuredExtractor>,
        settings: DiscoverySettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            searcher,
            extractor,
            settings,
            retry,
        }
    }

    pub async fn discover(
        &self,
        profile: &CanonicalProfile,
        deadline: Option<Instant>,
    ) -> DiscoveryOutcome {
        let mut outcome = DiscoveryOutcome::default();
        let mut buffer = EvidenceBuffer::new();

        // Seed
        let mut seeded: Vec<(&str, String)> = Vec::new();
        for target in TARGETS {
            if let Some(value) = profile.value(target.key) {
                outcome.known.push(target.key);
                seeded.push((target.label(), value.display()));
            }
        }
        buffer.seed(&seeded);

        let unknown: Vec<&DiscoveryTarget> = TARGETS
            .iter()
            .filter(|t| !outcome.known.contains(&t.key))
            .collect();

        if unknown.is_empty() {
            info!(podcast = %profile.name, "Discovery: every schema field already known");
            outcome.evidence = buffer.render();
            return outcome;
        }

        let mut host_name = profile
            .names(FieldKey::HostNames)
            .and_then(|names| names.first().cloned());

        info!(
            podcast = %profile.name,
            known = outcome.known.len(),
            unknown = unknown.len(),
            "Discovery: starting searches"
        );

        for (i, target) in unknown.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                outcome.cut = unknown[i..].iter().map(|t| t.key).collect();
                warn!(
                    podcast = %profile.name,
                    cut = outcome.cut.len(),
                    "Discovery: deadline reached, extracting from partial evidence"
                );
                break;
            }
            if i > 0 {
                tokio::time::sleep(self.settings.inter_search_delay()).await;
            }

            let query = target.build_query(&profile.name, host_name.as_deref());
            outcome.searched.push(target.key);

            match self.search(&query).await {
                Ok(Some(response)) => {
                    if target.key == FieldKey::HostNames && host_name.is_none() {
                        host_name = bootstrap_host_name(&response);
                        if let Some(host) = &host_name {
                            info!(podcast = %profile.name, host = %host, "Discovery: host name found");
                        }
                    }
                    buffer.push_search(&query, &response, self.settings.max_snippets);
                }
                Ok(None) => {
                    debug!(query = %query, "Discovery: no results");
                    buffer.push_search(&query, &SearchResponse::default(), 0);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Discovery: search failed");
                    buffer.push_failure(&query, &format!("{e:#}"));
                }
            }
        }

        outcome.host_name = host_name;
        outcome.evidence = buffer.render();

        if outcome.searched.is_empty() {
            info!(podcast = %profile.name, "Discovery: nothing searched, skipping extraction");
            return outcome;
        }

        let user_prompt = format!("Podcast: {}\n\n{}", profile.name, outcome.evidence);
        let extracted = with_retry(&self.retry, "discovery extraction", || {
            self.extractor.extract(SYSTEM_PROMPT, &user_prompt)
        })
        .await;

        outcome.result = match extracted {
            Ok(Some(mut result)) => {
                for key in &outcome.known {
                    result.clear(*key);
                }
                (!result.is_empty()).then_some(result)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(podcast = %profile.name, error = %e, "Discovery: extraction failed");
                None
            }
        };

        info!(
            podcast = %profile.name,
            searched = outcome.searched.len(),
            found = outcome.result.as_ref().map_or(0, |r| r.entries().len()),
            "Discovery: complete"
        );
        outcome
    }

    async fn search(&self, query: &str) -> anyhow::Result<Option<SearchResponse>> {
        with_retry(&self.retry, "web search", || {
            self.searcher.search(
                query,
                self.settings.max_results,
                &self.settings.search_depth,
                self.settings.include_answer,
            )
        })
        .await
    }
}

/// First host name found in the answer, else in the result snippets in order.
fn bootstrap_host_name(response: &SearchResponse) -> Option<String> {
    if response.error.is_some() {
        return None;
    }
    response
        .answer
        .iter()
        .map(String::as_str)
        .chain(response.results.iter().map(|r| r.content.as_str()))
        .find_map(|text| extract_host_names(text).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockExtractor, MockSearcher};
    use crate::traits::SearchHit;
    use podsignal_common::{FieldSource, FieldValue};
    use std::time::Duration;

    fn settings() -> DiscoverySettings {
        DiscoverySettings {
            inter_search_delay_ms: 0,
            ..Default::default()
        }
    }

    fn orchestrator(searcher: MockSearcher, extractor: MockExtractor) -> DiscoveryOrchestrator {
        DiscoveryOrchestrator::new(
            Arc::new(searcher),
            Arc::new(extractor),
            settings(),
            RetryPolicy::immediate(),
        )
    }

    #[tokio::test]
    async fn known_fields_are_seeded_not_searched() {
        let searcher = MockSearcher::new();
        let extractor = MockExtractor::empty();
        let mut profile = CanonicalProfile::new("Tech Show");
        profile.offer(
            FieldKey::TwitterUrl,
            FieldValue::Text("https://twitter.com/techshow".into()),
            FieldSource::ApiPrimary,
            0.9,
        );

        let orch = DiscoveryOrchestrator::new(
            Arc::new(searcher.clone()),
            Arc::new(extractor.clone()),
            settings(),
            RetryPolicy::immediate(),
        );
        let outcome = orch.discover(&profile, None).await;

        assert_eq!(outcome.known, vec![FieldKey::TwitterUrl]);
        assert!(!outcome.searched.contains(&FieldKey::TwitterUrl));
        assert_eq!(outcome.searched.len(), TARGETS.len() - 1);
        assert!(searcher.queries().iter().all(|q| !q.contains("twitter") || q.contains("host")));
        let evidence = extractor.last_evidence().unwrap();
        assert!(evidence.contains("- Podcast Twitter URL: https://twitter.com/techshow"));
        let instructions = extractor.last_instructions().unwrap();
        assert!(instructions.contains("Never guess"));
        assert!(instructions.contains("most official"));
        assert!(instructions.contains("repeated most often"));
    }

    #[tokio::test]
    async fn host_name_drives_host_scoped_queries() {
        let searcher = MockSearcher::new().on_answer(
            "who hosts the Tech Show podcast",
            "The Tech Show is hosted by Jane Doe.",
        );
        let orch = orchestrator(searcher.clone(), MockExtractor::empty());
        let outcome = orch.discover(&CanonicalProfile::new("Tech Show"), None).await;

        assert_eq!(outcome.host_name.as_deref(), Some("Jane Doe"));
        let queries = searcher.queries();
        assert_eq!(queries[0], "who hosts the Tech Show podcast");
        assert!(queries.contains(&"Jane Doe Tech Show podcast host linkedin".to_string()));
        assert!(queries.contains(&"Jane Doe Tech Show podcast host twitter".to_string()));
    }

    #[tokio::test]
    async fn host_name_falls_back_to_snippets() {
        let searcher = MockSearcher::new().on_query(
            "who hosts",
            SearchResponse {
                answer: None,
                results: vec![SearchHit {
                    title: "About".into(),
                    content: "Hosted by Sam Lee, who also produces the show.".into(),
                    url: "https://techshow.fm/about".into(),
                }],
                error: None,
            },
        );
        let orch = orchestrator(searcher.clone(), MockExtractor::empty());
        let outcome = orch.discover(&CanonicalProfile::new("Tech Show"), None).await;
        assert_eq!(outcome.host_name.as_deref(), Some("Sam Lee"));
    }

    #[tokio::test]
    async fn without_host_name_uses_fallback_queries() {
        let searcher = MockSearcher::new();
        let orch = orchestrator(searcher.clone(), MockExtractor::empty());
        let outcome = orch.discover(&CanonicalProfile::new("Tech Show"), None).await;
        assert!(outcome.host_name.is_none());
        assert!(searcher
            .queries()
            .contains(&"Tech Show podcast host linkedin".to_string()));
    }

    #[tokio::test]
    async fn failed_search_is_recorded_and_loop_continues() {
        let searcher = MockSearcher::new().failing("instagram");
        let extractor = MockExtractor::empty();
        let orch = DiscoveryOrchestrator::new(
            Arc::new(searcher.clone()),
            Arc::new(extractor.clone()),
            settings(),
            RetryPolicy::immediate(),
        );
        let outcome = orch.discover(&CanonicalProfile::new("Tech Show"), None).await;

        assert_eq!(outcome.searched.len(), TARGETS.len());
        assert!(outcome
            .evidence
            .contains("Search Query: Tech Show podcast instagram\nSearch failed:"));
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn extraction_failure_means_no_result() {
        let orch = orchestrator(MockSearcher::new(), MockExtractor::failing());
        let outcome = orch.discover(&CanonicalProfile::new("Tech Show"), None).await;
        assert!(outcome.result.is_none());
        assert_eq!(outcome.searched.len(), TARGETS.len());
    }

    #[tokio::test]
    async fn known_fields_are_stripped_from_the_result() {
        let extractor = MockExtractor::returning(DiscoveryResult {
            twitter_url: Some("https://twitter.com/other".into()),
            instagram_url: Some("https://instagram.com/techshow".into()),
            ..Default::default()
        });
        let mut profile = CanonicalProfile::new("Tech Show");
        profile.offer(
            FieldKey::TwitterUrl,
            FieldValue::Text("https://twitter.com/techshow".into()),
            FieldSource::LlmDiscovery,
            0.6,
        );
        let orch = orchestrator(MockSearcher::new(), extractor);
        let result = orch.discover(&profile, None).await.result.unwrap();
        assert!(result.twitter_url.is_none());
        assert_eq!(result.instagram_url.as_deref(), Some("https://instagram.com/techshow"));
    }

    #[tokio::test]
    async fn expired_deadline_cuts_every_target() {
        let searcher = MockSearcher::new();
        let extractor = MockExtractor::empty();
        let orch = DiscoveryOrchestrator::new(
            Arc::new(searcher.clone()),
            Arc::new(extractor.clone()),
            settings(),
            RetryPolicy::immediate(),
        );
        let deadline = Instant::now() - Duration::from_millis(1);
        let outcome = orch
            .discover(&CanonicalProfile::new("Tech Show"), Some(deadline))
            .await;

        assert!(outcome.searched.is_empty());
        assert_eq!(outcome.cut.len(), TARGETS.len());
        assert!(searcher.queries().is_empty());
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn fully_known_profile_skips_everything() {
        let searcher = MockSearcher::new();
        let extractor = MockExtractor::empty();
        let mut profile = CanonicalProfile::new("Tech Show");
        for target in TARGETS {
            let value = match target.key {
                FieldKey::HostNames => FieldValue::Names(vec!["Jane Doe".into()]),
                FieldKey::ContactEmail => FieldValue::Text("hi@techshow.fm".into()),
                _ => FieldValue::Text("https://techshow.fm".into()),
            };
            profile.offer(target.key, value, FieldSource::ApiPrimary, 0.9);
        }
        let orch = DiscoveryOrchestrator::new(
            Arc::new(searcher.clone()),
            Arc::new(extractor.clone()),
            settings(),
            RetryPolicy::immediate(),
        );
        let outcome = orch.discover(&profile, None).await;
        assert_eq!(outcome.known.len(), TARGETS.len());
        assert!(searcher.queries().is_empty());
        assert_eq!(extractor.calls(), 0);
    }
}
