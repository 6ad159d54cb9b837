pub mod discovery;
pub mod extractor;
pub mod feed;
pub mod merge;
pub mod pipeline;
pub mod retry;
pub mod scoring;
pub mod scrape;
pub mod search;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use discovery::{DiscoveryOrchestrator, DiscoveryOutcome};
pub use extractor::{DiscoveryResult, OpenAiExtractor};
pub use feed::{FeedMetadata, HttpFeedFetcher};
pub use merge::{needs_social_refresh, ConfidenceMerger};
pub use pipeline::{EnrichOptions, EnrichReport, Enricher};
pub use scoring::QualityScorer;
pub use scrape::{ApifyScrapeBackend, NoopScrapeBackend, ScrapeResults, SocialScrapeAdapter};
pub use search::TavilySearcher;
