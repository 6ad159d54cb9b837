pub mod config;
pub mod error;
pub mod fields;
pub mod types;
pub mod urls;

pub use config::{
    load_config, AppConfig, ConfidenceBands, DiscoverySettings, EnrichmentConfig, RetryPolicy,
    ScoringPolicy, ScrapeSettings, UrlBlocklist,
};
pub use error::EnrichError;
pub use fields::{FieldKey, FieldKind, FieldSpec};
pub use types::*;
pub use urls::UrlNormalizer;
