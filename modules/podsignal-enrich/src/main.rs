use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use apify_client::ApifyClient;
use podsignal_common::{
    load_config, AppConfig, CanonicalProfile, EnrichError, EnrichmentConfig, FieldKey, ProfileRecord,
};
use podsignal_enrich::traits::ScrapeBackend;
use podsignal_enrich::{
    ApifyScrapeBackend, EnrichOptions, Enricher, HttpFeedFetcher, NoopScrapeBackend,
    OpenAiExtractor, TavilySearcher,
};

#[derive(Parser)]
#[command(name = "podsignal-enrich", about = "Enrich one podcast profile and score it")]
struct Cli {
    /// Profile record as JSON
    #[arg(long)]
    input: PathBuf,

    /// Comma-separated field names holding human overrides
    #[arg(long, value_delimiter = ',')]
    manual: Vec<String>,

    /// Tunables TOML file (falls back to PODSIGNAL_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time budget for discovery searches, in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    #[arg(long)]
    skip_discovery: bool,

    #[arg(long)]
    skip_scrape: bool,

    #[arg(long)]
    skip_feed: bool,

    /// Print the full per-source report instead of profile and score
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("podsignal=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = AppConfig::from_env()?;

    let config_path = cli.config.clone().or_else(|| app.config_path.as_ref().map(PathBuf::from));
    let mut config = match &config_path {
        Some(path) => load_config(path)?,
        None => EnrichmentConfig::default(),
    };
    if let Some(model) = &app.extraction_model {
        config.discovery.extraction_model = model.clone();
    }

    let manual = cli
        .manual
        .iter()
        .map(|name| {
            let name = name.trim();
            FieldKey::from_name(name).ok_or_else(|| EnrichError::UnknownField(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let raw = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let record: ProfileRecord = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse profile record {}", cli.input.display()))?;

    let searcher = Arc::new(TavilySearcher::new(&app.tavily_api_key)?);
    let extractor = Arc::new(OpenAiExtractor::new(OpenAi::new(
        app.openai_api_key.clone(),
        config.discovery.extraction_model.clone(),
    )));
    let backend: Arc<dyn ScrapeBackend> = match &app.apify_api_key {
        Some(key) => Arc::new(ApifyScrapeBackend::new(
            ApifyClient::new(key.clone()).with_max_polls(config.scrape.max_polls),
        )),
        None => {
            info!("APIFY_API_KEY not set, social scraping disabled");
            Arc::new(NoopScrapeBackend)
        }
    };
    let feeds = Arc::new(HttpFeedFetcher::new()?);
    let initial = CanonicalProfile::from_record(record, &manual, &config.bands);

    let enricher = Enricher::new(searcher, extractor, backend, feeds, config).with_options(
        EnrichOptions {
            skip_discovery: cli.skip_discovery,
            skip_scrape: cli.skip_scrape,
            skip_feed: cli.skip_feed,
            deadline: cli.deadline_secs.map(Duration::from_secs),
        },
    );

    let report = enricher.enrich_report(initial).await?;
    let score = enricher.score(&report.profile);
    info!(podcast = %report.profile.name, composite = score.composite, "Scored");

    let output = if cli.report {
        serde_json::json!({ "report": report, "score": score })
    } else {
        serde_json::json!({ "profile": report.profile, "score": score })
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
