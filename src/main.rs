use anyhow::Context;
use clap::Parser;
use news_relay::{
    EnrichmentPipeline, Fetcher, FrequencySummarizer, HttpTranslator, JsonSetStore, LinkStore,
    NewsRelay, RelayConfig, ScriptDetector, Source, TelegramNotifier,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "news-relay", about = "Polls RSS feeds and relays enriched items to a chat")]
struct Args {
    /// Path to the JSON source registry ([{"name", "url", "fallback_url"?}, ...])
    #[arg(long, default_value = "sources.json")]
    sources: PathBuf,

    /// Destination chat identifier
    #[arg(long)]
    chat_id: String,

    /// Directory holding the persisted link sets
    #[arg(long, default_value = "state")]
    state_dir: PathBuf,

    /// Seconds between batches; omit to run a single batch and exit
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Maximum items examined per source per batch
    #[arg(long, default_value_t = 3)]
    items_per_source: usize,

    /// Keep only the newest N seen links after each batch
    #[arg(long)]
    seen_links_cap: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let token = env::var("TELEGRAM_BOT_TOKEN")
        .context("TELEGRAM_BOT_TOKEN must be set")?;
    let translate_url = env::var("TRANSLATE_API_URL")
        .unwrap_or_else(|_| "https://libretranslate.com".to_string());

    let sources_raw = std::fs::read_to_string(&args.sources)
        .with_context(|| format!("reading source registry {}", args.sources.display()))?;
    let sources: Vec<Source> = serde_json::from_str::<Vec<Source>>(&sources_raw)
        .context("parsing source registry")?
        .into_iter()
        .filter(|source| match url::Url::parse(&source.url) {
            Ok(_) => true,
            Err(e) => {
                error!("Dropping source '{}' with invalid URL: {}", source.name, e);
                false
            }
        })
        .collect();
    info!("Loaded {} sources from {}", sources.len(), args.sources.display());

    let config = RelayConfig {
        items_per_source: args.items_per_source,
        seen_links_cap: args.seen_links_cap,
        ..RelayConfig::default()
    };

    let fetcher = Arc::new(Fetcher::new(&config)?);
    let pipeline = EnrichmentPipeline::new(
        Arc::new(ScriptDetector::new()),
        Arc::new(HttpTranslator::new(translate_url)?),
        Arc::new(FrequencySummarizer::new()),
        config.clone(),
    );
    let notifier = Arc::new(TelegramNotifier::new(token)?);
    let links = LinkStore::load(Box::new(JsonSetStore::new(&args.state_dir))).await?;

    let mut relay = NewsRelay::new(fetcher, pipeline, notifier, links, config);

    // The relay owns no scheduler; cadence is just this loop.
    loop {
        match relay.run_batch(&sources, &args.chat_id).await {
            Ok(stats) => info!(
                "Batch finished: {} seen, {} duplicates, {} sent",
                stats.items_seen, stats.items_duplicate, stats.items_sent
            ),
            Err(e) => error!("Batch failed: {}", e),
        }

        match args.interval_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => break,
        }
    }

    Ok(())
}
