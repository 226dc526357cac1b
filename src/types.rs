use serde::{Deserialize, Serialize};

/// A configured feed source. `fallback_url` points at a plain article page that
/// is scraped directly when the primary feed yields nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub fallback_url: Option<String>,
}

/// One entry extracted from a feed. Ephemeral: lives only for the duration of a
/// single batch pass. `link` is the dedup identity and is never truncated.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description_html: String,
    pub image_url: Option<String>,
}

/// Result of running the enrichment pipeline on one item, ready for delivery.
#[derive(Debug, Clone)]
pub struct EnrichedItem {
    pub source_name: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub image_url: Option<String>,
    pub caption: String,
}

/// Counters for a single batch invocation. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub sources_seen: usize,
    pub items_seen: usize,
    pub items_duplicate: usize,
    pub items_sent: usize,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum items examined per source per batch.
    pub items_per_source: usize,
    /// Target sentence count for the summarizer.
    pub summary_sentences: usize,
    /// Character budget for the truncation fallback when summarization fails.
    pub truncation_budget: usize,
    /// Links longer than this are display-shortened in captions.
    pub link_display_max: usize,
    /// Sleep between successful deliveries, protecting the delivery channel.
    pub pacing_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Language the feeds are expected to publish in.
    pub source_lang: String,
    /// Language the summarizer operates in.
    pub working_lang: String,
    /// Language of the delivered caption.
    pub display_lang: String,
    /// When set, the seen set keeps only the newest N links. Off by default;
    /// pruning never changes the dedup contract for retained links.
    pub seen_links_cap: Option<usize>,
    pub user_agent: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            items_per_source: 3,
            summary_sentences: 3,
            truncation_budget: 400,
            link_display_max: 60,
            pacing_secs: 2,
            fetch_timeout_secs: 10,
            source_lang: "fa".to_string(),
            working_lang: "en".to_string(),
            display_lang: "en".to_string(),
            seen_links_cap: None,
            user_agent: "news-relay/0.1".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("translation to {target} failed: {reason}")]
    Translate { target: String, reason: String },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
