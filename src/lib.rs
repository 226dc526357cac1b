pub mod types;
pub mod fetcher;
pub mod extractor;
pub mod enrich;
pub mod store;
pub mod notify;
pub mod relay;

pub use types::*;
pub use fetcher::{FetchPage, Fetcher};
pub use enrich::{
    DetectLanguage, EnrichmentPipeline, FrequencySummarizer, HttpTranslator, ScriptDetector,
    Summarize, Translate,
};
pub use notify::{Notify, TelegramNotifier};
pub use relay::NewsRelay;
pub use store::{JsonSetStore, LinkStore, SetStore};
