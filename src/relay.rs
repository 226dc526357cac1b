use crate::enrich::EnrichmentPipeline;
use crate::extractor;
use crate::fetcher::FetchPage;
use crate::notify::{clamp_caption, Notify};
use crate::store::LinkStore;
use crate::types::{FeedItem, RelayConfig, Result, RunStats, Source};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Title given to the synthetic item produced by fallback-site recovery.
pub const FALLBACK_TITLE: &str = "Alternate report";

/// The batch orchestrator. Owns the link store for the duration of the
/// process and drives fetch, extraction, enrichment and delivery for each
/// configured source in order. One entry point, invoked periodically by an
/// external caller.
pub struct NewsRelay {
    fetcher: Arc<dyn FetchPage>,
    pipeline: EnrichmentPipeline,
    notifier: Arc<dyn Notify>,
    links: LinkStore,
    config: RelayConfig,
}

impl NewsRelay {
    pub fn new(
        fetcher: Arc<dyn FetchPage>,
        pipeline: EnrichmentPipeline,
        notifier: Arc<dyn Notify>,
        links: LinkStore,
        config: RelayConfig,
    ) -> Self {
        Self {
            fetcher,
            pipeline,
            notifier,
            links,
            config,
        }
    }

    pub fn link_store(&self) -> &LinkStore {
        &self.links
    }

    /// Run one full pass over all sources. A batch with zero deliveries is a
    /// benign outcome; only persistence failures propagate.
    pub async fn run_batch(&mut self, sources: &[Source], chat_id: &str) -> Result<RunStats> {
        let mut stats = RunStats::default();
        info!("Starting batch over {} sources", sources.len());

        for source in sources {
            stats.sources_seen += 1;

            let items = match self.fetcher.fetch(&source.url).await {
                Ok(content) => extractor::parse_feed(&content, self.config.items_per_source),
                Err(e) => {
                    // One source failing never aborts the batch.
                    error!("Fetch failed for source '{}': {}", source.name, e);
                    Vec::new()
                }
            };

            if items.is_empty() {
                warn!("Source '{}' yielded no items", source.name);
                self.try_fallback(source, chat_id, &mut stats).await?;
                continue;
            }

            for item in items {
                stats.items_seen += 1;
                self.process_item(&source.name, &item, chat_id, &mut stats)
                    .await?;
            }
        }

        if let Some(cap) = self.config.seen_links_cap {
            self.links.prune_seen(cap).await?;
        }

        info!(
            "Batch done: {} sources, {} items, {} duplicates, {} sent",
            stats.sources_seen, stats.items_seen, stats.items_duplicate, stats.items_sent
        );
        Ok(stats)
    }

    /// Degraded-but-nonzero-value path: when the primary feed produced
    /// nothing, scrape the configured fallback page once and deliver it as a
    /// single synthetic item. The fallback content runs through the full
    /// pipeline, language detection included.
    async fn try_fallback(
        &mut self,
        source: &Source,
        chat_id: &str,
        stats: &mut RunStats,
    ) -> Result<()> {
        let fallback_url = match &source.fallback_url {
            Some(url) => url.clone(),
            None => return Ok(()),
        };

        if self.links.is_blocked(&fallback_url) {
            debug!("Fallback for '{}' already handled, skipping", source.name);
            return Ok(());
        }

        info!("Trying fallback page for '{}'", source.name);

        let page = match self.fetcher.fetch(&fallback_url).await {
            Ok(page) => page,
            Err(e) => {
                error!("Fallback fetch failed for '{}': {}", source.name, e);
                self.links.mark_bad(&fallback_url).await?;
                return Ok(());
            }
        };

        let body = extractor::extract_article_text(&page);
        if body.is_empty() {
            // Unextractable pages count as link-scoped failures so the next
            // batch does not refetch them.
            warn!("Fallback page for '{}' had no extractable content", source.name);
            self.links.mark_bad(&fallback_url).await?;
            return Ok(());
        }

        let item = FeedItem {
            title: FALLBACK_TITLE.to_string(),
            link: fallback_url,
            description_html: body,
            image_url: None,
        };

        stats.items_seen += 1;
        self.process_item(&source.name, &item, chat_id, stats).await
    }

    /// Dedup gate, enrichment and delivery for a single item. Failures here
    /// are contained to the item; only store IO errors propagate.
    async fn process_item(
        &mut self,
        source_name: &str,
        item: &FeedItem,
        chat_id: &str,
        stats: &mut RunStats,
    ) -> Result<()> {
        if self.links.is_blocked(&item.link) {
            debug!("Duplicate, skipping: {}", item.link);
            stats.items_duplicate += 1;
            return Ok(());
        }

        let enriched = match self.pipeline.enrich(source_name, item).await {
            Ok(enriched) => enriched,
            Err(e) => {
                // Normalization failed; the item enters neither set so a
                // later run can retry it.
                warn!("Enrichment skipped item {}: {}", item.link, e);
                return Ok(());
            }
        };

        let delivery = match &enriched.image_url {
            Some(image_url) => {
                let caption = clamp_caption(&enriched.caption, true);
                self.notifier.send_photo(chat_id, image_url, &caption).await
            }
            None => {
                let text = clamp_caption(&enriched.caption, false);
                self.notifier.send_message(chat_id, &text).await
            }
        };

        match delivery {
            Ok(()) => {
                self.links.mark_seen(&item.link).await?;
                stats.items_sent += 1;
                info!("Delivered: {}", item.link);
                tokio::time::sleep(Duration::from_secs(self.config.pacing_secs)).await;
            }
            Err(e) => {
                error!("Delivery failed for {}: {}", item.link, e);
                self.links.mark_bad(&item.link).await?;
            }
        }

        Ok(())
    }
}
