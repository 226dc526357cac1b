use crate::types::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Names of the two persisted link-set documents.
pub const SEEN_SET: &str = "seen_links";
pub const BAD_SET: &str = "bad_links";

/// Persistence capability for named string sets. Sets are loaded fully at
/// batch start and rewritten fully at each mutation point.
#[async_trait]
pub trait SetStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<Vec<String>>;
    async fn save(&self, name: &str, entries: &[String]) -> Result<()>;
}

/// File-backed store: each set is one JSON document holding a flat list of
/// URL strings under the configured directory.
pub struct JsonSetStore {
    dir: PathBuf,
}

impl JsonSetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl SetStore for JsonSetStore {
    async fn load(&self, name: &str) -> Result<Vec<String>> {
        let path = self.path_for(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let entries: Vec<String> = serde_json::from_str(&content)?;
                debug!("Loaded {} entries from {}", entries.len(), path.display());
                Ok(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored set at {}, starting empty", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, name: &str, entries: &[String]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(name);
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&path, content).await?;
        debug!("Saved {} entries to {}", entries.len(), path.display());
        Ok(())
    }
}

/// In-memory view of the seen and bad link sets, persisted through a
/// [`SetStore`] at each mutation. Invariant: a link is never in both sets; the
/// seen set wins when state on disk disagrees.
pub struct LinkStore {
    store: Box<dyn SetStore>,
    seen: Vec<String>,
    seen_index: HashSet<String>,
    bad: Vec<String>,
    bad_index: HashSet<String>,
}

impl LinkStore {
    /// Load both sets from persistence. A link found in both sets is treated
    /// as already delivered and dropped from the bad set.
    pub async fn load(store: Box<dyn SetStore>) -> Result<Self> {
        let seen = store.load(SEEN_SET).await?;
        let seen_index: HashSet<String> = seen.iter().cloned().collect();

        let bad_raw = store.load(BAD_SET).await?;
        let bad: Vec<String> = bad_raw
            .into_iter()
            .filter(|link| {
                if seen_index.contains(link) {
                    warn!("Link in both sets, seen wins: {}", link);
                    false
                } else {
                    true
                }
            })
            .collect();
        let bad_index: HashSet<String> = bad.iter().cloned().collect();

        info!(
            "Link store loaded: {} seen, {} bad",
            seen_index.len(),
            bad_index.len()
        );

        Ok(Self {
            store,
            seen,
            seen_index,
            bad,
            bad_index,
        })
    }

    pub fn is_seen(&self, link: &str) -> bool {
        self.seen_index.contains(link)
    }

    pub fn is_bad(&self, link: &str) -> bool {
        self.bad_index.contains(link)
    }

    /// Dedup gate: true when the link was already delivered or is known bad.
    pub fn is_blocked(&self, link: &str) -> bool {
        self.is_seen(link) || self.is_bad(link)
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Record a successful delivery. Removes the link from the bad set if
    /// present, keeping the two sets disjoint.
    pub async fn mark_seen(&mut self, link: &str) -> Result<()> {
        if self.seen_index.insert(link.to_string()) {
            self.seen.push(link.to_string());
        }

        if self.bad_index.remove(link) {
            self.bad.retain(|l| l != link);
            self.store.save(BAD_SET, &self.bad).await?;
        }

        self.store.save(SEEN_SET, &self.seen).await
    }

    /// Record a link-scoped fetch or delivery failure. Never touches the seen
    /// set, so a future run may retry once the link leaves the bad set.
    pub async fn mark_bad(&mut self, link: &str) -> Result<()> {
        if self.seen_index.contains(link) {
            return Ok(());
        }
        if self.bad_index.insert(link.to_string()) {
            self.bad.push(link.to_string());
            self.store.save(BAD_SET, &self.bad).await?;
        }
        Ok(())
    }

    /// Bounded-growth option: retain only the newest `cap` seen links.
    /// Pruned links become eligible for re-delivery, which is the accepted
    /// trade-off of capping the set.
    pub async fn prune_seen(&mut self, cap: usize) -> Result<()> {
        if self.seen.len() <= cap {
            return Ok(());
        }
        let drop_count = self.seen.len() - cap;
        for link in self.seen.drain(..drop_count) {
            self.seen_index.remove(&link);
        }
        info!("Pruned {} oldest seen links (cap {})", drop_count, cap);
        self.store.save(SEEN_SET, &self.seen).await
    }
}
