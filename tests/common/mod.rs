#![allow(dead_code)]

use async_trait::async_trait;
use news_relay::types::{RelayError, Result};
use news_relay::{DetectLanguage, FetchPage, Notify, SetStore, Summarize, Translate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetcher serving canned pages; anything else fails with a fetch error.
pub struct MockFetcher {
    pages: HashMap<String, String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl FetchPage for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RelayError::Fetch {
                url: url.to_string(),
                reason: "HTTP 503: Service Unavailable".to_string(),
            })
    }
}

/// Translator that tags the text with the target language.
pub struct PrefixTranslator;

#[async_trait]
impl Translate for PrefixTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        Ok(format!("[{}] {}", target_lang, text))
    }
}

/// Translator that always fails.
pub struct FailTranslator;

#[async_trait]
impl Translate for FailTranslator {
    async fn translate(&self, _text: &str, target_lang: &str) -> Result<String> {
        Err(RelayError::Translate {
            target: target_lang.to_string(),
            reason: "service unavailable".to_string(),
        })
    }
}

/// Detector pinned to one answer, regardless of input.
pub struct FixedDetector(pub &'static str);

impl DetectLanguage for FixedDetector {
    fn detect(&self, _text: &str) -> String {
        self.0.to_string()
    }
}

/// Summarizer that returns its input unchanged.
pub struct PassthroughSummarizer;

impl Summarize for PassthroughSummarizer {
    fn summarize(&self, text: &str, _max_sentences: usize) -> String {
        text.to_string()
    }
}

/// Summarizer that always produces nothing, forcing the truncation fallback.
pub struct EmptySummarizer;

impl Summarize for EmptySummarizer {
    fn summarize(&self, _text: &str, _max_sentences: usize) -> String {
        String::new()
    }
}

#[derive(Debug, Clone)]
pub struct Delivered {
    pub chat_id: String,
    pub text: String,
    pub photo_url: Option<String>,
}

/// Notifier that records deliveries instead of sending them.
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Delivered>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    pub fn deliveries(&self) -> Vec<Delivered> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        if self.fail {
            return Err(RelayError::Delivery("HTTP 429: Too Many Requests".to_string()));
        }
        self.sent.lock().unwrap().push(Delivered {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            photo_url: None,
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<()> {
        if self.fail {
            return Err(RelayError::Delivery("HTTP 429: Too Many Requests".to_string()));
        }
        self.sent.lock().unwrap().push(Delivered {
            chat_id: chat_id.to_string(),
            text: caption.to_string(),
            photo_url: Some(photo_url.to_string()),
        });
        Ok(())
    }
}

/// In-memory set store. Clone handles share state so tests can inspect it
/// after handing the store to the relay.
#[derive(Clone)]
pub struct MemorySetStore {
    sets: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemorySetStore {
    pub fn new() -> Self {
        Self {
            sets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn seed(&self, name: &str, entries: &[&str]) {
        self.sets.lock().unwrap().insert(
            name.to_string(),
            entries.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn entries(&self, name: &str) -> Vec<String> {
        self.sets
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SetStore for MemorySetStore {
    async fn load(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.entries(name))
    }

    async fn save(&self, name: &str, entries: &[String]) -> Result<()> {
        self.sets
            .lock()
            .unwrap()
            .insert(name.to_string(), entries.to_vec());
        Ok(())
    }
}

/// Build a minimal RSS 2.0 document with the given (title, link, description)
/// triples in order.
pub fn rss_document(items: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel><title>Test Feed</title>",
    );
    for (title, link, description) in items {
        body.push_str(&format!(
            "<item><title>{}</title><link>{}</link><description><![CDATA[{}]]></description></item>",
            title, link, description
        ));
    }
    body.push_str("</channel></rss>");
    body
}
