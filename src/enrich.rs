use crate::extractor::strip_html;
use crate::types::{EnrichedItem, FeedItem, RelayConfig, RelayError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sentinel returned when the detector cannot classify the text. Treated the
/// same as a foreign language by the pipeline.
pub const LANG_UNKNOWN: &str = "unknown";

/// Language classification capability.
pub trait DetectLanguage: Send + Sync {
    /// Classify `text` into a language tag, or [`LANG_UNKNOWN`].
    fn detect(&self, text: &str) -> String;
}

/// Translation capability.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Extractive summarization capability. Best effort, never fails.
pub trait Summarize: Send + Sync {
    fn summarize(&self, text: &str, max_sentences: usize) -> String;
}

/// Unicode-script heuristic detector. Counts letters per script and returns
/// the tag of the dominant one. Arabic-script text maps to the configured tag
/// (Persian by default, matching the feeds this relay was built for).
pub struct ScriptDetector {
    arabic_script_tag: String,
}

impl ScriptDetector {
    pub fn new() -> Self {
        Self {
            arabic_script_tag: "fa".to_string(),
        }
    }

    pub fn with_arabic_tag(mut self, tag: &str) -> Self {
        self.arabic_script_tag = tag.to_string();
        self
    }
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectLanguage for ScriptDetector {
    fn detect(&self, text: &str) -> String {
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for c in text.chars() {
            if !c.is_alphabetic() {
                continue;
            }
            let script = match c {
                '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{FB50}'..='\u{FDFF}' => {
                    "arabic"
                }
                '\u{0400}'..='\u{04FF}' => "ru",
                '\u{0590}'..='\u{05FF}' => "he",
                '\u{4E00}'..='\u{9FFF}' => "zh",
                'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' => "en",
                _ => continue,
            };
            *counts.entry(script).or_insert(0) += 1;
        }

        let total: usize = counts.values().sum();
        if total == 0 {
            return LANG_UNKNOWN.to_string();
        }

        let (dominant, count) = counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .unwrap_or((LANG_UNKNOWN, 0));

        // Require a clear majority; mixed content is unclassifiable.
        if count * 2 <= total {
            return LANG_UNKNOWN.to_string();
        }

        if dominant == "arabic" {
            self.arabic_script_tag.clone()
        } else {
            dominant.to_string()
        }
    }
}

/// Translator backed by a LibreTranslate-compatible HTTP endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(RelayError::Http)?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let body = json!({
            "q": text,
            "source": "auto",
            "target": target_lang,
            "format": "text",
        });

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Translate {
                target: target_lang.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RelayError::Translate {
                target: target_lang.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|e| RelayError::Translate {
                target: target_lang.to_string(),
                reason: e.to_string(),
            })?;

        payload
            .get("translatedText")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| RelayError::Translate {
                target: target_lang.to_string(),
                reason: "response missing translatedText".to_string(),
            })
    }
}

/// Word-frequency extractive summarizer. Scores each sentence by how many
/// frequent words it carries and returns the top sentences in original order.
pub struct FrequencySummarizer;

impl FrequencySummarizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Summarize for FrequencySummarizer {
    fn summarize(&self, text: &str, max_sentences: usize) -> String {
        let sentences = split_sentences(text);
        if sentences.len() <= max_sentences {
            return sentences.join(" ");
        }

        let mut word_freq: HashMap<String, usize> = HashMap::new();
        for sentence in &sentences {
            for word in sentence.split_whitespace() {
                let word: String = word
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect();
                if word.len() > 3 {
                    *word_freq.entry(word).or_insert(0) += 1;
                }
            }
        }

        let mut scored: Vec<(usize, usize)> = sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let score: usize = sentence
                    .split_whitespace()
                    .map(|word| {
                        let word: String = word
                            .to_lowercase()
                            .chars()
                            .filter(|c| c.is_alphanumeric())
                            .collect();
                        word_freq.get(&word).copied().unwrap_or(0)
                    })
                    .sum();
                (i, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let mut picked: Vec<usize> = scored.into_iter().take(max_sentences).map(|(i, _)| i).collect();
        picked.sort_unstable();

        picked
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?', '؟'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when
/// trimmed. Char-aware so UTF-8 sequences are never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Display-shorten a link that exceeds `max_chars`. Cosmetic only: callers
/// keep using the full link for identity and dedup.
pub fn shorten_link(link: &str, max_chars: usize) -> String {
    truncate_chars(link, max_chars)
}

/// The per-item enrichment state machine: detect, normalize to the working
/// language, summarize, re-translate to the display language, assemble the
/// caption. Strictly sequential; each stage applies its own failure policy.
pub struct EnrichmentPipeline {
    detector: Arc<dyn DetectLanguage>,
    translator: Arc<dyn Translate>,
    summarizer: Arc<dyn Summarize>,
    config: RelayConfig,
}

impl EnrichmentPipeline {
    pub fn new(
        detector: Arc<dyn DetectLanguage>,
        translator: Arc<dyn Translate>,
        summarizer: Arc<dyn Summarize>,
        config: RelayConfig,
    ) -> Self {
        Self {
            detector,
            translator,
            summarizer,
            config,
        }
    }

    /// Run one item through all stages. `Err` here means the item must be
    /// skipped (normalization failed); every later stage degrades instead of
    /// failing.
    pub async fn enrich(&self, source_name: &str, item: &FeedItem) -> Result<EnrichedItem> {
        let description = strip_html(&item.description_html);
        let combined = if description.is_empty() {
            item.title.clone()
        } else {
            format!("{}. {}", item.title, description)
        };

        // Stage 1: detect. Unknown is handled as a foreign language.
        let detected = self.detector.detect(&combined);
        debug!("Detected language '{}' for {}", detected, item.link);

        // Stage 2: normalize. Raw foreign text must never reach the
        // summarizer; a failed translation skips the item.
        let (text, current_lang) =
            if detected != self.config.source_lang && detected != self.config.display_lang {
                let translated = self
                    .translator
                    .translate(&combined, &self.config.working_lang)
                    .await?;
                (translated, self.config.working_lang.clone())
            } else {
                (combined, detected)
            };

        // Stage 3: summarize, falling back to plain truncation. The fallback
        // never fails and always yields a bounded caption.
        let summary = self
            .summarizer
            .summarize(&text, self.config.summary_sentences);
        let summary = if summary.trim().is_empty() {
            warn!("Summarizer produced no output for {}, truncating", item.link);
            truncate_chars(text.trim(), self.config.truncation_budget)
        } else {
            truncate_chars(summary.trim(), self.config.truncation_budget)
        };

        // Stage 4: re-translate to the display language. Failure degrades to
        // the working-language summary; partial value beats silence.
        let summary = if current_lang != self.config.display_lang {
            match self
                .translator
                .translate(&summary, &self.config.display_lang)
                .await
            {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(
                        "Re-translation to {} failed for {}, delivering in '{}': {}",
                        self.config.display_lang, item.link, current_lang, e
                    );
                    summary
                }
            }
        } else {
            summary
        };

        let caption = self.assemble_caption(source_name, &item.title, &summary, &item.link);

        Ok(EnrichedItem {
            source_name: source_name.to_string(),
            title: item.title.clone(),
            summary,
            link: item.link.clone(),
            image_url: item.image_url.clone(),
            caption,
        })
    }

    fn assemble_caption(&self, source_name: &str, title: &str, summary: &str, link: &str) -> String {
        let display_link = shorten_link(link, self.config.link_display_max);
        format!(
            "{}\n{}\n\n{}\n\n{}",
            source_name, title, summary, display_link
        )
    }
}
