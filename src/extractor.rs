use crate::types::FeedItem;
use feed_rs::parser;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Ordered list of content containers tried when scraping a full article page.
/// The first selector with non-empty text wins.
const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    "div.story",
    "div.article-body",
    "div#content",
    "main",
];

/// Parse raw feed bytes into items, preserving feed order and keeping at most
/// `max_items`. Fails soft: malformed feeds produce an empty list, which the
/// caller treats as "no content available".
pub fn parse_feed(content: &str, max_items: usize) -> Vec<FeedItem> {
    let feed = match parser::parse(content.as_bytes()) {
        Ok(feed) => feed,
        Err(e) => {
            warn!("Feed parse failed, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let mut items = Vec::new();

    for entry in feed.entries.into_iter() {
        if items.len() >= max_items {
            break;
        }

        let link = match entry.links.first() {
            Some(link) => link.href.clone(),
            None => {
                debug!("Skipping entry without a link");
                continue;
            }
        };

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        let description_html = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        let image_url = extract_image(&description_html);

        items.push(FeedItem {
            title,
            link,
            description_html,
            image_url,
        });
    }

    debug!("Extracted {} items from feed", items.len());
    items
}

/// Find the first image reference in a description-style HTML fragment.
pub fn extract_image(fragment: &str) -> Option<String> {
    if fragment.is_empty() {
        return None;
    }

    let document = Html::parse_fragment(fragment);
    let selector = Selector::parse("img[src]").ok()?;

    document
        .select(&selector)
        .find_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(|src| src.to_string())
}

/// Strip markup from a description fragment, leaving readable text.
pub fn strip_html(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    let document = Html::parse_fragment(fragment);
    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the body text of a full article page by trying the known content
/// containers in order. Returns an empty string when nothing matches; parse
/// errors never surface.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in ARTICLE_SELECTORS {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };

        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !normalized.is_empty() {
                debug!("Article body matched selector '{}'", selector_str);
                return normalized;
            }
        }
    }

    debug!("No article body found in page");
    String::new()
}
