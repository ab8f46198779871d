//! Security news from RSS/Atom feeds.

use log::debug;
use reqwest::header::{self, HeaderName};

use super::Parsed;
use crate::config::NewsFeed;
use crate::fetch::RetryingFetcher;
use crate::lookup::{FeedEntry, FeedParser, RelevanceClassifier};
use crate::models::{now_timestamp, NewsArticle};

const ACCEPT_FEED: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8";

/// Keeps the relevant entries of a feed. Entries without a title or link
/// count as malformed.
pub fn articles_from_feed(
    entries: Vec<FeedEntry>,
    classifier: &dyn RelevanceClassifier,
) -> Parsed<NewsArticle> {
    let mut parsed = Parsed::default();
    for entry in entries {
        let title = entry.title.trim();
        let link = entry.link.trim();
        if title.is_empty() || link.is_empty() {
            parsed.skip();
            continue;
        }
        let verdict = classifier.classify(&format!("{} {}", title, entry.summary.trim()));
        if !verdict.relevant {
            continue;
        }
        parsed.items.push(NewsArticle {
            title: title.to_string(),
            link: link.to_string(),
            timestamp: entry
                .published
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(now_timestamp),
        });
    }
    parsed
}

pub async fn fetch_feed(
    feed: &NewsFeed,
    fetcher: &RetryingFetcher,
    parser: &dyn FeedParser,
    classifier: &dyn RelevanceClassifier,
) -> Parsed<NewsArticle> {
    let fetcher = fetcher.labeled(&feed.name);
    let headers: [(HeaderName, &str); 1] = [(header::ACCEPT, ACCEPT_FEED)];
    let Some(document) = fetcher.fetch_text(&feed.url, &[], &headers).await else {
        return Parsed::default();
    };
    let entries = parser.parse(&document);
    if entries.is_empty() {
        debug!("{}: no entries in feed", feed.name);
    }
    let total = entries.len();
    let parsed = articles_from_feed(entries, classifier);
    debug!(
        "{}: {} of {} entries relevant",
        feed.name,
        parsed.items.len(),
        total
    );
    parsed
}
