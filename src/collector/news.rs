//! Security news from the configured RSS/Atom feeds.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use log::info;

use super::Collector;
use crate::config::Config;
use crate::error_handling::{CollectionStats, EventKind};
use crate::fetch::{RetryPolicy, RetryingFetcher};
use crate::lookup::Lookups;
use crate::models::{Domain, NewsArticle};
use crate::sources::fetch_feed;

pub struct NewsCollector {
    config: Arc<Config>,
    lookups: Lookups,
    stats: Arc<CollectionStats>,
    fetcher: Option<RetryingFetcher>,
}

impl NewsCollector {
    pub fn new(config: Arc<Config>, lookups: Lookups, stats: Arc<CollectionStats>) -> Self {
        Self {
            config,
            lookups,
            stats,
            fetcher: None,
        }
    }
}

impl Collector for NewsCollector {
    type Record = NewsArticle;

    fn name(&self) -> &'static str {
        Domain::News.as_str()
    }

    async fn open(&mut self, client: reqwest::Client) -> anyhow::Result<()> {
        let retries = self.config.settings(Domain::News).max_retries;
        self.fetcher = Some(RetryingFetcher::new(
            client,
            RetryPolicy::new(retries),
            self.stats.clone(),
        ));
        Ok(())
    }

    /// All relevant articles across feeds, first occurrence per link.
    async fn collect(&mut self) -> anyhow::Result<Vec<NewsArticle>> {
        let fetcher = self.fetcher.as_ref().context("news session is not open")?;
        let parser = &*self.lookups.feed_parser;
        let relevance = &*self.lookups.relevance;
        let feeds = join_all(
            self.config
                .news_feeds
                .iter()
                .map(|feed| fetch_feed(feed, fetcher, parser, relevance)),
        )
        .await;

        let mut links = HashSet::new();
        let mut articles = Vec::new();
        let mut skipped = 0;
        let mut repeated = 0;
        for parsed in feeds {
            skipped += parsed.malformed;
            for article in parsed.items {
                if links.insert(article.link.clone()) {
                    articles.push(article);
                } else {
                    repeated += 1;
                }
            }
        }
        self.stats.add(EventKind::MalformedItem, skipped);
        self.stats.add(EventKind::DuplicateRecord, repeated);
        info!(
            "{}: {} relevant articles from {} feeds",
            self.name(),
            articles.len(),
            self.config.news_feeds.len()
        );
        Ok(articles)
    }

    async fn close(&mut self) {
        self.fetcher = None;
    }
}
