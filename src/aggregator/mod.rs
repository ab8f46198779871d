//! The aggregation facade: runs every collector session and serves their
//! output to consumers.
//!
//! Threat groups and malicious IPs land in bounded FIFO queues drained with
//! [`Aggregator::pull_batch`]; news replaces a single snapshot slot read with
//! [`Aggregator::latest_news`]. Every batch is also broadcast to
//! [`Aggregator::stream`] subscribers.

mod queue;

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use futures::stream::{BoxStream, StreamExt};
use log::{error, info, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collector::{Collector, CollectorSession, IpCollector, NewsCollector, ThreatCollector};
use crate::config::{Config, STREAM_CHANNEL_CAPACITY};
use crate::error_handling::{CollectionStats, EventKind};
use crate::lookup::Lookups;
use crate::models::{AttackGroup, Domain, DomainBatch, MaliciousIpRecord, NewsArticle};

use queue::RecordQueue;

struct Channels {
    threat: broadcast::Sender<DomainBatch>,
    news: broadcast::Sender<DomainBatch>,
    ip: broadcast::Sender<DomainBatch>,
}

impl Channels {
    fn new() -> Self {
        Self {
            threat: broadcast::channel(STREAM_CHANNEL_CAPACITY).0,
            news: broadcast::channel(STREAM_CHANNEL_CAPACITY).0,
            ip: broadcast::channel(STREAM_CHANNEL_CAPACITY).0,
        }
    }

    fn get(&self, domain: Domain) -> &broadcast::Sender<DomainBatch> {
        match domain {
            Domain::Threat => &self.threat,
            Domain::News => &self.news,
            Domain::MaliciousIp => &self.ip,
        }
    }
}

fn publish(channel: &broadcast::Sender<DomainBatch>, batch: DomainBatch) {
    if channel.receiver_count() > 0 {
        // Only fails when every receiver has gone away in between.
        let _ = channel.send(batch);
    }
}

/// Runs the threat, news and malicious-IP sessions and buffers their output.
///
/// # Examples
///
/// ```no_run
/// use threat_harvest::{Aggregator, Config, Domain};
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut aggregator = Aggregator::new(Config::default())?;
/// aggregator.start()?;
/// let batch = aggregator.pull_batch(Domain::Threat, 100);
/// println!("{} threat groups", batch.len());
/// aggregator.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Aggregator {
    config: Arc<Config>,
    lookups: Lookups,
    stats: Arc<CollectionStats>,
    threats: Arc<RecordQueue<AttackGroup>>,
    ips: Arc<RecordQueue<MaliciousIpRecord>>,
    news: Arc<RwLock<Vec<NewsArticle>>>,
    channels: Arc<Channels>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Aggregator {
    /// Validates `config` and loads the default lookups.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or an unreadable country table.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let lookups = Lookups::from_config(&config).context("Failed to initialize lookups")?;
        let capacity = config.queue_capacity;
        Ok(Self {
            config: Arc::new(config),
            lookups,
            stats: Arc::new(CollectionStats::new()),
            threats: Arc::new(RecordQueue::new(capacity)),
            ips: Arc::new(RecordQueue::new(capacity)),
            news: Arc::new(RwLock::new(Vec::new())),
            channels: Arc::new(Channels::new()),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Replaces the lookups used by sessions started afterwards.
    pub fn with_lookups(mut self, lookups: Lookups) -> Self {
        self.lookups = lookups;
        self
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    fn spawn_session<C, S>(&mut self, collector: C, domain: Domain, sink: S)
    where
        C: Collector,
        S: FnMut(Vec<C::Record>) + Send + 'static,
    {
        let interval = self.config.settings(domain).interval;
        let session =
            CollectorSession::new(collector, self.config.clone(), interval, self.stats.clone());
        self.tasks
            .push(tokio::spawn(session.run(self.cancel.clone(), sink)));
    }

    /// Starts the three collector sessions on the current Tokio runtime.
    /// Calling it while already running does nothing.
    ///
    /// # Errors
    ///
    /// Fails when called outside a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        tokio::runtime::Handle::try_current()
            .context("Aggregator::start must be called within a Tokio runtime")?;
        if self.is_running() {
            warn!("Aggregator already running");
            return Ok(());
        }
        self.cancel = CancellationToken::new();

        let threat = ThreatCollector::new(self.config.clone(), self.lookups.clone(), self.stats.clone());
        let (queue, channels, stats) = (self.threats.clone(), self.channels.clone(), self.stats.clone());
        self.spawn_session(threat, Domain::Threat, move |groups: Vec<AttackGroup>| {
            stats.add(EventKind::QueueOverflow, queue.push_all(groups.clone()));
            publish(&channels.threat, DomainBatch::Threat(groups));
        });

        let news = NewsCollector::new(self.config.clone(), self.lookups.clone(), self.stats.clone());
        let (latest, channels) = (self.news.clone(), self.channels.clone());
        self.spawn_session(news, Domain::News, move |articles: Vec<NewsArticle>| {
            if !articles.is_empty() {
                *latest.write().unwrap_or_else(PoisonError::into_inner) = articles.clone();
            }
            publish(&channels.news, DomainBatch::News(articles));
        });

        let ip = IpCollector::new(self.config.clone(), self.lookups.clone(), self.stats.clone());
        let (queue, channels, stats) = (self.ips.clone(), self.channels.clone(), self.stats.clone());
        self.spawn_session(ip, Domain::MaliciousIp, move |records: Vec<MaliciousIpRecord>| {
            stats.add(EventKind::QueueOverflow, queue.push_all(records.clone()));
            publish(&channels.ip, DomainBatch::MaliciousIp(records));
        });

        info!(
            "Aggregator started: {} threat sources, {} feeds, {} IP lists",
            self.config.threat_sources.len(),
            self.config.news_feeds.len(),
            self.config.ip_sources.len()
        );
        Ok(())
    }

    /// Stops every session, including the event-stream consumer, and waits
    /// for them to release their clients. Safe to call repeatedly; queued
    /// records stay available and [`start`](Self::start) may be called again.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Collector session panicked: {}", e);
                }
            }
        }
    }

    /// Up to `max_items` records of `domain`, oldest first. Never waits.
    ///
    /// Threat and malicious-IP records are removed from their queues. News
    /// has no queue: the current snapshot is returned, truncated.
    pub fn pull_batch(&self, domain: Domain, max_items: usize) -> DomainBatch {
        match domain {
            Domain::Threat => DomainBatch::Threat(self.pull_threats(max_items)),
            Domain::MaliciousIp => DomainBatch::MaliciousIp(self.pull_ips(max_items)),
            Domain::News => {
                let mut articles = self.latest_news();
                articles.truncate(max_items);
                DomainBatch::News(articles)
            }
        }
    }

    pub fn pull_threats(&self, max_items: usize) -> Vec<AttackGroup> {
        self.threats.pop(max_items)
    }

    pub fn pull_ips(&self, max_items: usize) -> Vec<MaliciousIpRecord> {
        self.ips.pop(max_items)
    }

    /// The most recent non-empty news cycle; empty before the first one.
    pub fn latest_news(&self) -> Vec<NewsArticle> {
        self.news
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records waiting in the queue of `domain`.
    pub fn queued(&self, domain: Domain) -> usize {
        match domain {
            Domain::Threat => self.threats.len(),
            Domain::MaliciousIp => self.ips.len(),
            Domain::News => self
                .news
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    /// Every batch of `domain` delivered from now on, including empty ones
    /// from failed cycles.
    ///
    /// The stream does not end when the aggregator is closed; it resumes if
    /// the aggregator is started again. A subscriber that falls more than a
    /// few dozen batches behind skips the ones it missed. Independent of the
    /// pull queues: streamed records are still queued.
    pub fn stream(&self, domain: Domain) -> BoxStream<'static, DomainBatch> {
        let receiver = self.channels.get(domain).subscribe();
        futures::stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(batch) => return Some((batch, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("{} subscriber lagged, skipped {} batches", domain, skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    pub fn stats(&self) -> &Arc<CollectionStats> {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(Aggregator::new(config).is_err());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let mut aggregator = Aggregator::new(Config::default()).unwrap();
        assert!(aggregator.start().is_err());
        assert!(!aggregator.is_running());
    }

    #[test]
    fn test_pull_before_start_is_empty() {
        let aggregator = Aggregator::new(Config::default()).unwrap();
        assert!(aggregator.pull_batch(Domain::Threat, 10).is_empty());
        assert!(aggregator.pull_batch(Domain::MaliciousIp, 10).is_empty());
        assert!(aggregator.latest_news().is_empty());
        assert_eq!(aggregator.queued(Domain::Threat), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let config = Config {
            threat_sources: Vec::new(),
            ip_sources: Vec::new(),
            news_feeds: Vec::new(),
            ..Default::default()
        };
        let mut aggregator = Aggregator::new(config).unwrap();
        aggregator.start().unwrap();
        assert!(aggregator.is_running());
        aggregator.close().await;
        aggregator.close().await;
        assert!(!aggregator.is_running());
    }

    #[tokio::test]
    async fn test_stream_yields_published_batches() {
        let aggregator = Aggregator::new(Config::default()).unwrap();
        let mut stream = aggregator.stream(Domain::Threat);
        publish(&aggregator.channels.threat, DomainBatch::Threat(Vec::new()));
        match stream.next().await {
            Some(DomainBatch::Threat(records)) => assert!(records.is_empty()),
            other => panic!("unexpected batch: {:?}", other),
        }
    }
}
