//! JSON-lines output of pulled batches.

use std::io::{self, Write};

use crate::aggregator::Aggregator;
use crate::models::{Domain, DomainBatch, Identity, NewsArticle};

/// What has been written so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitCounts {
    pub threat_groups: usize,
    pub ip_records: usize,
    pub news_snapshots: usize,
}

/// Writes one JSON object per non-empty batch:
/// `{"domain":"threat","records":[...]}`.
///
/// Threat and IP batches are pulled from their queues on every tick. The news
/// snapshot is written only when its set of links changed since the last one.
pub struct BatchEmitter<W: Write> {
    out: W,
    last_news: Vec<String>,
    counts: EmitCounts,
}

impl<W: Write> BatchEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_news: Vec::new(),
            counts: EmitCounts::default(),
        }
    }

    pub fn counts(&self) -> EmitCounts {
        self.counts
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_batch(&mut self, batch: &DomainBatch) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, batch)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn news_changed(&self, news: &[NewsArticle]) -> bool {
        !news.is_empty()
            && (news.len() != self.last_news.len()
                || news
                    .iter()
                    .zip(&self.last_news)
                    .any(|(article, seen)| article.identity() != *seen))
    }

    /// Pulls up to `batch_size` records per queue and writes what it got.
    ///
    /// # Errors
    ///
    /// Returns the first write error; records already pulled are lost.
    pub fn emit(&mut self, aggregator: &Aggregator, batch_size: usize) -> io::Result<()> {
        for domain in [Domain::Threat, Domain::MaliciousIp] {
            let batch = aggregator.pull_batch(domain, batch_size);
            if batch.is_empty() {
                continue;
            }
            self.write_batch(&batch)?;
            match domain {
                Domain::Threat => self.counts.threat_groups += batch.len(),
                _ => self.counts.ip_records += batch.len(),
            }
        }

        let news = aggregator.latest_news();
        if self.news_changed(&news) {
            self.last_news = news.iter().map(Identity::identity).collect();
            self.write_batch(&DomainBatch::News(news))?;
            self.counts.news_snapshots += 1;
        }
        Ok(())
    }
}
