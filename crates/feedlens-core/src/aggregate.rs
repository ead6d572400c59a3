use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::FetchConfig;
use crate::feed::{Article, FeedFetcher, FeedSource, HttpFeedSource};
use crate::progress::{FeedStatus, ProgressEvent, ProgressSink};
use crate::time::parse_timestamp;
use crate::Result;

/// Runs one feed fetch per configured URL on a bounded pool of tasks and
/// merges the results into a single most-recent-first list.
pub struct Aggregator {
    fetcher: FeedFetcher,
}

impl Aggregator {
    /// Create an aggregator that fetches over HTTP
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let source = HttpFeedSource::new(config.request_timeout)?;
        Ok(Self::with_source(Arc::new(source)))
    }

    pub fn with_source(source: Arc<dyn FeedSource>) -> Self {
        Self {
            fetcher: FeedFetcher::new(source),
        }
    }

    /// Fetch every feed in `config`, at most `max_workers` at a time.
    ///
    /// Per-feed failures are absorbed: they show up as `error` events and
    /// contribute no articles. All events reach `sink` from this task only.
    pub async fn fetch_all(&self, config: &FetchConfig, sink: &dyn ProgressSink) -> Vec<Article> {
        let cutoff = cutoff_before(Utc::now(), config.weeks_limit);
        let total = config.feeds.len();

        tracing::info!(
            "Fetching {} feeds (workers={}, window={} week(s))",
            total,
            config.max_workers,
            config.weeks_limit
        );

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let mut join_set: JoinSet<(String, Vec<Article>)> = JoinSet::new();
        let mut pending = config.feeds.iter();
        let mut articles = Vec::new();
        let mut completed = 0usize;

        let spawn_task = |join_set: &mut JoinSet<(String, Vec<Article>)>, feed_url: String| {
            let fetcher = self.fetcher.clone();
            let events = event_tx.clone();
            join_set.spawn(async move {
                let found = fetcher.fetch(&feed_url, cutoff, &events).await;
                (feed_url, found)
            });
        };

        for feed_url in pending.by_ref().take(config.max_workers.max(1)) {
            spawn_task(&mut join_set, feed_url.clone());
        }

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => sink.report(&event),
                joined = join_set.join_next() => {
                    let Some(joined) = joined else { break };

                    // Deliver the finished feed's own events before the running total
                    while let Ok(event) = event_rx.try_recv() {
                        sink.report(&event);
                    }

                    completed += 1;
                    match joined {
                        Ok((feed_url, found)) => {
                            articles.extend(found);
                            let progress = completed as f64 / total as f64 * 100.0;
                            sink.report(&ProgressEvent::new(feed_url, FeedStatus::Completed, progress));
                        }
                        Err(e) => {
                            tracing::error!("Feed task failed to complete: {}", e);
                        }
                    }

                    if let Some(feed_url) = pending.next() {
                        spawn_task(&mut join_set, feed_url.clone());
                    }
                }
            }
        }

        drop(event_tx);
        while let Some(event) = event_rx.recv().await {
            sink.report(&event);
        }

        sort_by_recency(&mut articles, Local::now());

        tracing::info!("Collected {} articles from {} feeds", articles.len(), total);

        articles
    }
}

/// Earliest instant an entry may carry and still be kept. Windows reaching
/// past chrono's range keep everything.
pub fn cutoff_before(now: DateTime<Utc>, weeks: u32) -> DateTime<Utc> {
    Duration::try_weeks(i64::from(weeks))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Seconds elapsed since `published`, or `None` when it cannot be parsed
pub fn seconds_since(published: &str, now: DateTime<Local>) -> Option<i64> {
    parse_timestamp(published).map(|ts| ts.seconds_before(now))
}

/// Most recently published first; unparsable or empty timestamps go last
pub fn sort_by_recency(articles: &mut [Article], now: DateTime<Local>) {
    articles.sort_by_cached_key(|article| match seconds_since(&article.published, now) {
        Some(secs) => (false, secs),
        None => (true, 0),
    });
}
