use std::fmt;

use tokio::sync::mpsc;

/// Lifecycle state of one feed within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Processing,
    Completed,
    Error,
}

impl FeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Processing => "processing",
            FeedStatus::Completed => "completed",
            FeedStatus::Error => "error",
        }
    }

    /// True for `Completed` and `Error`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FeedStatus::Processing)
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress notification. Not retained after delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub feed_url: String,
    pub status: FeedStatus,
    /// Percentage in 0..=100
    pub progress: f64,
}

impl ProgressEvent {
    pub fn new(feed_url: impl Into<String>, status: FeedStatus, progress: f64) -> Self {
        Self {
            feed_url: feed_url.into(),
            status,
            progress: progress.clamp(0.0, 100.0),
        }
    }

    pub fn processing(feed_url: &str) -> Self {
        Self::new(feed_url, FeedStatus::Processing, 0.0)
    }

    pub fn completed(feed_url: &str) -> Self {
        Self::new(feed_url, FeedStatus::Completed, 100.0)
    }

    pub fn error(feed_url: &str) -> Self {
        Self::new(feed_url, FeedStatus::Error, 0.0)
    }
}

/// Receiver of progress events, implemented by presentation layers.
///
/// The aggregation engine only calls the caller's sink from its own
/// coordinating task, never from worker tasks.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn report(&self, event: &ProgressEvent) {
        if self.send(event.clone()).is_err() {
            tracing::debug!("Progress receiver dropped, event for {} discarded", event.feed_url);
        }
    }
}

/// Discards every event
impl ProgressSink for () {
    fn report(&self, _event: &ProgressEvent) {}
}
