use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use super::domain::source_label;
use super::models::Article;
use super::parser::parse_articles;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEED_USER_AGENT: &str = concat!("feedlens/", env!("CARGO_PKG_VERSION"));

/// Where raw feed documents come from
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the raw body of the feed at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Feed source backed by an HTTP client with a fixed per-request timeout
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Self::build_client(timeout)?,
        })
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(Self::build_headers())
            .build()
            .map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(FEED_USER_AGENT));
        headers
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Network(format!("HTTP {} for URL: {}", status, url)));
        }

        if let Some(declared) = response.content_length() {
            check_feed_size(declared, url)?;
        }

        // Stream so an oversized body without Content-Length is cut off early
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut body, &chunk, url)?;
        }

        Ok(body)
    }
}

fn check_feed_size(len: u64, url: &str) -> Result<()> {
    if len > MAX_FEED_BYTES as u64 {
        return Err(Error::FeedParse(format!(
            "Feed too large ({} bytes) for URL: {}",
            len, url
        )));
    }
    Ok(())
}

fn append_capped(body: &mut Vec<u8>, chunk: &[u8], url: &str) -> Result<()> {
    check_feed_size((body.len() + chunk.len()) as u64, url)?;
    body.extend_from_slice(chunk);
    Ok(())
}

/// Fetches a single feed, filters it and reports its lifecycle
#[derive(Clone)]
pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self { source }
    }

    /// Fetch one feed and return the articles dated at or after `cutoff`.
    ///
    /// Never fails: network and parse errors are logged, reported as an
    /// `error` event and yield no articles.
    pub async fn fetch(&self, feed_url: &str, cutoff: DateTime<Utc>, sink: &dyn ProgressSink) -> Vec<Article> {
        sink.report(&ProgressEvent::processing(feed_url));

        match self.try_fetch(feed_url, cutoff).await {
            Ok(articles) => {
                tracing::info!("Fetched {} articles from {}", articles.len(), feed_url);
                sink.report(&ProgressEvent::completed(feed_url));
                articles
            }
            Err(e) => {
                if e.is_network() {
                    tracing::warn!("Network error for {}: {}", feed_url, e);
                } else {
                    tracing::warn!("Failed to parse {}: {}", feed_url, e);
                }
                sink.report(&ProgressEvent::error(feed_url));
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, feed_url: &str, cutoff: DateTime<Utc>) -> Result<Vec<Article>> {
        tracing::debug!("Fetching feed from: {}", feed_url);
        let body = self.source.fetch(feed_url).await?;
        parse_articles(&body, &source_label(feed_url), cutoff)
    }
}
