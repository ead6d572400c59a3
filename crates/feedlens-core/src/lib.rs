pub mod aggregate;
pub mod config;
pub mod error;
pub mod feed;
pub mod opml;
pub mod progress;
pub mod time;

pub use aggregate::Aggregator;
pub use config::{AppConfig, FetchConfig};
pub use error::{Error, Result};
pub use feed::{get_domain, Article, FeedSource, HttpFeedSource};
pub use progress::{FeedStatus, ProgressEvent, ProgressSink};
pub use time::format_relative;
