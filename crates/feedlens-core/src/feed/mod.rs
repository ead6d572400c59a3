mod domain;
mod fetcher;
mod models;
mod parser;

pub use domain::{get_domain, source_label};
pub use fetcher::{FeedFetcher, FeedSource, HttpFeedSource};
pub use models::Article;
pub use parser::parse_articles;
