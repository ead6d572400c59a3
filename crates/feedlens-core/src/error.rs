use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OPML error: {0}")]
    Opml(String),
}

impl Error {
    /// True for failures that happened before a feed body was obtained
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
