use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted application configuration.
///
/// The four fetch keys live at the top level of the file so that a minimal
/// config is just a feed list. Every key has a default, so partial files
/// merge over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Feed URLs, fetched in this order (duplicates are kept)
    #[serde(default = "default_rss_feeds")]
    pub rss_feeds: Vec<String>,
    /// Recency window in weeks
    #[serde(default = "default_weeks_limit")]
    pub weeks_limit: u32,
    /// Maximum concurrent feed fetches
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rss_feeds: default_rss_feeds(),
            weeks_limit: default_weeks_limit(),
            max_workers: default_max_workers(),
            request_timeout: default_request_timeout(),
            general: GeneralConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file lives here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Show the source domain column
    #[serde(default = "default_true")]
    pub show_source: bool,
    /// Show the relative time column
    #[serde(default = "default_true")]
    pub show_time: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            show_source: default_true(),
            show_time: default_true(),
        }
    }
}

/// Read-only snapshot handed to one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub feeds: Vec<String>,
    pub weeks_limit: u32,
    pub max_workers: usize,
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        AppConfig::default().fetch_config()
    }
}

fn default_rss_feeds() -> Vec<String> {
    [
        "https://hutusi.com/feed.xml",
        "https://scarsu.com/rss",
        "https://www.demochen.com/atom.xml",
        "https://onojyun.com/feed/",
        "https://hux6.com/feed/",
        "https://atjason.com/atom.xml",
        "https://www.ruanyifeng.com/blog/atom.xml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_weeks_limit() -> u32 {
    1
}

fn default_max_workers() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedlens")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_rate() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Like [`AppConfig::load_from`], but falls back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedlens/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedlens")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Get the log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("feedlens.log")
    }

    /// Snapshot the fetch settings for one aggregation run
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            feeds: self.rss_feeds.clone(),
            weeks_limit: self.weeks_limit,
            max_workers: self.max_workers.max(1),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }

    /// Append a feed URL unless it is already configured.
    /// Returns whether the list changed.
    pub fn add_feed(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.rss_feeds.iter().any(|f| f == url) {
            return false;
        }
        self.rss_feeds.push(url.to_string());
        true
    }

    /// Remove every occurrence of a feed URL. Returns whether the list changed.
    pub fn remove_feed(&mut self, url: &str) -> bool {
        let before = self.rss_feeds.len();
        self.rss_feeds.retain(|f| f != url.trim());
        self.rss_feeds.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rss_feeds.len(), 7);
        assert_eq!(config.weeks_limit, 1);
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.request_timeout, 30);
    }

    #[test]
    fn test_partial_config_merges_over_defaults() {
        let config = AppConfig::from_toml(
            r#"
rss_feeds = ["https://example.com/feed.xml"]
max_workers = 2
"#,
        )
        .unwrap();

        assert_eq!(config.rss_feeds, vec!["https://example.com/feed.xml".to_string()]);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.weeks_limit, 1);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.ui.tick_rate_ms, 100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("weeks_limit = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_load_or_default_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "rss_feeds = 42").unwrap();

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.weeks_limit = 3;
        config.add_feed("https://example.org/atom.xml");
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_fetch_config_clamps_workers() {
        let mut config = AppConfig::default();
        config.max_workers = 0;
        config.request_timeout = 7;

        let fetch = config.fetch_config();
        assert_eq!(fetch.max_workers, 1);
        assert_eq!(fetch.request_timeout, Duration::from_secs(7));
        assert_eq!(fetch.feeds.len(), 7);
    }

    #[test]
    fn test_add_and_remove_feed() {
        let mut config = AppConfig::default();
        config.rss_feeds.clear();

        assert!(config.add_feed("https://a.example.com/rss"));
        assert!(!config.add_feed("https://a.example.com/rss"));
        assert!(!config.add_feed("   "));
        assert_eq!(config.rss_feeds.len(), 1);

        assert!(config.remove_feed("https://a.example.com/rss"));
        assert!(!config.remove_feed("https://a.example.com/rss"));
        assert!(config.rss_feeds.is_empty());
    }
}
