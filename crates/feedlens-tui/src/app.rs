use std::sync::Arc;

use feedlens_core::feed::source_label;
use feedlens_core::{AppConfig, Article, FeedStatus, FetchConfig, ProgressEvent};

use crate::theme::Theme;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Current focus panel in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Feeds,
    Articles,
}

/// One configured feed and what the current run knows about it
#[derive(Debug, Clone)]
pub struct FeedRow {
    pub url: String,
    pub label: String,
    /// `None` until the feed's first event of a run arrives
    pub status: Option<FeedStatus>,
}

pub struct App {
    pub config: Arc<AppConfig>,
    pub theme: Theme,
    pub focus: Focus,
    pub feeds: Vec<FeedRow>,
    pub selected_feed: usize,
    pub articles: Vec<Article>,
    pub selected_article: usize,
    /// True while an aggregation run is in flight
    pub fetching: bool,
    pub status_message: Option<String>,
    pub pending_key: Option<char>,
    pub should_quit: bool,
    spinner_frame: usize,
}

impl App {
    pub fn new(config: Arc<AppConfig>, theme: Theme) -> Self {
        let feeds = config
            .rss_feeds
            .iter()
            .map(|url| FeedRow {
                url: url.clone(),
                label: source_label(url),
                status: None,
            })
            .collect();

        Self {
            config,
            theme,
            focus: Focus::Articles,
            feeds,
            selected_feed: 0,
            articles: Vec::new(),
            selected_article: 0,
            fetching: false,
            status_message: None,
            pending_key: None,
            should_quit: false,
            spinner_frame: 0,
        }
    }

    /// Mark a run as started. Returns the settings to run with, or `None`
    /// if a run is already in flight.
    pub fn begin_refresh(&mut self) -> Option<FetchConfig> {
        if self.fetching {
            self.status_message = Some(" Refresh already in progress".to_string());
            return None;
        }

        self.fetching = true;
        self.status_message = None;
        for feed in &mut self.feeds {
            feed.status = None;
        }

        Some(self.config.fetch_config())
    }

    /// Fold one progress event into the feed rows.
    ///
    /// A repeated URL has one row per occurrence; each event claims the first
    /// row of that URL still waiting for it.
    pub fn apply_progress(&mut self, event: &ProgressEvent) {
        let waiting = match event.status {
            FeedStatus::Processing => None,
            // Engine running totals stay below 100; the last one finds no row still processing
            FeedStatus::Completed if event.progress < 100.0 => return,
            FeedStatus::Completed | FeedStatus::Error => Some(FeedStatus::Processing),
        };

        if let Some(row) = self
            .feeds
            .iter_mut()
            .find(|f| f.url == event.feed_url && f.status == waiting)
        {
            row.status = Some(event.status);
        }
    }

    /// Install the merged result of a finished run
    pub fn finish_refresh(&mut self, articles: Vec<Article>) {
        let failed = self.failed_count();
        self.fetching = false;
        self.articles = articles;
        self.selected_article = 0;
        self.status_message = Some(if failed > 0 {
            format!(" {} articles, {} feed(s) failed", self.articles.len(), failed)
        } else {
            format!(" {} articles", self.articles.len())
        });
    }

    pub fn fail_refresh(&mut self, error: &str) {
        self.fetching = false;
        self.status_message = Some(format!(" Refresh failed: {}", error));
    }

    /// Share of feeds that reached a terminal state, 0-100
    pub fn progress(&self) -> f64 {
        if self.feeds.is_empty() {
            return 100.0;
        }
        let done = self
            .feeds
            .iter()
            .filter(|f| f.status.map_or(false, |s| s.is_terminal()))
            .count();
        done as f64 / self.feeds.len() as f64 * 100.0
    }

    pub fn failed_count(&self) -> usize {
        self.feeds
            .iter()
            .filter(|f| f.status == Some(FeedStatus::Error))
            .count()
    }

    pub fn current_article(&self) -> Option<&Article> {
        self.articles.get(self.selected_article)
    }

    /// Open the selected article's link in the default browser
    pub fn open_selected(&mut self) {
        let Some(article) = self.current_article() else {
            return;
        };

        if !article.has_link() {
            self.status_message = Some(" Article has no link".to_string());
            return;
        }

        let link = article.link.clone();
        match open::that_detached(&link) {
            Ok(()) => {
                tracing::info!("Opened {}", link);
                self.status_message = Some(format!(" Opened {}", link));
            }
            Err(e) => {
                tracing::warn!("Failed to open {}: {}", link, e);
                self.status_message = Some(format!(" Failed to open browser: {}", e));
            }
        }
    }

    fn list_len(&self) -> usize {
        match self.focus {
            Focus::Feeds => self.feeds.len(),
            Focus::Articles => self.articles.len(),
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Feeds => &mut self.selected_feed,
            Focus::Articles => &mut self.selected_article,
        }
    }

    pub fn move_down(&mut self) {
        let len = self.list_len();
        let selected = self.selected_mut();
        if *selected + 1 < len {
            *selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        let selected = self.selected_mut();
        *selected = selected.saturating_sub(1);
    }

    pub fn jump_to_top(&mut self) {
        *self.selected_mut() = 0;
    }

    pub fn jump_to_bottom(&mut self) {
        let last = self.list_len().saturating_sub(1);
        *self.selected_mut() = last;
    }

    pub fn focus_left(&mut self) {
        self.focus = Focus::Feeds;
    }

    pub fn focus_right(&mut self) {
        self.focus = Focus::Articles;
    }

    pub fn tick_spinner(&mut self) {
        if self.fetching {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn spinner(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame]
    }
}
