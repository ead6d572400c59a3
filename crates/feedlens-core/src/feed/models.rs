use serde::{Deserialize, Serialize};

/// One feed entry that survived the recency filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Target opened in the browser; may be empty
    pub link: String,
    /// Timestamp text exactly as it appeared in the feed; may be empty
    pub published: String,
    /// Domain of the feed this article came from
    pub source: String,
}

impl Article {
    /// Relative age label such as `3天前`
    pub fn relative_time(&self) -> String {
        crate::time::format_relative(&self.published)
    }

    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}
