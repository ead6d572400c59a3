mod article_list;
mod feed_list;
mod status_bar;

pub use article_list::ArticleListWidget;
pub use feed_list::FeedListWidget;
pub use status_bar::StatusBarWidget;
