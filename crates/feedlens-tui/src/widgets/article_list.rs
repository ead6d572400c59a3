use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Focus};

const SOURCE_WIDTH: usize = 22;
const TIME_WIDTH: usize = 10;

pub struct ArticleListWidget;

impl ArticleListWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let is_focused = app.focus == Focus::Articles;

        let border_style = if is_focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.grey0)
        };

        let title = format!(
            " Articles · last {} week(s) ({}) ",
            app.config.weeks_limit,
            app.articles.len()
        );

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(theme.bg0));

        if app.articles.is_empty() {
            let text = if app.fetching {
                format!(" {} Fetching feeds...", app.spinner())
            } else {
                " No articles within the configured window. Press r to refresh.".to_string()
            };
            let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(theme.grey2))).block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let show_source = app.config.ui.show_source;
        let show_time = app.config.ui.show_time;

        // Borders and highlight gutter
        let inner_width = area.width.saturating_sub(3) as usize;
        let mut title_width = inner_width;
        if show_source {
            title_width = title_width.saturating_sub(SOURCE_WIDTH + 1);
        }
        if show_time {
            title_width = title_width.saturating_sub(TIME_WIDTH + 1);
        }

        let items: Vec<ListItem> = app
            .articles
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let title_style = if i == app.selected_article && is_focused {
                    Style::default().fg(theme.fg0).bg(theme.selection)
                } else {
                    Style::default().fg(theme.fg0)
                };

                let title: &str = if article.title.is_empty() { "(untitled)" } else { &article.title };
                let mut spans = vec![Span::styled(fit(title, title_width), title_style)];

                if show_source {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(
                        fit(&article.source, SOURCE_WIDTH),
                        Style::default().fg(theme.blue),
                    ));
                }
                if show_time {
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(
                        fit(&article.relative_time(), TIME_WIDTH),
                        Style::default().fg(theme.aqua),
                    ));
                }

                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(theme.selection));

        let mut state = ListState::default();
        state.select(Some(app.selected_article));

        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Truncate or pad `text` to exactly `width` terminal columns
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        let padding = width - text.width();
        return format!("{}{}", text, " ".repeat(padding));
    }

    let budget = width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width > 0 {
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_short_text() {
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn test_fit_truncates_wide_chars() {
        // Each CJK char takes two columns
        let out = fit("阮一峰的网络日志", 7);
        assert_eq!(out.width(), 7);
        assert!(out.starts_with("阮一峰"));
        assert!(out.contains('…'));
    }

    #[test]
    fn test_fit_zero_width() {
        assert_eq!(fit("anything", 0), "");
    }
}
