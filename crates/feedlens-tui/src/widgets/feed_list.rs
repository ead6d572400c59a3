use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use feedlens_core::FeedStatus;

use crate::app::{App, Focus};

pub struct FeedListWidget;

impl FeedListWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let is_focused = app.focus == Focus::Feeds;

        let border_style = if is_focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.grey0)
        };

        let block = Block::default()
            .title(format!(" Feeds ({}) ", app.feeds.len()))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(theme.bg0));

        let items: Vec<ListItem> = app
            .feeds
            .iter()
            .enumerate()
            .map(|(i, feed)| {
                let (marker, marker_style) = match feed.status {
                    None => ("·".to_string(), Style::default().fg(theme.grey1)),
                    Some(FeedStatus::Processing) => {
                        (app.spinner().to_string(), Style::default().fg(theme.yellow))
                    }
                    Some(FeedStatus::Completed) => ("✓".to_string(), Style::default().fg(theme.success)),
                    Some(FeedStatus::Error) => ("!".to_string(), Style::default().fg(theme.error)),
                };

                // Priority: cursor > error > normal
                let style = if i == app.selected_feed && is_focused {
                    Style::default()
                        .fg(theme.fg0)
                        .bg(theme.selection)
                        .add_modifier(Modifier::BOLD)
                } else if feed.status == Some(FeedStatus::Error) {
                    Style::default().fg(theme.error)
                } else {
                    Style::default().fg(theme.fg0)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::raw(" "),
                    Span::styled(feed.label.clone(), style),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(theme.selection));

        let mut state = ListState::default();
        if !app.feeds.is_empty() {
            state.select(Some(app.selected_feed));
        }

        frame.render_stateful_widget(list, area, &mut state);
    }
}
