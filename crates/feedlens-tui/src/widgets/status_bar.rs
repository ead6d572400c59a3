use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus};

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;

        let focus_str = match app.focus {
            Focus::Feeds => "Feeds",
            Focus::Articles => "Articles",
        };

        let status_text = if app.fetching {
            format!(
                " {} Fetching {:.0}% | {} failed",
                app.spinner(),
                app.progress(),
                app.failed_count()
            )
        } else if let Some(msg) = &app.status_message {
            msg.clone()
        } else {
            format!(
                " {} | Feeds: {} | Articles: {}",
                focus_str,
                app.feeds.len(),
                app.articles.len()
            )
        };

        let help_hint = " q:quit h/l:panels j/k:move o:open r:refresh ";
        let padding_len = (area.width as usize)
            .saturating_sub(status_text.width() + help_hint.width());

        let status_style = if app.fetching {
            Style::default().fg(theme.yellow).bg(theme.bg2)
        } else {
            Style::default().fg(theme.fg0).bg(theme.bg2)
        };

        let line = Line::from(vec![
            Span::styled(status_text, status_style),
            Span::styled(" ".repeat(padding_len), Style::default().bg(theme.bg2)),
            Span::styled(help_hint, Style::default().fg(theme.grey2).bg(theme.bg2)),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
