use std::time::{self, Duration};

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{List, ListItem},
};
use unicode_width::UnicodeWidthStr;

use crate::models::NoticeMessage;

use super::utils;

struct MessageWrapper {
    value: NoticeMessage,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Stack of transient notices rendered over the top-right corner.
pub struct Notice {
    notices: Vec<MessageWrapper>,
    display_duration: time::Duration,
}

impl Notice {
    pub fn add_message(&mut self, msg: NoticeMessage) {
        self.notices.push(MessageWrapper {
            value: msg,
            created_at: chrono::Utc::now(),
        });
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.add_message(NoticeMessage::info(msg))
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.add_message(NoticeMessage::warning(msg))
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.add_message(NoticeMessage::error(msg))
    }

    fn sync(&mut self) {
        let now = chrono::Utc::now();
        self.notices.retain(|msg| {
            let elapsed = now.signed_duration_since(msg.created_at);
            elapsed.num_milliseconds()
                < msg
                    .value
                    .duration()
                    .unwrap_or(self.display_duration)
                    .as_millis() as i64
        });
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        self.sync();
        if self.notices.is_empty() {
            return;
        }

        let max_width = area.width.saturating_sub(2) as usize;
        let max_height = area.height.saturating_sub(2) as usize;

        let mut items = vec![];
        let mut current_height = 0;
        for notice in &self.notices {
            let lines = build_bubble(
                notice.value.message(),
                max_width,
                notice.value.kind().border_color(),
                notice.value.kind().text_color(),
            );

            current_height += lines.len();
            if current_height > max_height {
                break;
            }
            items.push(ListItem::new(lines));
        }

        f.render_widget(List::new(items), area);
    }
}

impl Default for Notice {
    fn default() -> Self {
        Self {
            notices: vec![],
            display_duration: Duration::from_secs(3),
        }
    }
}

// List items cannot nest widgets, so the bubble border is drawn as text
fn build_bubble<'a>(
    message: &str,
    max_width: usize,
    border_color: Color,
    text_color: Color,
) -> Vec<Line<'a>> {
    let inner_width = max_width.saturating_sub(4).max(1);
    let border = Style::default().fg(border_color);
    let text = Style::default().fg(text_color);

    let horizontal = "─".repeat(inner_width + 2);
    let mut lines = vec![Line::from(format!("╭{}╮", horizontal)).style(border)];

    for content in utils::wrap_text(message, inner_width) {
        let pad = " ".repeat(inner_width.saturating_sub(content.width()));
        lines.push(Line::from(format!("│ {}{} │", content, pad)).style(text));
    }

    lines.push(Line::from(format!("╰{}╯", horizontal)).style(border));
    lines
}
