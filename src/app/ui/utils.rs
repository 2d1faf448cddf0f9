#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use std::fmt::Display;

use chrono::{Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Text},
    widgets::ListItem,
};
use unicode_width::UnicodeWidthChar;

pub fn popup_area(area: Rect, percent_width: u16, percent_height: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_height)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_width)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

pub fn notice_area(area: Rect, percent_width: u16) -> Rect {
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_width)]).flex(Flex::End);
    let [area] = horizontal.areas(area);
    area
}

/// Word-wraps plain text into lines no wider than `max_width` cells.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = vec![];

    for raw_line in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;

        for word in raw_line.split(' ') {
            let word_width = display_width(word);
            if line_width + word_width > max_width && !line.is_empty() {
                lines.push(line.trim_end().to_string());
                line = String::new();
                line_width = 0;
            }

            // A single word wider than the line gets hard-split
            if word_width > max_width {
                for c in word.chars() {
                    let w = UnicodeWidthChar::width(c).unwrap_or(0);
                    if line_width + w > max_width {
                        lines.push(line.clone());
                        line = String::new();
                        line_width = 0;
                    }
                    line.push(c);
                    line_width += w;
                }
                line.push(' ');
                line_width += 1;
                continue;
            }

            line.push_str(word);
            line.push(' ');
            line_width += word_width + 1;
        }

        lines.push(line.trim_end().to_string());
    }

    lines
}

/// Truncates to `width` display cells (with a trailing ellipsis when cut)
/// and pads the remainder with spaces, so columns line up.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    let total = display_width(text);
    if total <= width {
        out.push_str(text);
        used = total;
    } else {
        for c in text.chars() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > width.saturating_sub(1) {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
        used += 1;
    }

    for _ in used..width {
        out.push(' ');
    }
    out
}

fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .sum()
}

/// First characters of a UUID, enough to identify a row on screen
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn format_time(timestamp: chrono::DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Date drill-down buckets for the list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateGroup {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    Older,
}

impl Display for DateGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateGroup::Today => write!(f, "Today"),
            DateGroup::Yesterday => write!(f, "Yesterday"),
            DateGroup::Last7Days => write!(f, "Last 7 Days"),
            DateGroup::Last30Days => write!(f, "Last 30 Days"),
            DateGroup::Older => write!(f, "Older"),
        }
    }
}

impl DateGroup {
    pub fn to_list_item<'b>(&self) -> ListItem<'b> {
        ListItem::new(
            Text::from(self.to_string())
                .alignment(Alignment::Center)
                .bold(),
        )
        .style(
            Style::default()
                .fg(Color::Yellow)
                .bg(Color::Rgb(26, 35, 126)),
        )
        .add_modifier(Modifier::BOLD)
    }
}

pub fn categorize_timestamp(
    now: chrono::DateTime<Utc>,
    timestamp: chrono::DateTime<Utc>,
) -> DateGroup {
    let age =
        now.with_timezone(&Local).date_naive() - timestamp.with_timezone(&Local).date_naive();
    match age.num_days() {
        i64::MIN..=0 => DateGroup::Today,
        1 => DateGroup::Yesterday,
        2..=7 => DateGroup::Last7Days,
        8..=30 => DateGroup::Last30Days,
        _ => DateGroup::Older,
    }
}

/// Cycling created-at filter applied to a list screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    All,
    Today,
    Last7Days,
    Last30Days,
}

impl DateRange {
    pub fn next(&self) -> DateRange {
        match self {
            DateRange::All => DateRange::Today,
            DateRange::Today => DateRange::Last7Days,
            DateRange::Last7Days => DateRange::Last30Days,
            DateRange::Last30Days => DateRange::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::All => "all time",
            DateRange::Today => "today",
            DateRange::Last7Days => "last 7 days",
            DateRange::Last30Days => "last 30 days",
        }
    }

    /// Lower bound for created-at, or None when unfiltered
    pub fn since(&self, now: chrono::DateTime<Utc>) -> Option<chrono::DateTime<Utc>> {
        match self {
            DateRange::All => None,
            DateRange::Today => {
                let midnight = now
                    .with_timezone(&Local)
                    .date_naive()
                    .and_hms_opt(0, 0, 0)?
                    .and_local_timezone(Local)
                    .earliest()?;
                Some(midnight.with_timezone(&Utc))
            }
            DateRange::Last7Days => Some(now - chrono::Duration::days(7)),
            DateRange::Last30Days => Some(now - chrono::Duration::days(30)),
        }
    }
}

/// Builds the title line shown under a list block: active filters, row count.
pub fn filter_summary(parts: &[String], count: usize) -> Line<'static> {
    let mut text = format!(" {} rows", count);
    if !parts.is_empty() {
        text.push_str(&format!(" · {}", parts.join(" · ")));
    }
    text.push(' ');
    Line::from(text).dim()
}
