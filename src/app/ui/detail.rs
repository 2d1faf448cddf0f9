use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph},
};
use ratatui_macros::span;
use tui_textarea::Key;

use crate::models::{Conversation, Event, ScoreField, Sender};

use super::utils;

/// Read-only view of one conversation: its ordered messages and, when
/// present, the analysis summary.
#[derive(Default)]
pub struct ConversationDetail {
    showing: bool,
    conversation: Option<Conversation>,
    scroll: u16,
}

impl ConversationDetail {
    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn open(&mut self, conversation: Conversation) {
        self.conversation = Some(conversation);
        self.scroll = 0;
        self.showing = true;
    }

    pub fn close(&mut self) {
        self.showing = false;
        self.conversation = None;
    }

    pub fn handle_key_event(&mut self, event: &Event) {
        match event {
            Event::KeyboardEsc => self.close(),
            Event::UiScrollDown => self.scroll = self.scroll.saturating_add(1),
            Event::UiScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Event::UiScrollPageDown => self.scroll = self.scroll.saturating_add(10),
            Event::UiScrollPageUp => self.scroll = self.scroll.saturating_sub(10),
            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('q') => self.close(),
                Key::Char('j') => self.scroll = self.scroll.saturating_add(1),
                Key::Char('k') => self.scroll = self.scroll.saturating_sub(1),
                Key::Char('g') => self.scroll = 0,
                _ => {}
            },
            _ => {}
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let conversation = match &self.conversation {
            Some(conversation) => conversation,
            None => return,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Conversation ").bold())
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(vec![
                span!(" "),
                span!("q").green().bold(),
                span!(" to close, ").white(),
                span!("j/k").green().bold(),
                span!(" to scroll ").white(),
            ]));

        f.render_widget(Clear, area);
        let inner = block.inner(area);
        f.render_widget(&block, area);

        let max_width = inner.width.saturating_sub(2) as usize;
        let lines = build_lines(conversation, max_width);

        let paragraph = Paragraph::new(lines).scroll((self.scroll, 0));
        f.render_widget(paragraph, inner);
    }
}

fn build_lines<'a>(conversation: &Conversation, max_width: usize) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(span!(conversation.title().to_string()).bold()),
        Line::from(vec![
            span!("id ").dim(),
            span!(conversation.id().to_string()),
        ]),
        Line::from(vec![
            span!("created ").dim(),
            span!(utils::format_time(conversation.created_at())),
            span!("  updated ").dim(),
            span!(utils::format_time(conversation.updated_at())),
        ]),
        Line::default(),
    ];

    if conversation.messages().is_empty() {
        lines.push(Line::from(span!("No messages").dim()));
    }

    for message in conversation.messages() {
        let sender = match message.sender() {
            Sender::User => span!("[user]").cyan().bold(),
            Sender::Ai => span!("[ai]").magenta().bold(),
        };
        lines.push(Line::from(vec![
            sender,
            span!(" "),
            span!(utils::format_time(message.created_at())).dim(),
        ]));
        for text_line in utils::wrap_text(message.text(), max_width.saturating_sub(2)) {
            lines.push(Line::from(format!("  {}", text_line)));
        }
        lines.push(Line::default());
    }

    match conversation.analysis() {
        Some(analysis) => {
            lines.push(Line::from(span!("Analysis").yellow().bold()));
            lines.push(Line::from(vec![
                span!("overall ").dim(),
                span!(format!("{:.1}", analysis.score(ScoreField::Overall))).bold(),
                span!("  sentiment ").dim(),
                span!(analysis.sentiment().as_str()),
                span!("  resolved ").dim(),
                span!(if analysis.resolution() { "yes" } else { "no" }),
                span!("  escalation ").dim(),
                span!(if analysis.escalation_needed() { "yes" } else { "no" }),
            ]));
            lines.push(Line::from(vec![
                span!("scored at ").dim(),
                span!(utils::format_time(analysis.created_at())),
            ]));
        }
        None => lines.push(Line::from(span!("Not analyzed yet").dim())),
    }

    lines
}
