use std::collections::{BTreeMap, HashMap};

use eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Padding, Paragraph},
};
use ratatui_macros::span;
use tokio::sync::mpsc;
use tui_textarea::Key;

use crate::models::{Event, FilterMessage, MessageOverview, NoticeMessage, Sender};
use crate::storage::ArcStorage;

use super::input_box::{self, InputBox};
use super::utils;

const NO_MESSAGES: &str = "No messages found";

/// Cycling sender filter: all, user only, ai only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SenderFilter {
    #[default]
    All,
    User,
    Ai,
}

impl SenderFilter {
    fn next(&self) -> SenderFilter {
        match self {
            SenderFilter::All => SenderFilter::User,
            SenderFilter::User => SenderFilter::Ai,
            SenderFilter::Ai => SenderFilter::All,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SenderFilter::All => "all",
            SenderFilter::User => "user",
            SenderFilter::Ai => "ai",
        }
    }

    fn to_sender(self) -> Option<Sender> {
        match self {
            SenderFilter::All => None,
            SenderFilter::User => Some(Sender::User),
            SenderFilter::Ai => Some(Sender::Ai),
        }
    }
}

pub struct MessagesScreen<'a> {
    event_tx: mpsc::UnboundedSender<Event>,
    storage: ArcStorage,

    rows: Vec<MessageOverview>,
    list_items: Vec<ListItem<'a>>,
    id_map: HashMap<usize, String>,
    list_state: ListState,

    search: InputBox<'a>,
    search_term: String,
    sender_filter: SenderFilter,
    date_range: utils::DateRange,

    viewing: Option<MessageOverview>,
    view_scroll: u16,

    loaded: bool,
}

impl<'a> MessagesScreen<'a> {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>, storage: ArcStorage) -> MessagesScreen<'a> {
        MessagesScreen {
            event_tx,
            storage,
            rows: vec![],
            list_items: vec![],
            id_map: HashMap::new(),
            list_state: ListState::default(),
            search: InputBox::default()
                .with_title(" Search text or conversation title ")
                .with_placeholder("Type to search..."),
            search_term: String::new(),
            sender_filter: SenderFilter::default(),
            date_range: utils::DateRange::default(),
            viewing: None,
            view_scroll: 0,
            loaded: false,
        }
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn capturing(&self) -> bool {
        self.search.showing() || self.viewing.is_some()
    }

    pub async fn reload(&mut self) {
        let mut filter = FilterMessage::default();
        if let Some(sender) = self.sender_filter.to_sender() {
            filter = filter.with_sender(sender);
        }
        if !self.search_term.is_empty() {
            filter = filter.with_contains(&self.search_term);
        }
        if let Some(since) = self.date_range.since(chrono::Utc::now()) {
            filter = filter.with_created_from(since);
        }

        match self.storage.list_messages(filter).await {
            Ok(rows) => {
                self.rows = rows;
                self.list_items.clear();
                self.list_state.select(None);
                self.loaded = true;
            }
            Err(err) => {
                log::error!("Failed to load messages: {}", err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to load messages: {}",
                        err
                    ))))
                    .ok();
            }
        }
    }

    pub async fn handle_key_event(&mut self, event: &Event) -> Result<()> {
        if self.search.showing() {
            match event {
                Event::KeyboardEnter => {
                    self.search_term = self.search.close().unwrap_or_default();
                    self.reload().await;
                }
                Event::KeyboardEsc | Event::KeyboardCtrlC => {
                    self.search.close();
                }
                _ => self.search.handle_key_event(event),
            }
            return Ok(());
        }

        if self.viewing.is_some() {
            match event {
                Event::KeyboardEsc => self.viewing = None,
                Event::UiScrollDown => self.view_scroll = self.view_scroll.saturating_add(1),
                Event::UiScrollUp => self.view_scroll = self.view_scroll.saturating_sub(1),
                Event::KeyboardCharInput(input) => match input.key {
                    Key::Char('q') => self.viewing = None,
                    Key::Char('j') => self.view_scroll = self.view_scroll.saturating_add(1),
                    Key::Char('k') => self.view_scroll = self.view_scroll.saturating_sub(1),
                    _ => {}
                },
                _ => {}
            }
            return Ok(());
        }

        match event {
            Event::KeyboardEnter => {
                let row = self.selected_row().cloned();
                if let Some(row) = row {
                    self.viewing = Some(row);
                    self.view_scroll = 0;
                }
            }

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_row(),
                Key::Char('k') => self.prev_row(),
                Key::Char('g') => self.first(),
                Key::Char('G') => self.last(),
                Key::Char('/') => self.search.open(self.search_term.clone()),
                Key::Char('s') => {
                    self.sender_filter = self.sender_filter.next();
                    self.reload().await;
                }
                Key::Char('f') => {
                    self.date_range = self.date_range.next();
                    self.reload().await;
                }
                _ => {}
            },

            Event::UiScrollUp => self.prev_row(),
            Event::UiScrollDown => self.next_row(),
            Event::UiScrollPageUp => self.pageup(),
            Event::UiScrollPageDown => self.pagedown(),

            _ => {}
        }
        Ok(())
    }

    fn selected_row(&self) -> Option<&MessageOverview> {
        let idx = self.list_state.selected()?;
        let id = self.id_map.get(&idx)?;
        self.rows.iter().find(|row| row.id() == id)
    }

    fn next_row(&mut self) {
        if self.rows.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.list_items.len().saturating_sub(1)),
            None => 0,
        };
        if self.id_map.get(&i).is_none() {
            let mut next = i + 1;
            while next < self.list_items.len() && self.id_map.get(&next).is_none() {
                next += 1;
            }
            if next < self.list_items.len() {
                self.list_state.select(Some(next));
            }
            return;
        }
        self.list_state.select(Some(i));
    }

    fn prev_row(&mut self) {
        if self.rows.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => (i as isize - 1).max(0) as usize,
            None => 0,
        };
        if self.id_map.get(&i).is_none() {
            let mut prev = i as isize - 1;
            while prev >= 0 && self.id_map.get(&(prev as usize)).is_none() {
                prev -= 1;
            }
            if prev >= 0 {
                self.list_state.select(Some(prev as usize));
            }
            return;
        }
        self.list_state.select(Some(i));
    }

    fn pageup(&mut self) {
        for _ in 0..10 {
            self.prev_row();
        }
    }

    fn pagedown(&mut self) {
        for _ in 0..10 {
            self.next_row();
        }
    }

    fn first(&mut self) {
        if self.rows.is_empty() {
            self.list_state.select(None);
            return;
        }
        self.list_state.select(Some(0));
        self.next_row();
    }

    fn last(&mut self) {
        if self.rows.is_empty() {
            self.list_state.select(None);
            return;
        }
        self.list_state
            .select(Some(self.list_items.len().saturating_sub(1)));
    }

    fn build_list_items(&mut self, max_width: usize) {
        self.list_items.clear();
        self.id_map.clear();

        if self.rows.is_empty() {
            self.list_items.push(ListItem::new(
                Text::from(NO_MESSAGES).alignment(Alignment::Center),
            ));
            self.list_state.select(None);
            return;
        }

        let mut groups: BTreeMap<utils::DateGroup, Vec<&MessageOverview>> = BTreeMap::new();
        let now = chrono::Utc::now();
        for row in &self.rows {
            groups
                .entry(utils::categorize_timestamp(now, row.created_at()))
                .or_default()
                .push(row);
        }

        // id + sender + time columns are fixed, the rest splits between
        // the preview and the parent title
        let remaining = max_width.saturating_sub(40).max(20);
        let preview_width = remaining * 2 / 3;
        let title_width = remaining - preview_width;

        for (group, rows) in groups {
            self.list_items.push(group.to_list_item());

            for row in rows {
                let sender = match row.sender() {
                    Sender::User => span!("user").cyan(),
                    Sender::Ai => span!("  ai").magenta(),
                };
                let spans: Vec<Span> = vec![
                    span!(utils::short_id(row.id())).dim(),
                    span!("  "),
                    sender,
                    span!("  "),
                    span!(utils::fit_width(&row.preview(), preview_width)),
                    span!("  "),
                    span!(utils::fit_width(row.conversation_title(), title_width)).dim(),
                    span!("  "),
                    span!(utils::format_time(row.created_at())).dim(),
                ];
                self.list_items.push(ListItem::new(Line::from(spans)));
                self.id_map
                    .insert(self.list_items.len() - 1, row.id().to_string());
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let instructions: Vec<Span> = vec![
            " ".into(),
            span!("Enter").green().bold(),
            span!(" to view, ").white(),
            span!("/").green().bold(),
            span!(" to search, ").white(),
            span!("s").green().bold(),
            span!(" to filter by sender, ").white(),
            span!("f").green().bold(),
            span!(" to filter by date ").white(),
        ];

        let mut filters = vec![
            format!("sender: {}", self.sender_filter.label()),
            format!("sent: {}", self.date_range.label()),
        ];
        if !self.search_term.is_empty() {
            filters.push(format!("search: \"{}\"", self.search_term));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Messages ").bold())
            .title_alignment(Alignment::Center)
            .title(utils::filter_summary(&filters, self.rows.len()).right_aligned())
            .title_bottom(Line::from(instructions));

        f.render_widget(Clear, area);
        let inner = block.inner(area);
        self.build_list_items(inner.width.saturating_sub(2) as usize);

        let list = List::new(self.list_items.clone())
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(list, area, &mut self.list_state);

        let search_area = input_box::build_area(inner, ((inner.width as f32 * 0.8).ceil()) as u16);
        self.search.render(f, search_area);

        self.render_view(f, utils::popup_area(area, 70, 70));
    }

    fn render_view(&mut self, f: &mut Frame, area: Rect) {
        let row = match &self.viewing {
            Some(row) => row,
            None => return,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Message ").bold())
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

        let sender = match row.sender() {
            Sender::User => span!("[user]").cyan().bold(),
            Sender::Ai => span!("[ai]").magenta().bold(),
        };

        let mut lines = vec![
            Line::from(vec![
                sender,
                span!(" in "),
                span!(row.conversation_title().to_string()).bold(),
            ]),
            Line::from(vec![
                span!("sent ").dim(),
                span!(utils::format_time(row.created_at())),
            ]),
            Line::default(),
        ];
        for text_line in utils::wrap_text(row.text(), inner.width.saturating_sub(2) as usize) {
            lines.push(Line::from(text_line));
        }

        let paragraph = Paragraph::new(lines).scroll((self.view_scroll, 0));
        f.render_widget(paragraph, inner);
    }
}
