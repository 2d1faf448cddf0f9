#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};

use eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Padding},
};
use ratatui_macros::span;
use tokio::sync::mpsc;
use tui_textarea::Key;

use crate::models::{ConversationOverview, Event, FilterConversation, NoticeMessage};
use crate::storage::ArcStorage;

use super::detail::ConversationDetail;
use super::input_box::{self, InputBox};
use super::question::Question;
use super::utils::{self, DateRange};

const NO_CONVERSATIONS: &str = "No conversations found";

pub struct ConversationsScreen<'a> {
    event_tx: mpsc::UnboundedSender<Event>,
    storage: ArcStorage,

    rows: Vec<ConversationOverview>,
    list_items: Vec<ListItem<'a>>,
    id_map: HashMap<usize, String>,
    list_state: ListState,

    search: InputBox<'a>,
    search_term: String,
    rename: InputBox<'a>,
    question: Question<'a>,
    detail: ConversationDetail,
    date_range: DateRange,

    loaded: bool,
}

impl<'a> ConversationsScreen<'a> {
    pub fn new(
        event_tx: mpsc::UnboundedSender<Event>,
        storage: ArcStorage,
    ) -> ConversationsScreen<'a> {
        ConversationsScreen {
            event_tx,
            storage,
            rows: vec![],
            list_items: vec![],
            id_map: HashMap::new(),
            list_state: ListState::default(),
            search: InputBox::default()
                .with_title(" Search by title ")
                .with_placeholder("Type to search..."),
            search_term: String::new(),
            rename: InputBox::default().with_title(" Rename "),
            question: Question::default().with_title(Line::from(" Delete Conversation ").bold()),
            detail: ConversationDetail::default(),
            date_range: DateRange::default(),
            loaded: false,
        }
    }

    pub fn with_conversations(
        mut self,
        rows: Vec<ConversationOverview>,
    ) -> ConversationsScreen<'a> {
        self.rows = rows;
        self.loaded = true;
        self
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// A popup is open and wants all keyboard input
    pub fn capturing(&self) -> bool {
        self.search.showing()
            || self.rename.showing()
            || self.question.showing()
            || self.detail.showing()
    }

    pub async fn reload(&mut self) {
        let mut filter = FilterConversation::default();
        if !self.search_term.is_empty() {
            filter = filter.with_title(&self.search_term);
        }
        if let Some(since) = self.date_range.since(chrono::Utc::now()) {
            filter = filter.with_created_from(since);
        }

        match self.storage.list_conversations(filter).await {
            Ok(rows) => {
                self.rows = rows;
                self.list_items.clear();
                self.list_state.select(None);
                self.loaded = true;
            }
            Err(err) => {
                log::error!("Failed to load conversations: {}", err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to load conversations: {}",
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

        if self.rename.showing() {
            match event {
                Event::KeyboardEnter => {
                    let text = self.rename.close().unwrap_or_default();
                    self.on_rename(text).await;
                }
                Event::KeyboardEsc | Event::KeyboardCtrlC => {
                    self.rename.close();
                }
                _ => self.rename.handle_key_event(event),
            }
            return Ok(());
        }

        if self.question.showing() {
            if let Event::KeyboardCharInput(input) = event {
                match input.key {
                    Key::Char('y') => {
                        self.on_delete().await;
                        self.question.close();
                    }
                    Key::Char('n') | Key::Char('q') => self.question.close(),
                    _ => {}
                }
            }
            return Ok(());
        }

        if self.detail.showing() {
            self.detail.handle_key_event(event);
            return Ok(());
        }

        match event {
            Event::KeyboardEnter => self.open_detail().await,

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_row(),
                Key::Char('k') => self.prev_row(),
                Key::Char('g') => self.first(),
                Key::Char('G') => self.last(),
                Key::Char('/') => self.search.open(self.search_term.clone()),
                Key::Char('f') => {
                    self.date_range = self.date_range.next();
                    self.reload().await;
                }
                Key::Char('d') => {
                    let selected = self
                        .selected_row()
                        .map(|row| (row.title().to_string(), row.message_count()));
                    if let Some((title, count)) = selected {
                        self.question.open(format!(
                            "Do you want to delete \"{}\" with its {} messages and analysis?",
                            title, count
                        ));
                    }
                }
                Key::Char('r') => {
                    if let Some(row) = self.selected_row() {
                        let title = row.title().to_string();
                        self.rename.open(title);
                    }
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

    async fn open_detail(&mut self) {
        let id = match self.selected_id() {
            Some(id) => id.to_string(),
            None => return,
        };

        match self.storage.get_conversation(&id).await {
            Ok(Some(conversation)) => self.detail.open(conversation),
            Ok(None) => {
                self.event_tx
                    .send(Event::Notice(NoticeMessage::warning(
                        "Conversation no longer exists",
                    )))
                    .ok();
                self.reload().await;
            }
            Err(err) => {
                log::error!("Failed to load conversation {}: {}", id, err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to load conversation: {}",
                        err
                    ))))
                    .ok();
            }
        }
    }

    async fn on_delete(&mut self) {
        let id = match self.selected_id() {
            Some(id) => id.to_string(),
            None => return,
        };

        if let Err(err) = self.storage.delete_conversation(&id).await {
            log::error!("Failed to delete conversation {}: {}", id, err);
            self.event_tx
                .send(Event::Notice(NoticeMessage::error(format!(
                    "Failed to delete conversation: {}",
                    err
                ))))
                .ok();
            return;
        }

        self.event_tx.send(Event::ConversationDeleted(id)).ok();
    }

    async fn on_rename(&mut self, new_title: String) {
        let row = match self.selected_row() {
            Some(row) => row.clone(),
            None => return,
        };

        if new_title.is_empty() || new_title == row.title() {
            return;
        }

        let conversation = crate::models::Conversation::default()
            .with_id(row.id())
            .with_title(new_title)
            .with_created_at(row.created_at())
            .with_updated_at(chrono::Utc::now());

        if let Err(err) = self.storage.upsert_conversation(conversation).await {
            log::error!("Failed to rename conversation: {}", err);
            self.event_tx
                .send(Event::Notice(NoticeMessage::error(format!(
                    "Failed to rename conversation: {}",
                    err
                ))))
                .ok();
            return;
        }
        self.reload().await;
    }

    fn selected_id(&self) -> Option<&str> {
        let idx = self.list_state.selected()?;
        self.id_map.get(&idx).map(|id| id.as_str())
    }

    fn selected_row(&self) -> Option<&ConversationOverview> {
        let id = self.selected_id()?;
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
        // Group headers are not selectable, skip forward past them
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
        // The first item is always a group header
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
                Text::from(NO_CONVERSATIONS).alignment(Alignment::Center),
            ));
            self.list_state.select(None);
            return;
        }

        let mut groups: BTreeMap<utils::DateGroup, Vec<&ConversationOverview>> = BTreeMap::new();
        let now = chrono::Utc::now();
        for row in &self.rows {
            groups
                .entry(utils::categorize_timestamp(now, row.created_at()))
                .or_default()
                .push(row);
        }

        let title_width = max_width.saturating_sub(42).max(10);
        for (group, rows) in groups {
            self.list_items.push(group.to_list_item());

            for row in rows {
                let analyzed = if row.has_analysis() {
                    span!("✓").green()
                } else {
                    span!("·").dim()
                };
                let spans: Vec<Span> = vec![
                    span!(utils::short_id(row.id())).dim(),
                    span!("  "),
                    span!(utils::fit_width(row.title(), title_width)),
                    span!("  "),
                    span!(utils::format_time(row.created_at())).dim(),
                    span!(format!("  {:>4} msgs  ", row.message_count())),
                    analyzed,
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
            span!("f").green().bold(),
            span!(" to filter by date, ").white(),
            span!("d").green().bold(),
            span!(" to delete, ").white(),
            span!("r").green().bold(),
            span!(" to rename ").white(),
        ];

        let mut filters = vec![format!("created: {}", self.date_range.label())];
        if !self.search_term.is_empty() {
            filters.push(format!("title: \"{}\"", self.search_term));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Conversations ").bold())
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
        self.rename.render(f, search_area);
        self.question.render(f, inner);
        self.detail.render(f, utils::popup_area(area, 80, 85));
    }
}
