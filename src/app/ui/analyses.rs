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

use crate::models::{AnalysisOverview, Event, FilterAnalysis, NoticeMessage, Sentiment};
use crate::storage::ArcStorage;

use super::analysis_form::AnalysisForm;
use super::input_box::{self, InputBox};
use super::utils;

const NO_ANALYSES: &str = "No analyses found";

/// Cycling yes/no/any filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum BoolFilter {
    #[default]
    All,
    Yes,
    No,
}

impl BoolFilter {
    fn next(&self) -> BoolFilter {
        match self {
            BoolFilter::All => BoolFilter::Yes,
            BoolFilter::Yes => BoolFilter::No,
            BoolFilter::No => BoolFilter::All,
        }
    }

    fn label(&self, yes: &'static str, no: &'static str) -> &'static str {
        match self {
            BoolFilter::All => "all",
            BoolFilter::Yes => yes,
            BoolFilter::No => no,
        }
    }

    fn to_option(self) -> Option<bool> {
        match self {
            BoolFilter::All => None,
            BoolFilter::Yes => Some(true),
            BoolFilter::No => Some(false),
        }
    }
}

fn next_sentiment_filter(current: Option<Sentiment>) -> Option<Sentiment> {
    match current {
        None => Some(Sentiment::Positive),
        Some(Sentiment::Positive) => Some(Sentiment::Neutral),
        Some(Sentiment::Neutral) => Some(Sentiment::Negative),
        Some(Sentiment::Negative) => None,
    }
}

pub struct AnalysesScreen<'a> {
    event_tx: mpsc::UnboundedSender<Event>,
    storage: ArcStorage,

    rows: Vec<AnalysisOverview>,
    list_items: Vec<ListItem<'a>>,
    id_map: HashMap<usize, String>,
    list_state: ListState,

    search: InputBox<'a>,
    search_term: String,
    sentiment_filter: Option<Sentiment>,
    resolution_filter: BoolFilter,
    escalation_filter: BoolFilter,
    date_range: utils::DateRange,

    form: AnalysisForm<'a>,

    loaded: bool,
}

impl<'a> AnalysesScreen<'a> {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>, storage: ArcStorage) -> AnalysesScreen<'a> {
        AnalysesScreen {
            event_tx: event_tx.clone(),
            storage: storage.clone(),
            rows: vec![],
            list_items: vec![],
            id_map: HashMap::new(),
            list_state: ListState::default(),
            search: InputBox::default()
                .with_title(" Search by conversation title ")
                .with_placeholder("Type to search..."),
            search_term: String::new(),
            sentiment_filter: None,
            resolution_filter: BoolFilter::default(),
            escalation_filter: BoolFilter::default(),
            date_range: utils::DateRange::default(),
            form: AnalysisForm::new(event_tx, storage),
            loaded: false,
        }
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn capturing(&self) -> bool {
        self.search.showing() || self.form.showing()
    }

    pub async fn reload(&mut self) {
        let mut filter = FilterAnalysis::default();
        if let Some(sentiment) = self.sentiment_filter {
            filter = filter.with_sentiment(sentiment);
        }
        if let Some(resolution) = self.resolution_filter.to_option() {
            filter = filter.with_resolution(resolution);
        }
        if let Some(escalation) = self.escalation_filter.to_option() {
            filter = filter.with_escalation_needed(escalation);
        }
        if !self.search_term.is_empty() {
            filter = filter.with_title(&self.search_term);
        }
        if let Some(since) = self.date_range.since(chrono::Utc::now()) {
            filter = filter.with_created_from(since);
        }

        match self.storage.list_analyses(filter).await {
            Ok(rows) => {
                self.rows = rows;
                self.list_items.clear();
                self.list_state.select(None);
                self.loaded = true;
            }
            Err(err) => {
                log::error!("Failed to load analyses: {}", err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to load analyses: {}",
                        err
                    ))))
                    .ok();
            }
        }
    }

    pub async fn handle_key_event(&mut self, event: &Event) -> Result<()> {
        if self.form.showing() {
            return self.form.handle_key_event(event).await;
        }

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

        match event {
            Event::KeyboardEnter => self.open_form().await,

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_row(),
                Key::Char('k') => self.prev_row(),
                Key::Char('g') => self.first(),
                Key::Char('G') => self.last(),
                Key::Char('/') => self.search.open(self.search_term.clone()),
                Key::Char('s') => {
                    self.sentiment_filter = next_sentiment_filter(self.sentiment_filter);
                    self.reload().await;
                }
                Key::Char('o') => {
                    self.resolution_filter = self.resolution_filter.next();
                    self.reload().await;
                }
                Key::Char('e') => {
                    self.escalation_filter = self.escalation_filter.next();
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

    async fn open_form(&mut self) {
        let row = match self.selected_row() {
            Some(row) => row.clone(),
            None => return,
        };

        match self.storage.get_analysis(row.conversation_id()).await {
            Ok(Some(analysis)) => self
                .form
                .open(analysis, row.conversation_title().to_string()),
            Ok(None) => {
                self.event_tx
                    .send(Event::Notice(NoticeMessage::warning(
                        "Analysis no longer exists",
                    )))
                    .ok();
                self.reload().await;
            }
            Err(err) => {
                log::error!("Failed to load analysis: {}", err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to load analysis: {}",
                        err
                    ))))
                    .ok();
            }
        }
    }

    fn selected_row(&self) -> Option<&AnalysisOverview> {
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
                Text::from(NO_ANALYSES).alignment(Alignment::Center),
            ));
            self.list_state.select(None);
            return;
        }

        let mut groups: BTreeMap<utils::DateGroup, Vec<&AnalysisOverview>> = BTreeMap::new();
        let now = chrono::Utc::now();
        for row in &self.rows {
            groups
                .entry(utils::categorize_timestamp(now, row.created_at()))
                .or_default()
                .push(row);
        }

        let title_width = max_width.saturating_sub(58).max(10);
        for (group, rows) in groups {
            self.list_items.push(group.to_list_item());

            for row in rows {
                let sentiment = match row.sentiment() {
                    Sentiment::Positive => span!("positive").green(),
                    Sentiment::Neutral => span!(" neutral").yellow(),
                    Sentiment::Negative => span!("negative").red(),
                };
                let resolution = if row.resolution() {
                    span!("resolved  ").green()
                } else {
                    span!("unresolved").red()
                };
                let escalation = if row.escalation_needed() {
                    span!("⚠").red().bold()
                } else {
                    span!("·").dim()
                };

                let spans: Vec<Span> = vec![
                    span!(utils::short_id(row.id())).dim(),
                    span!("  "),
                    span!(utils::fit_width(row.conversation_title(), title_width)),
                    span!("  "),
                    span!(format!("{:>4.1}", row.overall_score())).bold(),
                    span!("  "),
                    sentiment,
                    span!("  "),
                    resolution,
                    span!("  "),
                    escalation,
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
            span!(" to edit, ").white(),
            span!("/").green().bold(),
            span!(" to search, ").white(),
            span!("s").green().bold(),
            span!("entiment, ").white(),
            span!("o").green().bold(),
            span!(" resolution, ").white(),
            span!("e").green().bold(),
            span!("scalation, ").white(),
            span!("f").green().bold(),
            span!(" date ").white(),
        ];

        let mut filters = vec![
            format!(
                "sentiment: {}",
                self.sentiment_filter
                    .map(|s| s.as_str())
                    .unwrap_or("all")
            ),
            format!(
                "resolution: {}",
                self.resolution_filter.label("resolved", "unresolved")
            ),
            format!(
                "escalation: {}",
                self.escalation_filter.label("needed", "not needed")
            ),
            format!("scored: {}", self.date_range.label()),
        ];
        if !self.search_term.is_empty() {
            filters.push(format!("title: \"{}\"", self.search_term));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Analyses ").bold())
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

        self.form.render(f, utils::popup_area(area, 70, 90));
    }
}
