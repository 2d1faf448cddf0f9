use eyre::Result;
use once_cell::sync::Lazy;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph},
};
use ratatui_macros::span;
use tokio::sync::mpsc;
use tui_textarea::Key;

use crate::models::{
    ConversationAnalysis, Event, FieldError, NoticeMessage, ScoreField, ValidationError,
};
use crate::storage::ArcStorage;

use super::input_box::{self, InputBox};
use super::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Conversation,
    Score(ScoreField),
    Sentiment,
    AvgResponseTime,
    Resolution,
    EscalationNeeded,
    FallbackFrequency,
    CreatedAt,
}

impl FormField {
    fn label(&self) -> &'static str {
        match self {
            FormField::Conversation => "Conversation",
            FormField::Score(field) => field.label(),
            FormField::Sentiment => "Sentiment",
            FormField::AvgResponseTime => "Avg Response Time",
            FormField::Resolution => "Resolution",
            FormField::EscalationNeeded => "Escalation Needed",
            FormField::FallbackFrequency => "Fallback Frequency",
            FormField::CreatedAt => "Created At",
        }
    }

    fn editable(&self) -> bool {
        !matches!(self, FormField::Conversation | FormField::CreatedAt)
    }

    // Persisted column name, for matching validation errors
    fn column(&self) -> Option<&'static str> {
        match self {
            FormField::Score(field) => Some(field.name()),
            _ => None,
        }
    }
}

/// The edit form groups fields into five named sections.
pub static FIELDSETS: Lazy<Vec<(&'static str, Vec<FormField>)>> = Lazy::new(|| {
    vec![
        ("Conversation", vec![FormField::Conversation]),
        (
            "Quality Metrics",
            vec![
                FormField::Score(ScoreField::Clarity),
                FormField::Score(ScoreField::Relevance),
                FormField::Score(ScoreField::Accuracy),
                FormField::Score(ScoreField::Completeness),
                FormField::Score(ScoreField::Coherence),
            ],
        ),
        (
            "Interaction Metrics",
            vec![
                FormField::Sentiment,
                FormField::Score(ScoreField::Empathy),
                FormField::Score(ScoreField::Politeness),
                FormField::AvgResponseTime,
            ],
        ),
        (
            "Resolution Metrics",
            vec![
                FormField::Resolution,
                FormField::EscalationNeeded,
                FormField::FallbackFrequency,
            ],
        ),
        (
            "Overall",
            vec![FormField::Score(ScoreField::Overall), FormField::CreatedAt],
        ),
    ]
});

fn flattened_fields() -> Vec<FormField> {
    FIELDSETS
        .iter()
        .flat_map(|(_, fields)| fields.iter().copied())
        .collect()
}

pub struct AnalysisForm<'a> {
    showing: bool,
    event_tx: mpsc::UnboundedSender<Event>,
    storage: ArcStorage,

    draft: Option<ConversationAnalysis>,
    conversation_title: String,

    fields: Vec<FormField>,
    selected: usize,
    editing: Option<FormField>,
    input: InputBox<'a>,
    errors: Vec<FieldError>,
}

impl<'a> AnalysisForm<'a> {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>, storage: ArcStorage) -> AnalysisForm<'a> {
        let fields = flattened_fields();
        let selected = fields
            .iter()
            .position(FormField::editable)
            .unwrap_or_default();
        AnalysisForm {
            showing: false,
            event_tx,
            storage,
            draft: None,
            conversation_title: String::new(),
            fields,
            selected,
            editing: None,
            input: InputBox::default(),
            errors: vec![],
        }
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn open(&mut self, analysis: ConversationAnalysis, conversation_title: String) {
        self.draft = Some(analysis);
        self.conversation_title = conversation_title;
        self.selected = self
            .fields
            .iter()
            .position(FormField::editable)
            .unwrap_or_default();
        self.editing = None;
        self.errors.clear();
        self.showing = true;
    }

    pub fn close(&mut self) {
        self.showing = false;
        self.draft = None;
        self.errors.clear();
    }

    pub async fn handle_key_event(&mut self, event: &Event) -> Result<()> {
        if self.input.showing() {
            match event {
                Event::KeyboardEnter => {
                    let text = self.input.close().unwrap_or_default();
                    self.apply_edit(text.trim());
                }
                Event::KeyboardEsc | Event::KeyboardCtrlC => {
                    self.input.close();
                    self.editing = None;
                }
                _ => self.input.handle_key_event(event),
            }
            return Ok(());
        }

        match event {
            Event::KeyboardCtrlS => self.save().await,
            Event::KeyboardEsc => self.close(),
            Event::KeyboardEnter => self.activate_selected(),

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_field(),
                Key::Char('k') => self.prev_field(),
                Key::Char('q') => self.close(),
                Key::Char(' ') => self.toggle_selected(),
                _ => {}
            },

            Event::UiScrollDown => self.next_field(),
            Event::UiScrollUp => self.prev_field(),

            _ => {}
        }
        Ok(())
    }

    fn next_field(&mut self) {
        let mut i = self.selected;
        while i + 1 < self.fields.len() {
            i += 1;
            if self.fields[i].editable() {
                self.selected = i;
                return;
            }
        }
    }

    fn prev_field(&mut self) {
        let mut i = self.selected;
        while i > 0 {
            i -= 1;
            if self.fields[i].editable() {
                self.selected = i;
                return;
            }
        }
    }

    fn activate_selected(&mut self) {
        let field = self.fields[self.selected];
        let draft = match &self.draft {
            Some(draft) => draft,
            None => return,
        };

        match field {
            FormField::Score(score) => {
                self.input.set_title(score.label());
                let value = format!("{}", draft.score(score));
                self.editing = Some(field);
                self.input.open(value);
            }
            FormField::AvgResponseTime => {
                self.input.set_title(field.label());
                let value = draft
                    .avg_response_time()
                    .map(|v| format!("{}", v))
                    .unwrap_or_default();
                self.editing = Some(field);
                self.input.open(value);
            }
            FormField::FallbackFrequency => {
                self.input.set_title(field.label());
                let value = format!("{}", draft.fallback_frequency());
                self.editing = Some(field);
                self.input.open(value);
            }
            FormField::Sentiment | FormField::Resolution | FormField::EscalationNeeded => {
                self.toggle_selected()
            }
            _ => {}
        }
    }

    fn toggle_selected(&mut self) {
        let field = self.fields[self.selected];
        let draft = match &mut self.draft {
            Some(draft) => draft,
            None => return,
        };

        match field {
            FormField::Sentiment => draft.set_sentiment(draft.sentiment().next()),
            FormField::Resolution => draft.set_resolution(!draft.resolution()),
            FormField::EscalationNeeded => {
                draft.set_escalation_needed(!draft.escalation_needed())
            }
            _ => {}
        }
    }

    fn apply_edit(&mut self, text: &str) {
        let field = match self.editing.take() {
            Some(field) => field,
            None => return,
        };
        let draft = match &mut self.draft {
            Some(draft) => draft,
            None => return,
        };

        match field {
            FormField::Score(score) => match text.parse::<f64>() {
                Ok(value) => {
                    draft.set_score(score, value);
                    self.errors.retain(|e| e.field != score.name());
                }
                Err(_) => {
                    self.event_tx
                        .send(Event::Notice(NoticeMessage::warning(format!(
                            "\"{}\" is not a number",
                            text
                        ))))
                        .ok();
                }
            },
            FormField::AvgResponseTime => {
                if text.is_empty() {
                    draft.set_avg_response_time(None);
                    return;
                }
                match text.parse::<f64>() {
                    Ok(value) => draft.set_avg_response_time(Some(value)),
                    Err(_) => {
                        self.event_tx
                            .send(Event::Notice(NoticeMessage::warning(format!(
                                "\"{}\" is not a number",
                                text
                            ))))
                            .ok();
                    }
                }
            }
            FormField::FallbackFrequency => match text.parse::<i64>() {
                Ok(value) => draft.set_fallback_frequency(value),
                Err(_) => {
                    self.event_tx
                        .send(Event::Notice(NoticeMessage::warning(format!(
                            "\"{}\" is not an integer",
                            text
                        ))))
                        .ok();
                }
            },
            _ => {}
        }
    }

    async fn save(&mut self) {
        let draft = match &self.draft {
            Some(draft) => draft.clone(),
            None => return,
        };

        // Surface every offending field before touching the storage
        if let Err(err) = draft.validate() {
            self.errors = err.fields().to_vec();
            self.event_tx
                .send(Event::Notice(NoticeMessage::error(format!(
                    "Not saved: {}",
                    err
                ))))
                .ok();
            return;
        }

        match self.storage.update_analysis(draft.clone()).await {
            Ok(()) => {
                self.errors.clear();
                self.event_tx
                    .send(Event::Notice(NoticeMessage::info("Analysis saved")))
                    .ok();
                self.event_tx
                    .send(Event::AnalysisSaved(draft.conversation_id().to_string()))
                    .ok();
                self.close();
            }
            Err(err) => {
                if let Some(validation) = err.downcast_ref::<ValidationError>() {
                    self.errors = validation.fields().to_vec();
                }
                log::error!("Failed to save analysis {}: {}", draft.id(), err);
                self.event_tx
                    .send(Event::Notice(NoticeMessage::error(format!(
                        "Failed to save analysis: {}",
                        err
                    ))))
                    .ok();
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let draft = match &self.draft {
            Some(draft) => draft,
            None => return,
        };

        let instructions: Vec<Span> = vec![
            " ".into(),
            span!("j/k").green().bold(),
            span!(" to move, ").white(),
            span!("Enter").green().bold(),
            span!(" to edit/toggle, ").white(),
            span!("Ctrl+s").green().bold(),
            span!(" to save, ").white(),
            span!("q").green().bold(),
            span!(" to close ").white(),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightMagenta))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Edit Analysis ").bold())
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(instructions));

        f.render_widget(Clear, area);
        let inner = block.inner(area);
        f.render_widget(&block, area);

        let mut lines = vec![];
        let mut index = 0;
        for (section, fields) in FIELDSETS.iter() {
            lines.push(Line::from(span!(format!("{}", section)).yellow().bold()));
            for field in fields {
                lines.push(self.field_line(draft, *field, index == self.selected));
                index += 1;
            }
            lines.push(Line::default());
        }

        let paragraph = Paragraph::new(lines);
        f.render_widget(paragraph, inner);

        let input_area = input_box::build_area(inner, ((inner.width as f32 * 0.6).ceil()) as u16);
        self.input.render(f, input_area);
    }

    fn field_line<'b>(
        &self,
        draft: &ConversationAnalysis,
        field: FormField,
        selected: bool,
    ) -> Line<'b> {
        let value = match field {
            FormField::Conversation => format!(
                "{} ({})",
                self.conversation_title,
                utils::short_id(draft.conversation_id())
            ),
            FormField::Score(score) => format!("{:.1}", draft.score(score)),
            FormField::Sentiment => draft.sentiment().as_str().to_string(),
            FormField::AvgResponseTime => draft
                .avg_response_time()
                .map(|v| format!("{:.1}s", v))
                .unwrap_or_else(|| "-".to_string()),
            FormField::Resolution => yes_no(draft.resolution()),
            FormField::EscalationNeeded => yes_no(draft.escalation_needed()),
            FormField::FallbackFrequency => format!("{}", draft.fallback_frequency()),
            FormField::CreatedAt => utils::format_time(draft.created_at()),
        };

        let mut label_span = span!(format!("  {}", utils::fit_width(field.label(), 20)));
        if !field.editable() {
            label_span = label_span.dim();
        }

        let mut value_span = span!(value);
        if selected {
            value_span = value_span.add_modifier(Modifier::REVERSED);
        }

        let mut spans = vec![label_span, span!("  "), value_span];

        if let Some(column) = field.column() {
            if let Some(error) = self.errors.iter().find(|e| e.field == column) {
                spans.push(span!(format!("  ← {}", error.message)).red());
            }
        }

        Line::from(spans)
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
