use crate::models::Event;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Padding, Widget},
};
use tui_textarea::{CursorMove, TextArea};

/// One-line text entry popup, used for search terms and field edits.
pub struct InputBox<'a> {
    showing: bool,
    input: TextArea<'a>,

    title: String,
    placeholder: String,
}

impl<'a> InputBox<'a> {
    pub fn with_title(mut self, title: &str) -> InputBox<'a> {
        if !title.is_empty() {
            self.title = title.to_string();
        }
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> InputBox<'a> {
        if !placeholder.is_empty() {
            self.placeholder = placeholder.to_string();
        }
        self
    }

    pub fn set_title(&mut self, title: &str) {
        if !title.is_empty() {
            self.title = title.to_string();
        }
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn open(&mut self, text: impl Into<String>) {
        self.input = self.build_input(text.into());
        self.showing = true;
    }

    /// Closes the box and returns its current text, if it was open.
    pub fn close(&mut self) -> Option<String> {
        if !self.showing {
            return None;
        }
        self.showing = false;
        Some(self.input.lines().join("\n"))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        f.render_widget(Clear, area);
        self.input.render(area, f.buffer_mut());
    }

    pub fn handle_key_event(&mut self, event: &Event) {
        if let Event::KeyboardCharInput(input) = event {
            self.input.input(input.clone());
        }
    }

    fn build_input(&self, text: String) -> TextArea<'a> {
        let mut text_area = TextArea::new(vec![text]);
        let block = Block::default()
            .title(Line::from(self.title.clone()).bold())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightMagenta))
            .padding(Padding::symmetric(1, 0));
        text_area.set_block(block);
        text_area.set_placeholder_text(&self.placeholder);
        text_area.move_cursor(CursorMove::End);
        text_area
    }
}

impl Default for InputBox<'_> {
    fn default() -> Self {
        Self {
            showing: false,
            input: TextArea::default(),
            title: "Input".to_string(),
            placeholder: "Type here...".to_string(),
        }
    }
}

/// Centers a 3-row input strip of the given width inside `area`.
pub fn build_area(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height.saturating_sub(1)) / 2;
    Rect::new(x, y, width, 3)
}
