use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::Result;
use ratatui::crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    layout::{Constraint, Direction, Layout},
    prelude::{Backend, CrosstermBackend},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
};
use ratatui_macros::span;
use tokio_util::sync::CancellationToken;
use tui_textarea::Key;

use crate::models::{ConversationOverview, Event};
use crate::storage::ArcStorage;

use super::services::EventService;
use super::ui::{AnalysesScreen, ConversationsScreen, MessagesScreen, Notice, utils};

const MIN_WIDTH: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Conversations,
    Messages,
    Analyses,
}

impl Tab {
    fn index(&self) -> usize {
        match self {
            Tab::Conversations => 0,
            Tab::Messages => 1,
            Tab::Analyses => 2,
        }
    }

    fn next(&self) -> Tab {
        match self {
            Tab::Conversations => Tab::Messages,
            Tab::Messages => Tab::Analyses,
            Tab::Analyses => Tab::Conversations,
        }
    }

    fn prev(&self) -> Tab {
        match self {
            Tab::Conversations => Tab::Analyses,
            Tab::Messages => Tab::Conversations,
            Tab::Analyses => Tab::Messages,
        }
    }
}

pub struct InitProps {
    pub conversations: Vec<ConversationOverview>,
}

pub struct App<'a> {
    events: &'a mut EventService,

    tab: Tab,
    conversations_screen: ConversationsScreen<'a>,
    messages_screen: MessagesScreen<'a>,
    analyses_screen: AnalysesScreen<'a>,

    notice: Notice,
    cancel_token: CancellationToken,
}

impl<'a> App<'a> {
    pub fn new(
        events: &'a mut EventService,
        storage: ArcStorage,
        cancel_token: CancellationToken,
        init_props: InitProps,
    ) -> App<'a> {
        let event_tx = events.event_tx();
        App {
            conversations_screen: ConversationsScreen::new(event_tx.clone(), storage.clone())
                .with_conversations(init_props.conversations),
            messages_screen: MessagesScreen::new(event_tx.clone(), storage.clone()),
            analyses_screen: AnalysesScreen::new(event_tx.clone(), storage),
            events,
            tab: Tab::Conversations,
            notice: Notice::default(),
            cancel_token,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let term_backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(term_backend)?;
        let result = self.start_loop(&mut terminal).await;

        self.cancel_token.cancel();

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;

        terminal.show_cursor()?;
        result
    }

    async fn start_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.render(terminal)?;
            if self.handle_key_event().await {
                return Ok(());
            }
        }
    }

    async fn handle_key_event(&mut self) -> bool {
        let event = self.events.next().await;

        match &event {
            Event::Quit => return true,

            Event::Notice(msg) => {
                self.notice.add_message(msg.clone());
                return false;
            }

            Event::ConversationDeleted(id) => {
                log::info!("Conversation {} deleted", id);
                self.notice.info("Conversation deleted");
                self.conversations_screen.reload().await;
                if self.messages_screen.loaded() {
                    self.messages_screen.reload().await;
                }
                if self.analyses_screen.loaded() {
                    self.analyses_screen.reload().await;
                }
                return false;
            }

            Event::AnalysisSaved(id) => {
                log::info!("Analysis for conversation {} saved", id);
                self.analyses_screen.reload().await;
                self.conversations_screen.reload().await;
                return false;
            }

            Event::Refresh => {
                // Skip the background refresh while a popup is open so it
                // cannot pull rows out from under the operator
                if !self.capturing() {
                    self.reload_current().await;
                }
                return false;
            }

            Event::UiTick => return false,

            _ => {}
        }

        if self.capturing() {
            self.route(&event).await;
            return false;
        }

        match &event {
            Event::KeyboardTab => self.switch_tab(self.tab.next()).await,
            Event::KeyboardBackTab => self.switch_tab(self.tab.prev()).await,
            Event::KeyboardCtrlR => self.reload_current().await,
            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('1') => self.switch_tab(Tab::Conversations).await,
                Key::Char('2') => self.switch_tab(Tab::Messages).await,
                Key::Char('3') => self.switch_tab(Tab::Analyses).await,
                _ => self.route(&event).await,
            },
            _ => self.route(&event).await,
        }
        false
    }

    fn capturing(&self) -> bool {
        match self.tab {
            Tab::Conversations => self.conversations_screen.capturing(),
            Tab::Messages => self.messages_screen.capturing(),
            Tab::Analyses => self.analyses_screen.capturing(),
        }
    }

    async fn route(&mut self, event: &Event) {
        let result = match self.tab {
            Tab::Conversations => self.conversations_screen.handle_key_event(event).await,
            Tab::Messages => self.messages_screen.handle_key_event(event).await,
            Tab::Analyses => self.analyses_screen.handle_key_event(event).await,
        };
        if let Err(err) = result {
            log::error!("Failed to handle event: {}", err);
            self.notice.error(format!("{}", err));
        }
    }

    async fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        let loaded = match self.tab {
            Tab::Conversations => self.conversations_screen.loaded(),
            Tab::Messages => self.messages_screen.loaded(),
            Tab::Analyses => self.analyses_screen.loaded(),
        };
        if !loaded {
            self.reload_current().await;
        }
    }

    async fn reload_current(&mut self) {
        match self.tab {
            Tab::Conversations => self.conversations_screen.reload().await,
            Tab::Messages => self.messages_screen.reload().await,
            Tab::Analyses => self.analyses_screen.reload().await,
        }
    }

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            let current_width = f.area().width;
            if current_width < MIN_WIDTH {
                let message = format!(
                    "I'm too small, make me bigger! I need at least {} cells (current: {})",
                    MIN_WIDTH, current_width
                );
                let lines: Vec<Line> =
                    utils::wrap_text(&message, current_width.saturating_sub(2) as usize)
                        .into_iter()
                        .map(Line::from)
                        .collect();
                f.render_widget(Paragraph::new(lines), f.area());
                return;
            }

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(f.area());

            let tabs = Tabs::new(vec![
                " 1 Conversations ",
                " 2 Messages ",
                " 3 Analyses ",
            ])
            .select(self.tab.index())
            .style(Style::default().dim())
            .highlight_style(Style::default().not_dim().yellow().bold());
            f.render_widget(tabs, layout[0]);

            match self.tab {
                Tab::Conversations => self.conversations_screen.render(f, layout[1]),
                Tab::Messages => self.messages_screen.render(f, layout[1]),
                Tab::Analyses => self.analyses_screen.render(f, layout[1]),
            }

            let help: Vec<Span> = vec![
                span!(" Tab").green().bold(),
                span!(" switch pane · ").dim(),
                span!("Ctrl+r").green().bold(),
                span!(" reload · ").dim(),
                span!("Ctrl+q").green().bold(),
                span!(" quit").dim(),
            ];
            f.render_widget(Paragraph::new(Line::from(help)), layout[2]);

            self.notice.render(f, utils::notice_area(f.area(), 30));
        })?;
        Ok(())
    }
}
