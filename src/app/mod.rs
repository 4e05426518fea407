use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use tokio::runtime::Runtime;

use crate::config::AppConfig;
use crate::storage::AppointmentGateway;
use crate::ui;

pub mod actions;
pub mod state;

pub use actions::{ActionDispatcher, SubmitOutcome};
pub use state::{AppState, FocusPane, FormMode, FormState, Notice, NoticeKind};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    FocusForm,
    FocusList,
    Refresh,
    Submit,
    EditSelected,
    DeleteSelected,
    NextField,
    PreviousField,
    Type(char),
    Erase,
}

pub struct App {
    pub config: Arc<AppConfig>,
    gateway: AppointmentGateway,
    runtime: Runtime,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, gateway: AppointmentGateway) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("building event loop runtime")?;
        let mut state = AppState::new(state::session_date(), config.ui.message_timeout());
        if gateway.is_ready() {
            let dispatcher = ActionDispatcher::new(&gateway);
            if let Err(err) = runtime.block_on(dispatcher.refresh(&mut state)) {
                tracing::error!(%err, "failed to load appointments");
            }
        }
        let tick_rate = config.ui.tick_rate();
        Ok(Self {
            config,
            gateway,
            runtime,
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.is_empty() {
                        self.list_state.select(None);
                    } else {
                        self.list_state.select(Some(self.state.selected));
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.state.expire_notice(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.handle_action(Action::Quit);
            return;
        }
        let action = match self.state.focus {
            FocusPane::Form => form_action(key),
            FocusPane::List => list_action(key),
        };
        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::FocusForm => self.state.set_focus(FocusPane::Form),
            Action::FocusList => self.state.set_focus(FocusPane::List),
            Action::Refresh => {
                let dispatcher = ActionDispatcher::new(&self.gateway);
                if let Err(err) = self.runtime.block_on(dispatcher.refresh(&mut self.state)) {
                    tracing::error!(%err, "failed to refresh appointments");
                }
            }
            Action::Submit => {
                let dispatcher = ActionDispatcher::new(&self.gateway);
                let outcome = self.runtime.block_on(dispatcher.submit(&mut self.state));
                tracing::debug!(?outcome, "form submitted");
            }
            Action::EditSelected => {
                if !self.state.edit_selected() {
                    self.state
                        .show_message("No appointment selected", NoticeKind::Info);
                }
            }
            Action::DeleteSelected => {
                let Some(id) = self.state.selected().map(|appointment| appointment.id) else {
                    return;
                };
                let dispatcher = ActionDispatcher::new(&self.gateway);
                // failures already surface as a notice
                let _ = self
                    .runtime
                    .block_on(dispatcher.delete(&mut self.state, id));
            }
            Action::NextField => self.state.form.focus_next(),
            Action::PreviousField => self.state.form.focus_previous(),
            Action::Type(ch) => self.state.form.push_char(ch),
            Action::Erase => self.state.form.pop_char(),
        }
    }
}

fn form_action(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::FocusList),
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PreviousField),
        KeyCode::Backspace => Some(Action::Erase),
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
        {
            Some(Action::Type(ch))
        }
        _ => None,
    }
}

fn list_action(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Refresh)
        }
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
        KeyCode::Char('e') | KeyCode::Enter => Some(Action::EditSelected),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteSelected),
        KeyCode::Tab | KeyCode::Esc | KeyCode::Char('i') => Some(Action::FocusForm),
        _ => None,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageOptions;
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> anyhow::Result<(TempDir, App)> {
        let temp = TempDir::new()?;
        let mut config = AppConfig::default();
        config.storage = StorageOptions::at(temp.path().join("appointments.db"));
        let gateway = AppointmentGateway::initialize(&config.storage);
        let app = App::new(Arc::new(config), gateway)?;
        Ok((temp, app))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn keyboard_flow_creates_edits_and_deletes() -> anyhow::Result<()> {
        let (_temp, mut app) = app()?;
        for value in ["Rex", "Ana", "987654321", "2030-01-01", "10:00", "cough"] {
            type_text(&mut app, value);
            app.handle_key(press(KeyCode::Tab));
        }
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.state.len(), 1);
        assert_eq!(app.state.appointments[0].pet_name, "Rex");

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.state.focus, FocusPane::List);
        app.handle_key(press(KeyCode::Char('e')));
        assert_eq!(app.state.focus, FocusPane::Form);
        assert_eq!(app.state.form.mode(), FormMode::Editing);

        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.state.form.mode(), FormMode::Creating);

        app.handle_key(press(KeyCode::Esc));
        app.handle_key(press(KeyCode::Char('d')));
        assert!(app.state.is_empty());
        Ok(())
    }

    #[test]
    fn q_types_into_form_but_quits_from_list() -> anyhow::Result<()> {
        let (_temp, mut app) = app()?;
        app.handle_key(press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.state.form.draft().pet_name, "q");

        app.handle_key(press(KeyCode::Esc));
        app.handle_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);
        Ok(())
    }
}
