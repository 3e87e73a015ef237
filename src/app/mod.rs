use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use ratatui::Terminal;
use time::Date;

use crate::config::AppConfig;
use crate::model::{today, JobApplication};
use crate::storage::StorageHandle;
use crate::ui;

mod actions;
pub mod dashboard;
pub mod state;

pub use actions::ActionDispatcher;
pub use dashboard::Dashboard;
pub use state::{Context, Effect, FormField, FormState, Mode, Transition, UiEvent, ViewState};

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    records: Vec<JobApplication>,
    view: ViewState,
    dashboard: Dashboard,
    table_state: TableState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let records = storage
            .read_all()
            .context("loading applications for initial state")?;
        let view = ViewState::new(config.dashboard.window_days, today());
        let tick_rate = Duration::from_millis(config.dashboard.tick_rate_ms.max(16));
        let mut app = Self {
            config,
            storage,
            records,
            view,
            dashboard: Dashboard::default(),
            table_state: TableState::default(),
            should_quit: false,
            tick_rate,
        };
        app.rebuild();
        if app.records.is_empty() {
            app.view
                .set_status_message("No applications found. Press `a` to add one.");
        }
        Ok(app)
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
                    if self.dashboard.visible.is_empty() {
                        self.table_state.select(None);
                    } else {
                        self.table_state.select(Some(self.view.selected));
                    }
                    ui::draw_dashboard(
                        frame,
                        &self.view,
                        &self.dashboard,
                        &self.config.palette,
                        &mut self.table_state,
                    );
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
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw picks up the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(event) = translate_key(key) {
            self.dispatch(event);
        }
    }

    /// Feeds one event through the reducer and runs whatever it asks for.
    pub fn dispatch(&mut self, event: UiEvent) {
        let today = today();
        let ctx = Context {
            visible: &self.dashboard.visible,
            today,
        };
        let view = std::mem::replace(&mut self.view, ViewState::new(0, today));
        let criteria_before = view.criteria.clone();
        let Transition { state, effect } = view.handle(event, &ctx);
        self.view = state;

        match effect {
            Some(effect) => self.apply_effect(effect, today),
            None if self.view.criteria != criteria_before => self.rebuild(),
            None => {}
        }
    }

    fn apply_effect(&mut self, effect: Effect, today: Date) {
        let dispatcher = ActionDispatcher::new(&self.storage, &self.config.export);
        let saves_form = matches!(effect, Effect::Create(_) | Effect::Update { .. });
        let (outcome, reload) = match effect {
            Effect::Quit => {
                self.should_quit = true;
                return;
            }
            Effect::Refresh => (Ok("Reloaded applications".to_string()), true),
            Effect::Export => (dispatcher.export(&self.dashboard.visible, today), false),
            Effect::Create(draft) => (dispatcher.create(&draft), true),
            Effect::Update { id, draft } => (dispatcher.update(id, &draft), true),
            Effect::Delete(id) => (dispatcher.delete(id), true),
        };
        match outcome {
            Ok(message) => {
                if saves_form {
                    self.view.close_form();
                }
                self.view.set_status_message(message);
                if reload {
                    self.reload();
                }
            }
            // a failed write leaves the store as it was, so no reload
            Err(err) => {
                tracing::error!(error = ?err, "dashboard action failed");
                if saves_form {
                    self.view.reject_form(format!("{err:#}"));
                }
                self.view.set_status_message(format!("Error: {err:#}"));
            }
        }
    }

    fn reload(&mut self) {
        match self.storage.read_all() {
            Ok(records) => self.records = records,
            Err(err) => {
                tracing::error!(error = ?err, "failed to reload applications");
                self.view
                    .set_status_message(format!("Failed to reload applications: {err}"));
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.dashboard = Dashboard::build(
            &self.records,
            &self.view.criteria,
            self.config.dashboard.top_companies,
        );
        self.view.clamp_selection(self.dashboard.visible.len());
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

fn translate_key(key: KeyEvent) -> Option<UiEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(UiEvent::Quit),
            KeyCode::Char('s') => Some(UiEvent::Submit),
            KeyCode::Char('r') => Some(UiEvent::Refresh),
            _ => None,
        };
    }
    let event = match key.code {
        KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) => {
            UiEvent::Char(ch)
        }
        KeyCode::Enter => UiEvent::Enter,
        KeyCode::Esc => UiEvent::Esc,
        KeyCode::Backspace => UiEvent::Backspace,
        KeyCode::Up => UiEvent::Up,
        KeyCode::Down => UiEvent::Down,
        KeyCode::Left => UiEvent::Left,
        KeyCode::Right => UiEvent::Right,
        KeyCode::Tab => UiEvent::Tab,
        KeyCode::BackTab => UiEvent::BackTab,
        _ => return None,
    };
    Some(event)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
