use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::stepper::SystemClock;
use crate::ui;
use crate::window::WindowEngine;

pub mod state;
mod viewport;

pub use state::{AppState, PickerKind, PickerOverlay};
pub use viewport::{Viewport, ViewportWatcher};

enum Action {
    Quit,
    CursorDown,
    CursorUp,
    PageDown,
    PageUp,
    Select,
    JumpToSelection,
    OpenRanges,
    OpenSizes,
}

pub struct App {
    pub config: Arc<AppConfig>,
    state: AppState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let engine = WindowEngine::new(
            config.configuration(),
            config.engine_options(),
            SystemClock,
        );
        tracing::info!(
            range = %config.range_key(),
            size = %config.size_key(),
            budget = config.scroll_budget,
            "starting picker"
        );
        Self {
            tick_rate: config.tick_rate(),
            config,
            state: AppState::new(engine),
            should_quit: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            let area = terminal.size().context("reading terminal size")?;
            self.state.resize(ui::list_capacity(area));
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.tick_rate).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next iteration re-measures the list area
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::CursorDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::CursorUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Select),
            KeyCode::Char('g') if plain => Some(Action::JumpToSelection),
            KeyCode::Char('r') if plain => Some(Action::OpenRanges),
            KeyCode::Char('s') if plain => Some(Action::OpenSizes),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        let page = self.state.viewport().rows() as isize;
        match action {
            Action::Quit => self.should_quit = true,
            Action::CursorDown => self.state.move_cursor(1),
            Action::CursorUp => self.state.move_cursor(-1),
            Action::PageDown => self.state.move_cursor(page),
            Action::PageUp => self.state.move_cursor(-page),
            Action::Select => self.state.select_cursor(),
            Action::JumpToSelection => self.state.jump_to_selection(),
            Action::OpenRanges => self.state.open_picker(PickerKind::Range),
            Action::OpenSizes => self.state.open_picker(PickerKind::Size),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        if self.state.overlay().is_none() {
            return false;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state.close_overlay(),
            KeyCode::Enter | KeyCode::Char(' ') => self.state.picker_confirm(),
            KeyCode::Char('j') | KeyCode::Down => self.state.picker_move(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.picker_move(-1),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            _ => {}
        }
        true
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
