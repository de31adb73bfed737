//! TUI application state and event loop.
//!
//! Everything runs on one thread: a current-thread tokio runtime drives a
//! `LocalSet` that hosts the dashboard's fetch tasks, and the key loop yields
//! to them between frames.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use livedash_core::{Dashboard, PollMode, Transport};

/// Redraw period; fetch tasks run while the loop sleeps.
const TICK: Duration = Duration::from_millis(50);

/// Which part of the screen receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Controls,
    Input,
}

pub struct App<T> {
    dash: Dashboard<T>,
    initial_mode: PollMode,
    running: bool,
    focus: Focus,
}

impl<T: Transport + 'static> App<T> {
    pub fn new(dash: Dashboard<T>, initial_mode: PollMode) -> Self {
        Self {
            dash,
            initial_mode,
            running: true,
            focus: Focus::default(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let local = tokio::task::LocalSet::new();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = local.block_on(&rt, self.run_loop(&mut terminal));

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook(); // remove our hook
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    async fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.start();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press
                {
                    self.handle_key(key.code);
                }
            }

            tokio::time::sleep(TICK).await;
        }

        Ok(())
    }

    /// Enter the initial mode. Manual and active modes fetch once right away.
    fn start(&self) {
        match self.initial_mode {
            PollMode::Manual => {
                self.dash.refresh_requested();
            }
            PollMode::ActiveAuto => {
                self.dash.mode_changed(PollMode::ActiveAuto);
                self.dash.refresh_requested();
            }
            PollMode::PassiveAuto => {
                self.dash.mode_changed(PollMode::PassiveAuto);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match self.focus {
            Focus::Controls => self.handle_control_key(key),
            Focus::Input => self.handle_input_key(key),
        }
    }

    fn handle_control_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('m') => {
                let next = self.mode().next();
                self.dash.mode_changed(next);
            }
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(mode) = PollMode::from_position(c as usize - '1' as usize) {
                    self.dash.mode_changed(mode);
                }
            }
            KeyCode::Char('r') | KeyCode::F(5) => {
                let manual = self.dash.state().controller().manual_controls_visible();
                if manual {
                    self.dash.refresh_requested();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Tab | KeyCode::Char('i') | KeyCode::Enter => {
                let has_options = !self.dash.state().options().is_empty();
                if has_options {
                    self.focus = Focus::Input;
                }
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Controls,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.dash.pop_input(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char(c) => {
                self.dash.push_input(c);
            }
            _ => {}
        }
    }

    fn move_selection(&self, delta: isize) {
        let (count, current) = {
            let st = self.dash.state();
            (st.options().len(), st.selected())
        };
        if count == 0 {
            return;
        }
        let next = match current {
            Some(k) => (k as isize + delta).rem_euclid(count as isize) as usize,
            None => 0,
        };
        if let Err(e) = self.dash.selection_changed(next) {
            log::warn!("selection {next}: {e}");
        }
    }

    fn submit(&self) {
        let ready = self.dash.state().can_submit();
        if !ready {
            return;
        }
        let dash = self.dash.clone();
        tokio::task::spawn_local(async move {
            // Outcome is recorded as dashboard status text.
            let _ = dash.submit_mutation().await;
        });
    }

    // ---- accessors for the UI ----

    pub fn dashboard(&self) -> &Dashboard<T> {
        &self.dash
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn mode(&self) -> PollMode {
        self.dash.state().controller().mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedash_core::{DashConfig, InputHint, MutationRequest, TransportError};
    use tokio::task::LocalSet;

    struct Canned(&'static str);

    impl Transport for Canned {
        async fn fetch_metrics(&self) -> Result<String, TransportError> {
            Ok(self.0.to_string())
        }

        async fn submit_mutation(
            &self,
            _request: &MutationRequest,
        ) -> Result<String, TransportError> {
            Ok(r#"{"success": true}"#.to_string())
        }

        async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Status(404))
        }
    }

    const BODY: &str = r#"{"success": true, "data": [
        {"name": "setpoint", "visual": "text", "screenLocation": 1, "dataType": "float", "modifiable": true, "values": [21.5]},
        {"name": "fanSpeed", "visual": "bar", "screenLocation": 2, "dataType": "integer", "modifiable": true, "values": [3, 4]}
    ]}"#;

    fn app() -> App<Canned> {
        App::new(Dashboard::new(Canned(BODY), DashConfig::default()), PollMode::Manual)
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut a = app();
        a.handle_key(KeyCode::Char('q'));
        assert!(!a.running);
    }

    #[test]
    fn input_focus_needs_options() {
        let mut a = app();
        a.handle_key(KeyCode::Tab);
        assert_eq!(a.focus(), Focus::Controls);
    }

    #[tokio::test(start_paused = true)]
    async fn mode_keys_drive_the_controller() {
        let mut a = app();
        LocalSet::new()
            .run_until(async {
                a.handle_key(KeyCode::Char('m'));
                assert_eq!(a.mode(), PollMode::ActiveAuto);
                a.handle_key(KeyCode::Char('3'));
                assert_eq!(a.mode(), PollMode::PassiveAuto);
                assert!(a.dashboard().state().controller().is_looping());
                a.handle_key(KeyCode::Char('1'));
                assert!(!a.dashboard().state().controller().is_looping());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn typing_follows_the_selected_metric() {
        let mut a = app();
        LocalSet::new()
            .run_until(async {
                a.dashboard().refresh().await;
                a.handle_key(KeyCode::Tab);
                assert_eq!(a.focus(), Focus::Input);
                assert_eq!(a.dashboard().state().input_hint(), InputHint::Decimal);

                for c in "2.5x".chars() {
                    a.handle_key(KeyCode::Char(c));
                }
                assert_eq!(a.dashboard().state().input(), "2.5");

                a.handle_key(KeyCode::Down);
                let st = a.dashboard().state();
                assert_eq!(st.selected(), Some(1));
                assert_eq!(st.input_hint(), InputHint::Integer);
                assert_eq!(st.input(), "");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn enter_submits_and_reports_status() {
        let mut a = app();
        LocalSet::new()
            .run_until(async {
                a.dashboard().refresh().await;
                a.handle_key(KeyCode::Tab);
                a.handle_key(KeyCode::Char('4'));
                a.handle_key(KeyCode::Enter);
                tokio::time::sleep(Duration::from_millis(1)).await;
            })
            .await;
        assert!(a.dashboard().state().status().unwrap().contains("setpoint"));
    }
}
