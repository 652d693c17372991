use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::action::{Action, Direction};
use crate::snapshot::DashboardSnapshot;
use crate::store::Repository;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
}

/// Dashboard state. Holds the last snapshot read from the store; the UI
/// renders only from that.
pub struct App {
    pub running: bool,
    pub snapshot: DashboardSnapshot,
    pub theme: Theme,
    pub input_mode: InputMode,
    pub status_message: Option<(String, Instant)>,
    /// First visible row of the process table.
    pub process_offset: usize,
    repository: Option<Repository>,
}

impl App {
    pub fn new(repository: Repository, theme: Theme) -> Self {
        let mut app = App::with_snapshot(DashboardSnapshot::default(), theme);
        app.repository = Some(repository);
        app.refresh_data();
        app
    }

    /// An app over a fixed snapshot, with no store behind it.
    pub fn with_snapshot(snapshot: DashboardSnapshot, theme: Theme) -> Self {
        App {
            running: true,
            snapshot,
            theme,
            input_mode: InputMode::Normal,
            status_message: None,
            process_offset: 0,
            repository: None,
        }
    }

    pub fn refresh_data(&mut self) {
        if let Some(repo) = &self.repository {
            match DashboardSnapshot::load(repo, &self.snapshot) {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => {
                    warn!(error = %e, "dashboard refresh failed");
                    self.set_status(format!("Store read failed: {e}"));
                }
            }
        }
        self.clamp_offset();

        if let Some((_, created)) = &self.status_message
            && created.elapsed().as_secs() >= 3
        {
            self.status_message = None;
        }
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        match self.input_mode {
            InputMode::Help => match key.code {
                KeyCode::Char('?') | KeyCode::Esc => Action::ToggleHelp,
                _ => Action::None,
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('?') => Action::ToggleHelp,
                KeyCode::Char('r') => Action::Refresh,
                KeyCode::Char('t') => Action::CycleTheme,
                KeyCode::Up | KeyCode::Char('k') => Action::Navigate(Direction::Up),
                KeyCode::Down | KeyCode::Char('j') => Action::Navigate(Direction::Down),
                _ => Action::None,
            },
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Navigate(Direction::Up) => {
                self.process_offset = self.process_offset.saturating_sub(1);
            }
            Action::Navigate(Direction::Down) => {
                self.process_offset += 1;
                self.clamp_offset();
            }
            Action::ToggleHelp => {
                self.input_mode = match self.input_mode {
                    InputMode::Normal => InputMode::Help,
                    InputMode::Help => InputMode::Normal,
                };
            }
            Action::CycleTheme => {
                self.theme = self.theme.next();
                self.set_status(format!("Theme: {}", self.theme.name));
            }
            Action::Refresh => {
                self.refresh_data();
            }
            Action::None => {}
        }
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        vec![
            ("q/Esc".to_string(), "Quit"),
            ("r".to_string(), "Refresh now"),
            ("t".to_string(), "Cycle theme"),
            ("↑↓ j/k".to_string(), "Scroll processes"),
            ("?".to_string(), "Toggle help"),
            ("Ctrl+C".to_string(), "Quit (always)"),
        ]
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    fn clamp_offset(&mut self) {
        let last = self.snapshot.processes.len().saturating_sub(1);
        self.process_offset = self.process_offset.min(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HostIdentity, ProcessReading};
    use crate::store::Store;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_processes(n: u32) -> App {
        let snapshot = DashboardSnapshot {
            processes: (1..=n)
                .map(|pid| ProcessReading {
                    pid,
                    name: format!("proc_{pid}"),
                    user: "tester".into(),
                    start_time_ms: 0,
                    uptime_ms: 0,
                    cpu_usage: 0.0,
                })
                .collect(),
            ..DashboardSnapshot::default()
        };
        App::with_snapshot(snapshot, Theme::dark())
    }

    #[test]
    fn quit_keys() {
        let app = app_with_processes(0);
        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(app.map_key(key(KeyCode::Esc)), Action::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.map_key(ctrl_c), Action::Quit);
    }

    #[test]
    fn help_mode_swallows_other_keys() {
        let mut app = app_with_processes(0);
        app.dispatch(app.map_key(key(KeyCode::Char('?'))));
        assert!(app.show_help());
        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::None);
        app.dispatch(app.map_key(key(KeyCode::Esc)));
        assert!(!app.show_help());
        assert!(app.running);
    }

    #[test]
    fn scrolling_stays_inside_the_table() {
        let mut app = app_with_processes(3);
        app.dispatch(Action::Navigate(Direction::Up));
        assert_eq!(app.process_offset, 0);
        for _ in 0..5 {
            app.dispatch(Action::Navigate(Direction::Down));
        }
        assert_eq!(app.process_offset, 2);
    }

    #[test]
    fn cycle_theme_reports_the_new_theme() {
        let mut app = app_with_processes(0);
        app.dispatch(Action::CycleTheme);
        assert_eq!(app.theme.name, "mono");
        assert_eq!(
            app.status_message.as_ref().map(|(m, _)| m.as_str()),
            Some("Theme: mono")
        );
    }

    #[test]
    fn refresh_reads_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("metrik.db"));
        store.ensure_schema().unwrap();
        let repo = Repository::new(store);
        repo.insert_host(&HostIdentity {
            os: "Linux".into(),
            code_name: "Focal".into(),
            version: "20.04".into(),
            cpu_signature: "Intel i7".into(),
            physical_cores: 4,
            vendor_frequency_hz: 1,
        })
        .unwrap();

        let app = App::new(repo, Theme::dark());
        assert_eq!(app.snapshot.host.as_ref().map(|h| h.version.as_str()), Some("20.04"));
        assert!(app.status_message.is_none());
    }

    #[test]
    fn refresh_failure_keeps_the_last_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("metrik.db"));
        store.ensure_schema().unwrap();
        let mut app = App::new(Repository::new(store.clone()), Theme::dark());
        app.snapshot.processes = app_with_processes(2).snapshot.processes;

        std::fs::remove_file(store.path()).unwrap();
        app.dispatch(Action::Refresh);
        assert_eq!(app.snapshot.processes.len(), 2);
        let status = app.status_message.as_ref().map(|(m, _)| m.clone());
        assert!(status.is_some_and(|m| m.starts_with("Store read failed")));
    }
}
