pub mod cores;
pub mod gauges;
pub mod header;
pub mod help;
pub mod host_panel;
pub mod process_table;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let snapshot = &app.snapshot;
    header::render(frame, chunks[0], snapshot, &app.theme);

    let info_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    host_panel::render_info(frame, info_row[0], snapshot.host.as_ref(), &app.theme);
    host_panel::render_stats(
        frame,
        info_row[1],
        snapshot.system.as_ref().map(|s| &s.reading),
        &app.theme,
    );

    let gauge_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    gauges::render_memory(
        frame,
        gauge_row[0],
        snapshot.memory.as_ref().map(|s| &s.reading),
        &app.theme,
    );
    gauges::render_battery(
        frame,
        gauge_row[1],
        snapshot.power.as_ref().map(|s| &s.reading),
        &app.theme,
    );

    let detail_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);
    cores::render(frame, detail_row[0], &snapshot.core_usage, &app.theme);
    process_table::render(
        frame,
        detail_row[1],
        &snapshot.processes,
        app.process_offset,
        &app.theme,
    );

    statusbar::render(frame, chunks[4], app.status_message.as_ref(), &app.theme);

    // Help overlay last so it sits on top
    if app.show_help() {
        help::render(frame, frame.area(), &app.help_entries(), &app.theme);
    }
}
