use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table};

use crate::format::{format_clock, truncate_unicode};
use crate::model::ProcessReading;
use crate::ui::theme::Theme;

const NAME_WIDTH: usize = 20;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    processes: &[ProcessReading],
    offset: usize,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            format!(" Active Processes ({}) ", processes.len()),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    let header = Row::new(["Name", "PID", "User", "Uptime", "CPU %"]).style(
        Style::default()
            .fg(theme.table_header)
            .add_modifier(Modifier::BOLD),
    );
    let rows = processes.iter().skip(offset).map(|p| {
        Row::new([
            Cell::from(truncate_unicode(&p.name, NAME_WIDTH)),
            Cell::from(p.pid.to_string()),
            Cell::from(truncate_unicode(&p.user, 10)),
            Cell::from(format_clock(p.uptime_ms)),
            Cell::from(format!("{:.1}", p.cpu_usage * 100.0)),
        ])
        .style(Style::default().fg(theme.text_primary))
    });

    let widths = [
        Constraint::Length(NAME_WIDTH as u16),
        Constraint::Length(7),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(6),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
