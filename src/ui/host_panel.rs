use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::format::{format_hz, format_uptime};
use crate::model::{HostIdentity, SystemReading};
use crate::ui::theme::Theme;

pub fn render_info(frame: &mut Frame, area: Rect, host: Option<&HostIdentity>, theme: &Theme) {
    let lines = match host {
        Some(host) => vec![
            field("OS", host.os.clone(), theme),
            field("Name", host.code_name.clone(), theme),
            field("Version", host.version.clone(), theme),
            field("Processor", host.cpu_signature.clone(), theme),
            field(
                "Cores",
                format!(
                    "{} @ {}",
                    host.physical_cores,
                    format_hz(host.vendor_frequency_hz)
                ),
                theme,
            ),
        ],
        None => vec![placeholder(theme)],
    };
    render_panel(frame, area, " System Info ", lines, theme);
}

pub fn render_stats(
    frame: &mut Frame,
    area: Rect,
    system: Option<&SystemReading>,
    theme: &Theme,
) {
    let lines = match system {
        Some(system) => vec![
            field("Uptime", format_uptime(system.uptime_ms), theme),
            field("Processes", system.process_count.to_string(), theme),
            field("Services", system.service_count.to_string(), theme),
            field("Threads", system.thread_count.to_string(), theme),
        ],
        None => vec![placeholder(theme)],
    };
    render_panel(frame, area, " System Stats ", lines, theme);
}

fn render_panel(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {label}: "), Style::default().fg(theme.text_secondary)),
        Span::styled(value, Style::default().fg(theme.text_primary)),
    ])
}

fn placeholder(theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        " no sample yet",
        Style::default().fg(theme.text_secondary),
    ))
}
