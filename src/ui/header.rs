use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::snapshot::DashboardSnapshot;
use crate::ui::theme::Theme;

pub fn render(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(
        " metrik ",
        Style::default()
            .fg(theme.header_accent_fg)
            .bg(theme.header_accent_bg)
            .add_modifier(Modifier::BOLD),
    )];

    match &snapshot.host {
        Some(host) => spans.extend([
            Span::raw("  "),
            Span::styled(
                format!("{} {}", host.os, host.version),
                Style::default()
                    .fg(theme.accent_mauve)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        None => spans.push(Span::styled(
            "  waiting for the collector",
            Style::default().fg(theme.text_secondary),
        )),
    }

    spans.extend([
        Span::raw("  "),
        Span::styled(
            format!("Procs: {}", snapshot.processes.len()),
            Style::default().fg(theme.text_secondary),
        ),
    ]);
    if let Some(at) = snapshot.updated_at() {
        spans.extend([
            Span::raw("  "),
            Span::styled(
                format!("Sample: {at}"),
                Style::default().fg(theme.text_secondary),
            ),
        ]);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}
