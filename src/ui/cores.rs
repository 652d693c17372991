use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, LineGauge, Paragraph};

use crate::format::format_hz;
use crate::snapshot::CoreUsage;
use crate::ui::theme::Theme;

/// One line gauge per logical core.
pub fn render(frame: &mut Frame, area: Rect, cores: &[CoreUsage], theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            " CPU Cores ",
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if cores.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                " no sample yet",
                Style::default().fg(theme.text_secondary),
            )),
            inner,
        );
        return;
    }

    let visible = cores.len().min(inner.height as usize);
    let rows = Layout::vertical(vec![Constraint::Length(1); visible]).split(inner);
    for (core, row) in cores.iter().zip(rows.iter()) {
        frame.render_widget(core_gauge(core, theme), *row);
    }
}

fn core_gauge<'a>(core: &CoreUsage, theme: &Theme) -> LineGauge<'a> {
    let (ratio, usage) = match core.busy {
        Some(busy) => (busy, format!("{:>3.0}%", busy * 100.0)),
        None => (0.0, " n/a".to_string()),
    };
    LineGauge::default()
        .filled_style(Style::default().fg(theme.gauge_filled))
        .unfilled_style(Style::default().fg(theme.gauge_unfilled))
        .ratio(ratio)
        .label(format!(
            "{:>3} {usage} {:>9} ",
            core.index,
            format_hz(core.current_frequency_hz)
        ))
}
