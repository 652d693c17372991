use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};

use crate::format::{format_bytes, format_clock};
use crate::model::{MemoryReading, PowerReading};
use crate::ui::theme::Theme;

pub fn render_memory(
    frame: &mut Frame,
    area: Rect,
    memory: Option<&MemoryReading>,
    theme: &Theme,
) {
    let block = titled_block(" Memory ", theme);
    let Some(memory) = memory.filter(|m| m.total_bytes > 0) else {
        frame.render_widget(empty(block, "no sample yet", theme), area);
        return;
    };

    let used = memory.total_bytes.saturating_sub(memory.available_bytes);
    let ratio = (used as f64 / memory.total_bytes as f64).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(
            Style::default()
                .fg(theme.gauge_filled)
                .bg(theme.gauge_unfilled),
        )
        .ratio(ratio)
        .label(format!(
            "{}/{} ({:.0}%)",
            format_bytes(used),
            format_bytes(memory.total_bytes),
            ratio * 100.0
        ));
    frame.render_widget(gauge, area);
}

pub fn render_battery(frame: &mut Frame, area: Rect, power: Option<&PowerReading>, theme: &Theme) {
    let block = titled_block(" Battery ", theme);
    let Some(power) = power else {
        frame.render_widget(empty(block, "no battery", theme), area);
        return;
    };

    let ratio = power.remaining_capacity.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(
            Style::default()
                .fg(theme.charge_color(ratio))
                .bg(theme.gauge_unfilled),
        )
        .ratio(ratio)
        .label(battery_label(power));
    frame.render_widget(gauge, area);
}

fn battery_label(power: &PowerReading) -> String {
    let mut label = format!("{:.0}%", power.remaining_capacity * 100.0);
    label.push_str(if power.charging {
        " charging"
    } else {
        " on battery"
    });
    if power.remaining_seconds >= 0.0 {
        let ms = (power.remaining_seconds * 1000.0) as i64;
        label.push_str(&format!(" {} left", format_clock(ms)));
    }
    if power.temperature_c > 0.0 {
        label.push_str(&format!(" {:.1}°C", power.temperature_c));
    }
    label
}

fn titled_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ))
}

fn empty<'a>(block: Block<'a>, text: &'a str, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(Span::styled(
        format!(" {text}"),
        Style::default().fg(theme.text_secondary),
    ))
    .block(block)
}
