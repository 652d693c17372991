use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// `3 days, 4 hours, 5 minutes, 6 seconds`
pub fn format_uptime(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    format!("{days} days, {hours} hours, {minutes} minutes, {seconds} seconds")
}

/// `H:MM:SS`, hours unbounded.
pub fn format_clock(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn format_hz(hz: u64) -> String {
    if hz >= 1_000_000_000 {
        format!("{:.2} GHz", hz as f64 / 1e9)
    } else {
        format!("{} MHz", hz / 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate_unicode("sshd", 20), "sshd");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_unicode("com.apple.WebKit.Networking", 10), "com.apple\u{2026}");
        assert_eq!(truncate_unicode("日本語テキスト", 5), "日本\u{2026}");
    }

    #[test]
    fn bytes_pick_a_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(16 << 30), "16.0 GB");
    }

    #[test]
    fn uptime_long_form() {
        let ms = ((2 * 86_400) + (3 * 3600) + (4 * 60) + 5) * 1000;
        assert_eq!(format_uptime(ms), "2 days, 3 hours, 4 minutes, 5 seconds");
        assert_eq!(format_uptime(-1), "0 days, 0 hours, 0 minutes, 0 seconds");
    }

    #[test]
    fn clock_form() {
        assert_eq!(format_clock(3_723_000), "1:02:03");
        assert_eq!(format_clock(100 * 3600 * 1000), "100:00:00");
    }

    #[test]
    fn frequencies() {
        assert_eq!(format_hz(2_500_000_000), "2.50 GHz");
        assert_eq!(format_hz(800_000_000), "800 MHz");
    }
}
