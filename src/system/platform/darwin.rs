//! Parsers for Darwin tool and kernel output, kept free of FFI so they build
//! and test on every host.

use crate::model::{CoreTicks, PowerReading};

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;
const CPU_STATE_MAX: usize = 4;

/// Split the flat `PROCESSOR_CPU_LOAD_INFO` array into per-core ticks.
/// Counters are unsigned in the kernel; a trailing partial record is dropped.
pub fn load_info_ticks(info: &[i32]) -> Vec<(u32, CoreTicks)> {
    info.chunks_exact(CPU_STATE_MAX)
        .enumerate()
        .map(|(core, states)| {
            let tick = |state: usize| u64::from(states[state] as u32);
            let ticks = CoreTicks {
                user: tick(CPU_STATE_USER),
                nice: tick(CPU_STATE_NICE),
                system: tick(CPU_STATE_SYSTEM),
                idle: tick(CPU_STATE_IDLE),
                ..CoreTicks::default()
            };
            (core as u32, ticks)
        })
        .collect()
}

/// Parse `pmset -g batt`. Returns `None` when no internal battery is listed.
///
/// ```text
/// Now drawing from 'Battery Power'
///  -InternalBattery-0 (id=4653155)	85%; discharging; 4:12 remaining present: true
/// ```
pub fn parse_pmset_battery(output: &str) -> Option<PowerReading> {
    let line = output.lines().find(|l| l.contains("InternalBattery"))?;
    let (_, status) = line.split_once(')')?;
    let mut fields = status.split(';').map(str::trim);

    let percent: f64 = fields.next()?.strip_suffix('%')?.trim().parse().ok()?;
    let state = fields.next().unwrap_or_default();
    let remaining_seconds = fields
        .next()
        .and_then(|f| f.split_whitespace().next())
        .and_then(parse_hours_minutes)
        .unwrap_or(-1.0);

    Some(PowerReading {
        remaining_capacity: (percent / 100.0).clamp(0.0, 1.0),
        remaining_seconds,
        temperature_c: 0.0,
        charging: matches!(state, "charging" | "finishing charge"),
    })
}

fn parse_hours_minutes(s: &str) -> Option<f64> {
    let (hours, minutes) = s.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    Some(f64::from(hours * 3600 + minutes * 60))
}

/// Marketing name for a macOS product version such as `14.5`.
pub fn code_name(product_version: &str) -> Option<&'static str> {
    let major: u32 = product_version.trim().split('.').next()?.parse().ok()?;
    let name = match major {
        11 => "Big Sur",
        12 => "Monterey",
        13 => "Ventura",
        14 => "Sonoma",
        15 => "Sequoia",
        26 => "Tahoe",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCHARGING: &str = "Now drawing from 'Battery Power'\n \
        -InternalBattery-0 (id=4653155)\t85%; discharging; 4:12 remaining present: true\n";

    #[test]
    fn discharging_battery() {
        let power = parse_pmset_battery(DISCHARGING).unwrap();
        assert!((power.remaining_capacity - 0.85).abs() < 1e-9);
        assert_eq!(power.remaining_seconds, 15_120.0);
        assert!(!power.charging);
        assert_eq!(power.temperature_c, 0.0);
    }

    #[test]
    fn charging_without_estimate() {
        let output = "Now drawing from 'AC Power'\n \
            -InternalBattery-0 (id=1)\t40%; charging; (no estimate) present: true\n";
        let power = parse_pmset_battery(output).unwrap();
        assert!(power.charging);
        assert_eq!(power.remaining_seconds, -1.0);
    }

    #[test]
    fn desktop_without_battery() {
        assert!(parse_pmset_battery("Now drawing from 'AC Power'\n").is_none());
        assert!(parse_pmset_battery("").is_none());
    }

    #[test]
    fn load_info_is_split_per_core() {
        let info = [10, 20, 300, 4, 11, 21, 301, 5, 99];
        let ticks = load_info_ticks(&info);
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1].0, 1);
        let core = ticks[1].1;
        assert_eq!((core.user, core.system, core.idle, core.nice), (11, 21, 301, 5));
        assert_eq!(core.io_wait, 0);
    }

    #[test]
    fn wrapped_counters_read_as_unsigned() {
        let ticks = load_info_ticks(&[-1, 0, 0, 0]);
        assert_eq!(ticks[0].1.user, u64::from(u32::MAX));
    }

    #[test]
    fn product_versions_map_to_names() {
        assert_eq!(code_name("14.5"), Some("Sonoma"));
        assert_eq!(code_name("26.0.1"), Some("Tahoe"));
        assert_eq!(code_name("10.15.7"), None);
        assert_eq!(code_name("garbage"), None);
    }
}
