use std::fs;
use std::path::Path;

use super::PlatformExtensions;
use crate::model::{CoreTicks, PowerReading};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn os_code_name() -> Option<String> {
        let contents = fs::read_to_string("/etc/os-release").ok()?;
        parse_os_release_code_name(&contents)
    }

    fn core_ticks() -> Option<Vec<(u32, CoreTicks)>> {
        let contents = fs::read_to_string("/proc/stat").ok()?;
        Some(parse_proc_stat(&contents))
    }

    fn core_max_frequency_hz(core: u32) -> Option<u64> {
        // Reported in kHz
        let path = format!("/sys/devices/system/cpu/cpu{core}/cpufreq/cpuinfo_max_freq");
        let khz: u64 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
        Some(khz * 1000)
    }

    fn power_source() -> Option<PowerReading> {
        let entries = fs::read_dir("/sys/class/power_supply").ok()?;
        for entry in entries.flatten() {
            let dir = entry.path();
            let attr = |name: &str| read_attr(&dir, name);
            if attr("type").as_deref() == Some("Battery") {
                return battery_reading(attr);
            }
        }
        None
    }

    fn process_thread_count(pid: u32) -> Option<u32> {
        let path = format!("/proc/{pid}/stat");
        let contents = fs::read_to_string(path).ok()?;
        // comm may contain spaces and parens, so split after the last ')'
        let after_comm = contents.rfind(')')? + 1;
        let fields: Vec<&str> = contents[after_comm..].split_whitespace().collect();
        // state(0) ... priority(15) nice(16) num_threads(17)
        fields.get(17)?.parse().ok()
    }

    fn service_count() -> Option<u32> {
        // systemd keeps one invocation link per active unit
        let entries = fs::read_dir("/run/systemd/units").ok()?;
        let count = entries
            .flatten()
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.starts_with("invocation:") && name.ends_with(".service")
            })
            .count();
        Some(count as u32)
    }
}

fn read_attr(dir: &Path, name: &str) -> Option<String> {
    fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.trim().to_string())
}

fn parse_os_release_code_name(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        line.strip_prefix("VERSION_CODENAME=")
            .map(|v| v.trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

fn parse_proc_stat(contents: &str) -> Vec<(u32, CoreTicks)> {
    let mut cores = Vec::new();
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        // "cpu" alone is the aggregate line
        let Some(index) = label.strip_prefix("cpu").and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        let values: Vec<u64> = parts.map(|v| v.parse().unwrap_or(0)).collect();
        let at = |i: usize| values.get(i).copied().unwrap_or(0);
        cores.push((
            index,
            CoreTicks {
                user: at(0),
                nice: at(1),
                system: at(2),
                idle: at(3),
                io_wait: at(4),
                irq: at(5),
                soft_irq: at(6),
                steal: at(7),
            },
        ));
    }
    cores
}

fn battery_reading(attr: impl Fn(&str) -> Option<String>) -> Option<PowerReading> {
    let number = |name: &str| attr(name).and_then(|v| v.parse::<f64>().ok());

    let capacity = number("capacity")? / 100.0;
    let status = attr("status").unwrap_or_default();
    let charging = status == "Charging";
    // Tenths of a degree Celsius
    let temperature_c = number("temp").map(|t| t / 10.0).unwrap_or(0.0);

    let remaining_seconds = if status == "Discharging" {
        let hours = match (number("energy_now"), number("power_now")) {
            (Some(energy), Some(power)) if power > 0.0 => Some(energy / power),
            _ => match (number("charge_now"), number("current_now")) {
                (Some(charge), Some(current)) if current > 0.0 => Some(charge / current),
                _ => None,
            },
        };
        hours.map(|h| h * 3600.0).unwrap_or(-1.0)
    } else {
        -1.0
    };

    Some(PowerReading {
        remaining_capacity: capacity,
        remaining_seconds,
        temperature_c,
        charging,
    })
}
