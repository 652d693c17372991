use std::sync::Once;

use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System,
    ThreadKind, UpdateKind, Users,
};
use tracing::debug;

use super::platform;
use super::{Family, SensorError, SensorSource};
use crate::model::{
    CoreReading, HostIdentity, MemoryReading, PowerReading, ProcessReading,
    SystemReading,
};

static MISSING_TICKS: Once = Once::new();

/// Sensor source backed by `sysinfo`, with per-OS platform extensions.
pub struct SysinfoSource {
    sys: System,
    users: Users,
    /// Set by `begin_cycle`; the process table is refreshed at most once
    /// per cycle so `processes` and `system` count the same set.
    processes_stale: bool,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::everything())
                .with_cpu(CpuRefreshKind::everything())
                .with_processes(Self::process_refresh_kind()),
        );
        SysinfoSource {
            sys,
            users: Users::new_with_refreshed_list(),
            processes_stale: true,
        }
    }

    fn process_refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cpu()
            .with_user(UpdateKind::OnlyIfNotSet)
    }

    fn refresh_processes(&mut self) {
        if !self.processes_stale {
            return;
        }
        self.processes_stale = false;
        let _span = tracing::debug_span!("source.refresh_processes").entered();

        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            Self::process_refresh_kind(),
        );
    }

    fn user_name(&self, process: &sysinfo::Process) -> String {
        process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .or_else(|| process.user_id().map(|uid| format!("{uid:?}")))
            .unwrap_or_default()
    }
}

impl SensorSource for SysinfoSource {
    fn begin_cycle(&mut self) {
        self.processes_stale = true;
    }

    fn host_identity(&mut self) -> Result<HostIdentity, SensorError> {
        self.sys.refresh_cpu_all();
        let cpu = self.sys.cpus().first().ok_or_else(|| SensorError::Read {
            family: Family::Host,
            reason: "no cpus reported".to_string(),
        })?;
        let brand = cpu.brand().trim().to_string();
        let vendor_frequency_hz =
            parse_brand_frequency_hz(&brand).unwrap_or(cpu.frequency() * 1_000_000);

        Ok(HostIdentity {
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            code_name: platform::os_code_name().unwrap_or_default(),
            version: System::os_version().unwrap_or_default(),
            cpu_signature: brand,
            physical_cores: System::physical_core_count()
                .map(|n| n as u32)
                .unwrap_or(self.sys.cpus().len() as u32),
            vendor_frequency_hz,
        })
    }

    fn memory(&mut self) -> Result<MemoryReading, SensorError> {
        self.sys.refresh_memory();
        let total_bytes = self.sys.total_memory();
        if total_bytes == 0 {
            return Err(SensorError::Read {
                family: Family::Memory,
                reason: "total memory reported as zero".to_string(),
            });
        }
        Ok(MemoryReading {
            available_bytes: self.sys.available_memory(),
            total_bytes,
        })
    }

    fn power(&mut self) -> Result<PowerReading, SensorError> {
        platform::power_source().ok_or(SensorError::Unavailable(Family::Power))
    }

    fn processes(&mut self) -> Result<Vec<ProcessReading>, SensorError> {
        self.refresh_processes();

        let mut readings = Vec::with_capacity(self.sys.processes().len());
        for (pid, process) in self.sys.processes() {
            if is_userland_task(process) {
                continue;
            }
            let start_time_ms = process.start_time() as i64 * 1000;
            readings.push(ProcessReading {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                user: self.user_name(process),
                start_time_ms,
                uptime_ms: process.run_time() as i64 * 1000,
                cpu_usage: f64::from(process.cpu_usage()) / 100.0,
            });
        }
        readings.sort_unstable_by_key(|p| p.pid);
        Ok(readings)
    }

    fn system(&mut self) -> Result<SystemReading, SensorError> {
        self.refresh_processes();

        let mut process_count = 0u32;
        let mut thread_count = 0u32;
        for (pid, process) in self.sys.processes() {
            if is_userland_task(process) {
                continue;
            }
            process_count += 1;
            thread_count += platform::process_thread_count(pid.as_u32()).unwrap_or(1);
        }

        Ok(SystemReading {
            boot_time_ms: System::boot_time() as i64 * 1000,
            uptime_ms: System::uptime() as i64 * 1000,
            process_count,
            service_count: platform::service_count().unwrap_or(0),
            thread_count,
        })
    }

    fn cores(&mut self) -> Result<Vec<CoreReading>, SensorError> {
        self.sys.refresh_cpu_all();
        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            return Err(SensorError::Read {
                family: Family::Cores,
                reason: "no cpus reported".to_string(),
            });
        }
        let ticks = platform::core_ticks().unwrap_or_else(|| {
            MISSING_TICKS.call_once(|| {
                debug!("per-core tick counters unavailable, recording zeros");
            });
            Vec::new()
        });

        let readings = cpus
            .iter()
            .enumerate()
            .map(|(i, cpu)| {
                let index = i as u32;
                let current_frequency_hz = cpu.frequency() * 1_000_000;
                CoreReading {
                    index,
                    current_frequency_hz,
                    max_frequency_hz: platform::core_max_frequency_hz(index)
                        .unwrap_or(current_frequency_hz),
                    ticks: ticks
                        .iter()
                        .find(|(core, _)| *core == index)
                        .map(|(_, t)| *t)
                        .unwrap_or_default(),
                }
            })
            .collect();
        Ok(readings)
    }
}

/// Linux lists the threads of a process as tasks; they are not processes.
fn is_userland_task(process: &sysinfo::Process) -> bool {
    matches!(process.thread_kind(), Some(ThreadKind::Userland))
}

/// Parse the nominal frequency out of brand strings like
/// `Intel(R) Core(TM) i7-4870HQ CPU @ 2.50GHz`.
fn parse_brand_frequency_hz(brand: &str) -> Option<u64> {
    let (_, tail) = brand.rsplit_once('@')?;
    let tail = tail.trim();
    let (number, scale) = if let Some(n) = tail.strip_suffix("GHz") {
        (n, 1e9)
    } else if let Some(n) = tail.strip_suffix("MHz") {
        (n, 1e6)
    } else {
        return None;
    };
    let value: f64 = number.trim().parse().ok()?;
    Some((value * scale).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_frequency_in_ghz() {
        assert_eq!(
            parse_brand_frequency_hz("Intel(R) Core(TM) i7-4870HQ CPU @ 2.50GHz"),
            Some(2_500_000_000)
        );
    }

    #[test]
    fn brand_frequency_in_mhz() {
        assert_eq!(parse_brand_frequency_hz("Some CPU @ 800MHz"), Some(800_000_000));
    }

    #[test]
    fn brand_without_frequency() {
        assert_eq!(parse_brand_frequency_hz("Apple M2"), None);
        assert_eq!(parse_brand_frequency_hz("AMD Ryzen @ fast"), None);
    }

    #[test]
    fn live_source_reads_every_family_but_power() {
        let mut source = SysinfoSource::new();
        let host = source.host_identity().unwrap();
        assert!(host.physical_cores >= 1);
        assert!(source.memory().unwrap().total_bytes > 0);
        assert!(!source.cores().unwrap().is_empty());
        let processes = source.processes().unwrap();
        let me = std::process::id();
        assert!(processes.iter().any(|p| p.pid == me));
        assert!(source.system().unwrap().process_count >= 1);
    }

    #[test]
    fn one_cycle_counts_the_same_process_table() {
        let mut source = SysinfoSource::new();
        for _ in 0..2 {
            source.begin_cycle();
            let processes = source.processes().unwrap();
            let system = source.system().unwrap();
            assert_eq!(system.process_count as usize, processes.len());
        }
    }
}
