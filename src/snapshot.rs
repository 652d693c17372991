//! Everything the dashboard shows, read back from the store in one pass.

use crate::model::{
    CoreTicks, CpuCoreSample, HostIdentity, MemorySample, PowerSample, ProcessReading,
    SystemSample, Timestamp,
};
use crate::store::{Repository, StoreError};

#[derive(Clone, Debug, PartialEq)]
pub struct CoreUsage {
    pub index: u32,
    /// Busy fraction in `0.0..=1.0`; `None` when the host reports no ticks.
    pub busy: Option<f64>,
    pub current_frequency_hz: u64,
}

#[derive(Clone, Debug, Default)]
pub struct DashboardSnapshot {
    pub host: Option<HostIdentity>,
    pub memory: Option<MemorySample>,
    pub power: Option<PowerSample>,
    pub system: Option<SystemSample>,
    pub cores: Vec<CpuCoreSample>,
    pub core_usage: Vec<CoreUsage>,
    /// Newest process generation, busiest first.
    pub processes: Vec<ProcessReading>,
}

impl DashboardSnapshot {
    /// Read the newest rows of every table. Core usage is the tick delta
    /// against `previous` when it holds an older generation, otherwise the
    /// average since boot.
    pub fn load(repo: &Repository, previous: &DashboardSnapshot) -> Result<Self, StoreError> {
        let cores = repo.latest_cpu_cores()?;
        let core_usage = if cores.first().map(|c| c.timestamp) == previous.cores_at()
            && !previous.core_usage.is_empty()
        {
            previous.core_usage.clone()
        } else {
            core_usage(&previous.cores, &cores)
        };

        let mut processes: Vec<ProcessReading> = repo
            .latest_processes()?
            .into_iter()
            .map(|sample| sample.reading)
            .collect();
        processes.sort_by(|a, b| b.cpu_usage.total_cmp(&a.cpu_usage).then(a.pid.cmp(&b.pid)));

        Ok(DashboardSnapshot {
            host: repo.host()?,
            memory: repo.latest_memory()?,
            power: repo.latest_power()?,
            system: repo.latest_system()?,
            cores,
            core_usage,
            processes,
        })
    }

    fn cores_at(&self) -> Option<Timestamp> {
        self.cores.first().map(|c| c.timestamp)
    }

    /// Timestamp of the newest aggregate sample shown.
    pub fn updated_at(&self) -> Option<Timestamp> {
        [
            self.memory.as_ref().map(|s| s.timestamp),
            self.power.as_ref().map(|s| s.timestamp),
            self.system.as_ref().map(|s| s.timestamp),
            self.cores_at(),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    /// Used memory as a fraction of total.
    pub fn memory_used_ratio(&self) -> Option<f64> {
        let memory = &self.memory.as_ref()?.reading;
        if memory.total_bytes == 0 {
            return None;
        }
        let used = memory.total_bytes.saturating_sub(memory.available_bytes);
        Some((used as f64 / memory.total_bytes as f64).clamp(0.0, 1.0))
    }
}

fn core_usage(previous: &[CpuCoreSample], current: &[CpuCoreSample]) -> Vec<CoreUsage> {
    current
        .iter()
        .map(|core| {
            let before = previous
                .iter()
                .find(|p| p.reading.index == core.reading.index && p.timestamp < core.timestamp)
                .map(|p| &p.reading.ticks);
            CoreUsage {
                index: core.reading.index,
                busy: busy_fraction(before, &core.reading.ticks),
                current_frequency_hz: core.reading.current_frequency_hz,
            }
        })
        .collect()
}

/// Busy share of the ticks elapsed since `before`, or since boot without it.
pub fn busy_fraction(before: Option<&CoreTicks>, now: &CoreTicks) -> Option<f64> {
    let split = |t: &CoreTicks| {
        let busy = t.user + t.nice + t.system + t.irq + t.soft_irq + t.steal;
        (busy, busy + t.idle + t.io_wait)
    };
    let (busy, total) = split(now);
    let (busy, total) = match before.map(split) {
        Some((prev_busy, prev_total)) if total > prev_total => {
            (busy.saturating_sub(prev_busy), total - prev_total)
        }
        _ => (busy, total),
    };
    if total == 0 {
        return None;
    }
    Some((busy as f64 / total as f64).clamp(0.0, 1.0))
}
