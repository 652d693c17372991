use serde::Serialize;

/// Wall-clock milliseconds since the UNIX epoch.
pub type Timestamp = i64;

/// Identity of the single monitored host. Every sample row references it.
pub const HOST_ID: i64 = 1;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostIdentity {
    pub os: String,
    pub code_name: String,
    pub version: String,
    pub cpu_signature: String,
    pub physical_cores: u32,
    pub vendor_frequency_hz: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemoryReading {
    pub available_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PowerReading {
    /// Remaining capacity as a fraction in `0.0..=1.0`.
    pub remaining_capacity: f64,
    /// Estimated seconds left; negative when the estimate is unknown.
    pub remaining_seconds: f64,
    /// Battery temperature in degrees Celsius, 0.0 when unreported.
    pub temperature_c: f64,
    pub charging: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessReading {
    pub pid: u32,
    pub name: String,
    pub user: String,
    pub start_time_ms: i64,
    pub uptime_ms: i64,
    /// Fraction of one core; can exceed 1.0 for multi-threaded processes.
    pub cpu_usage: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SystemReading {
    pub boot_time_ms: i64,
    pub uptime_ms: i64,
    pub process_count: u32,
    pub service_count: u32,
    pub thread_count: u32,
}

/// Cumulative per-core tick counters since boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub io_wait: u64,
    pub irq: u64,
    pub soft_irq: u64,
    pub steal: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CoreReading {
    pub index: u32,
    pub current_frequency_hz: u64,
    pub max_frequency_hz: u64,
    pub ticks: CoreTicks,
}

/// A reading bound to the cycle that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample<T> {
    pub host_id: i64,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub reading: T,
}

impl<T> Sample<T> {
    pub fn new(timestamp: Timestamp, reading: T) -> Self {
        Sample {
            host_id: HOST_ID,
            timestamp,
            reading,
        }
    }
}

pub type MemorySample = Sample<MemoryReading>;
pub type PowerSample = Sample<PowerReading>;
pub type SystemSample = Sample<SystemReading>;
pub type ProcessSample = Sample<ProcessReading>;
pub type CpuCoreSample = Sample<CoreReading>;

/// Stamp every reading of one generation with the same cycle timestamp.
pub fn stamp_all<T>(timestamp: Timestamp, readings: Vec<T>) -> Vec<Sample<T>> {
    readings
        .into_iter()
        .map(|reading| Sample::new(timestamp, reading))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_always_reference_the_singleton_host() {
        let sample = Sample::new(
            42,
            MemoryReading {
                available_bytes: 1,
                total_bytes: 2,
            },
        );
        assert_eq!(sample.host_id, HOST_ID);
        assert_eq!(sample.timestamp, 42);
    }

    #[test]
    fn stamp_all_shares_one_timestamp() {
        let readings = vec![CoreTicks::default(); 3];
        let samples = stamp_all(1000, readings);
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.timestamp == 1000));
    }

    #[test]
    fn sample_serializes_flat() {
        let sample = Sample::new(
            7,
            MemoryReading {
                available_bytes: 10,
                total_bytes: 20,
            },
        );
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["timestamp"], 7);
        assert_eq!(json["available_bytes"], 10);
        assert_eq!(json["host_id"], 1);
    }
}
