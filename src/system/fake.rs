use std::collections::HashMap;

use super::{Family, SensorError, SensorSource};
use crate::model::{
    CoreReading, CoreTicks, HostIdentity, MemoryReading, PowerReading, ProcessReading,
    SystemReading,
};

/// Deterministic sensor for tests and benches.
///
/// Readings stay fixed until changed; failures can be queued per family and
/// are consumed one read at a time.
#[derive(Clone, Debug)]
pub struct ScriptedSensor {
    pub host: HostIdentity,
    pub memory: MemoryReading,
    pub power: Option<PowerReading>,
    pub processes: Vec<ProcessReading>,
    pub system: SystemReading,
    pub cores: Vec<CoreReading>,
    failures: HashMap<Family, Vec<SensorError>>,
    reads: HashMap<Family, usize>,
    cycles: usize,
}

impl ScriptedSensor {
    pub fn new(host: HostIdentity) -> Self {
        ScriptedSensor {
            host,
            memory: MemoryReading {
                available_bytes: 4 << 30,
                total_bytes: 16 << 30,
            },
            power: Some(PowerReading {
                remaining_capacity: 0.8,
                remaining_seconds: 7200.0,
                temperature_c: 30.0,
                charging: false,
            }),
            processes: Vec::new(),
            system: SystemReading {
                boot_time_ms: 1_000,
                uptime_ms: 0,
                process_count: 0,
                service_count: 0,
                thread_count: 0,
            },
            cores: Vec::new(),
            failures: HashMap::new(),
            reads: HashMap::new(),
            cycles: 0,
        }
    }

    /// `n` processes with pids `1..=n` and `m` cores with indexes `0..m`.
    pub fn with_entities(mut self, n: u32, m: u32) -> Self {
        self.set_process_count(n);
        self.cores = (0..m)
            .map(|index| CoreReading {
                index,
                current_frequency_hz: 2_400_000_000,
                max_frequency_hz: 3_000_000_000,
                ticks: CoreTicks::default(),
            })
            .collect();
        self
    }

    pub fn set_process_count(&mut self, n: u32) {
        self.processes = (1..=n)
            .map(|pid| ProcessReading {
                pid,
                name: format!("proc_{pid}"),
                user: "tester".to_string(),
                start_time_ms: 500,
                uptime_ms: 500,
                cpu_usage: 0.01 * pid as f64,
            })
            .collect();
        self.system.process_count = n;
        self.system.thread_count = n;
    }

    /// Make the next read of `family` fail with `error`.
    pub fn fail_next(&mut self, family: Family, error: SensorError) {
        self.failures.entry(family).or_default().insert(0, error);
    }

    pub fn reads(&self, family: Family) -> usize {
        self.reads.get(&family).copied().unwrap_or(0)
    }

    /// Number of `begin_cycle` calls seen.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    fn read(&mut self, family: Family) -> Result<(), SensorError> {
        *self.reads.entry(family).or_default() += 1;
        match self.failures.get_mut(&family).and_then(Vec::pop) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl SensorSource for ScriptedSensor {
    fn begin_cycle(&mut self) {
        self.cycles += 1;
    }

    fn host_identity(&mut self) -> Result<HostIdentity, SensorError> {
        self.read(Family::Host)?;
        Ok(self.host.clone())
    }

    fn memory(&mut self) -> Result<MemoryReading, SensorError> {
        self.read(Family::Memory)?;
        Ok(self.memory)
    }

    fn power(&mut self) -> Result<PowerReading, SensorError> {
        self.read(Family::Power)?;
        self.power.ok_or(SensorError::Unavailable(Family::Power))
    }

    fn processes(&mut self) -> Result<Vec<ProcessReading>, SensorError> {
        self.read(Family::Processes)?;
        Ok(self.processes.clone())
    }

    fn system(&mut self) -> Result<SystemReading, SensorError> {
        self.read(Family::System)?;
        self.system.uptime_ms += 1;
        Ok(self.system)
    }

    fn cores(&mut self) -> Result<Vec<CoreReading>, SensorError> {
        self.read(Family::Cores)?;
        for core in &mut self.cores {
            core.ticks.user += 1;
            core.ticks.idle += 3;
        }
        Ok(self.cores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostIdentity {
        HostIdentity {
            os: "Linux".into(),
            code_name: "Focal".into(),
            version: "20.04".into(),
            cpu_signature: "Intel i7".into(),
            physical_cores: 4,
            vendor_frequency_hz: 3_000_000_000,
        }
    }

    #[test]
    fn queued_failures_are_consumed_in_order() {
        let mut sensor = ScriptedSensor::new(host());
        sensor.fail_next(
            Family::Memory,
            SensorError::Read {
                family: Family::Memory,
                reason: "first".into(),
            },
        );
        sensor.fail_next(Family::Memory, SensorError::Unavailable(Family::Memory));

        let first = sensor.memory().unwrap_err();
        assert!(matches!(first, SensorError::Read { .. }));
        assert_eq!(
            sensor.memory().unwrap_err(),
            SensorError::Unavailable(Family::Memory)
        );
        assert!(sensor.memory().is_ok());
        assert_eq!(sensor.reads(Family::Memory), 3);
    }

    #[test]
    fn with_entities_builds_processes_and_cores() {
        let mut sensor = ScriptedSensor::new(host()).with_entities(3, 2);
        assert_eq!(sensor.processes().unwrap().len(), 3);
        let cores = sensor.cores().unwrap();
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[1].index, 1);
        assert_eq!(cores[0].ticks.user, 1);
    }

    #[test]
    fn missing_battery_reads_as_unavailable() {
        let mut sensor = ScriptedSensor::new(host());
        sensor.power = None;
        assert_eq!(
            sensor.power().unwrap_err().family(),
            Family::Power
        );
    }
}
