//! The sampling loop.
//!
//! Each cycle captures one timestamp, reads and persists every metric family
//! under it, then purges the per-entity generation from the previous cycle.
//! Both generations coexist only between the insert and the purge; once a
//! cycle completes, the process and core tables hold just the generation it
//! wrote.

use std::io;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use crate::clock::{Clock, SystemClock, next_cycle_timestamp};
use crate::model::{Sample, Timestamp, stamp_all};
use crate::store::{HostInsert, Repository, RetentionPolicy, Store, StoreError};
use crate::system::{Family, SensorError, SensorSource};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CollectError {
    /// A source the host simply does not have, e.g. no battery.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CollectError::Sensor(SensorError::Unavailable(_)))
    }
}

/// What the loop does when a family fails to sample or persist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop that family's rows for the cycle and keep going.
    #[default]
    Continue,
    /// Stop the loop on the first failure other than an unavailable source.
    Abort,
}

#[derive(Debug)]
pub enum FamilyOutcome {
    /// Number of rows written.
    Persisted(usize),
    Failed(CollectError),
}

impl FamilyOutcome {
    pub fn rows(&self) -> usize {
        match self {
            FamilyOutcome::Persisted(rows) => *rows,
            FamilyOutcome::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FamilyOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub enum PurgeOutcome {
    /// First cycle: there is no previous generation.
    Skipped,
    Purged {
        target: Timestamp,
        processes: Result<usize, StoreError>,
        cores: Result<usize, StoreError>,
    },
}

#[derive(Debug)]
pub struct CycleReport {
    pub timestamp: Timestamp,
    pub memory: FamilyOutcome,
    pub power: FamilyOutcome,
    pub processes: FamilyOutcome,
    pub system: FamilyOutcome,
    pub cores: FamilyOutcome,
    pub purge: PurgeOutcome,
}

impl CycleReport {
    pub fn outcome(&self, family: Family) -> Option<&FamilyOutcome> {
        match family {
            Family::Host => None,
            Family::Memory => Some(&self.memory),
            Family::Power => Some(&self.power),
            Family::Processes => Some(&self.processes),
            Family::System => Some(&self.system),
            Family::Cores => Some(&self.cores),
        }
    }

    pub fn failures(&self) -> usize {
        [
            &self.memory,
            &self.power,
            &self.processes,
            &self.system,
            &self.cores,
        ]
        .iter()
        .filter(|o| o.is_failed())
        .count()
    }

    /// First failure that `policy` treats as fatal, if any.
    pub fn into_fatal_error(self, policy: FailurePolicy) -> Option<CollectError> {
        if policy == FailurePolicy::Continue {
            return None;
        }
        let families = [self.memory, self.power, self.processes, self.system, self.cores];
        let purge_error = match self.purge {
            PurgeOutcome::Purged {
                processes, cores, ..
            } => processes.and(cores).err().map(CollectError::from),
            PurgeOutcome::Skipped => None,
        };
        families
            .into_iter()
            .find_map(|outcome| match outcome {
                FamilyOutcome::Failed(e) if !e.is_unavailable() => Some(e),
                _ => None,
            })
            .or(purge_error)
    }
}

pub struct Collector<S, C = SystemClock> {
    sensor: S,
    clock: C,
    repository: Repository,
    retention: RetentionPolicy,
    store: Store,
    interval: Duration,
    policy: FailurePolicy,
    /// Per-entity generation the next cycle purges.
    prev_timestamp: Option<Timestamp>,
    /// Newest timestamp in any sample table; cycle stamps stay above it.
    last_timestamp: Option<Timestamp>,
}

impl<S: SensorSource> Collector<S, SystemClock> {
    pub fn new(sensor: S, store: Store) -> Self {
        Collector::with_clock(sensor, store, SystemClock)
    }
}

impl<S: SensorSource, C: Clock> Collector<S, C> {
    pub fn with_clock(sensor: S, store: Store, clock: C) -> Self {
        Collector {
            sensor,
            clock,
            repository: Repository::new(store.clone()),
            retention: RetentionPolicy::new(store.clone()),
            store,
            interval: DEFAULT_INTERVAL,
            policy: FailurePolicy::default(),
            prev_timestamp: None,
            last_timestamp: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Timestamp of the last completed cycle, the next purge target.
    pub fn prev_timestamp(&self) -> Option<Timestamp> {
        self.prev_timestamp
    }

    /// Prepare the store and record the host identity.
    ///
    /// With `reset` the existing database is deleted first. Without it the
    /// loop resumes after the newest stored generation. Any error here is
    /// fatal: without tables and a host row no sample can be written.
    pub fn bootstrap(&mut self, reset: bool) -> Result<HostInsert, CollectError> {
        let _span = info_span!("collector.bootstrap", reset).entered();

        if reset {
            self.store.reset_store()?;
        }
        self.store.ensure_schema()?;

        let host = self.sensor.host_identity()?;
        info!(os = %host.os, version = %host.version, cpu = %host.cpu_signature, "host data collected");
        let inserted = self.repository.insert_host(&host)?;
        self.resume()?;
        Ok(inserted)
    }

    /// Adopt the newest per-entity generation left by an earlier run as the
    /// next purge target, and drop anything older than it.
    fn resume(&mut self) -> Result<(), CollectError> {
        let newest = |tables: &[&str]| -> Result<Option<Timestamp>, StoreError> {
            let mut newest = None;
            for table in tables {
                newest = newest.max(self.repository.newest_timestamp(table)?);
            }
            Ok(newest)
        };
        let generation = newest(&["ProcessSample", "CpuCoreSample"])?;
        let last = newest(&[
            "MemorySample",
            "PowerSample",
            "ProcessSample",
            "SystemSample",
            "CpuCoreSample",
        ])?;

        if let Some(generation) = generation {
            let deleted = self.retention.purge_older_than(generation)?;
            info!(generation, deleted, "resuming after stored generation");
        }
        self.prev_timestamp = generation;
        self.last_timestamp = last;
        Ok(())
    }

    /// Run one sample/persist/purge pass. Never fails: per-family errors are
    /// logged and recorded in the report.
    pub fn run_cycle(&mut self) -> CycleReport {
        let timestamp = next_cycle_timestamp(self.clock.now_ms(), self.last_timestamp);
        let _span = info_span!("collector.cycle", timestamp).entered();

        self.sensor.begin_cycle();

        let memory = self.persist_memory(timestamp);
        let power = self.persist_power(timestamp);
        let processes = self.persist_processes(timestamp);
        let system = self.persist_system(timestamp);
        let cores = self.persist_cores(timestamp);

        let purge = self.purge_previous();
        self.prev_timestamp = Some(timestamp);
        self.last_timestamp = Some(timestamp);

        let report = CycleReport {
            timestamp,
            memory,
            power,
            processes,
            system,
            cores,
            purge,
        };
        debug!(failures = report.failures(), "cycle complete");
        report
    }

    fn persist_memory(&mut self, timestamp: Timestamp) -> FamilyOutcome {
        let result = self
            .sensor
            .memory()
            .map_err(CollectError::from)
            .and_then(|reading| {
                self.repository
                    .insert_memory_sample(&Sample::new(timestamp, reading))?;
                Ok(1)
            });
        outcome(Family::Memory, result)
    }

    fn persist_power(&mut self, timestamp: Timestamp) -> FamilyOutcome {
        let result = self
            .sensor
            .power()
            .map_err(CollectError::from)
            .and_then(|reading| {
                self.repository
                    .insert_power_sample(&Sample::new(timestamp, reading))?;
                Ok(1)
            });
        outcome(Family::Power, result)
    }

    fn persist_processes(&mut self, timestamp: Timestamp) -> FamilyOutcome {
        let result = self
            .sensor
            .processes()
            .map_err(CollectError::from)
            .and_then(|readings| {
                let samples = stamp_all(timestamp, readings);
                Ok(self.repository.insert_process_samples(&samples)?)
            });
        outcome(Family::Processes, result)
    }

    fn persist_system(&mut self, timestamp: Timestamp) -> FamilyOutcome {
        let result = self
            .sensor
            .system()
            .map_err(CollectError::from)
            .and_then(|reading| {
                self.repository
                    .insert_system_sample(&Sample::new(timestamp, reading))?;
                Ok(1)
            });
        outcome(Family::System, result)
    }

    fn persist_cores(&mut self, timestamp: Timestamp) -> FamilyOutcome {
        let result = self
            .sensor
            .cores()
            .map_err(CollectError::from)
            .and_then(|readings| {
                let samples = stamp_all(timestamp, readings);
                Ok(self.repository.insert_cpu_core_samples(&samples)?)
            });
        outcome(Family::Cores, result)
    }

    fn purge_previous(&self) -> PurgeOutcome {
        let Some(target) = self.prev_timestamp else {
            debug!("no previous generation to purge");
            return PurgeOutcome::Skipped;
        };

        let processes = self.retention.purge_process_samples(target);
        if let Err(e) = &processes {
            error!(error = %e, target, "failed to purge ProcessSample");
        }
        let cores = self.retention.purge_cpu_core_samples(target);
        if let Err(e) = &cores {
            error!(error = %e, target, "failed to purge CpuCoreSample");
        }
        PurgeOutcome::Purged {
            target,
            processes,
            cores,
        }
    }

    /// Run at most `cycles` passes, sleeping between them but not after the
    /// last. Ctrl-C ends the run early. Returns the number of completed
    /// cycles.
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<usize, CollectError> {
        self.drive(Some(cycles), tokio::signal::ctrl_c()).await
    }

    /// Sample until Ctrl-C, or until a failure the policy treats as fatal.
    pub async fn run(&mut self) -> Result<(), CollectError> {
        info!(interval_ms = self.interval.as_millis() as u64, policy = ?self.policy, "collector started");
        let cycles = self.drive(None, tokio::signal::ctrl_c()).await?;
        info!(cycles, "collector stopped");
        Ok(())
    }

    /// Sample until `shutdown` resolves. The future is polled across every
    /// sleep, so a request that lands mid-interval is never lost.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<usize, CollectError>
    where
        F: Future<Output = io::Result<()>>,
    {
        self.drive(None, shutdown).await
    }

    async fn drive<F>(&mut self, limit: Option<usize>, shutdown: F) -> Result<usize, CollectError>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::pin!(shutdown);
        let mut listening = true;
        let mut completed = 0;

        while limit.is_none_or(|limit| completed < limit) {
            self.run_checked_cycle()?;
            completed += 1;
            if limit.is_some_and(|limit| completed >= limit) {
                break;
            }

            let sleep = tokio::time::sleep(self.interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    signal = &mut shutdown, if listening => match signal {
                        Ok(()) => {
                            info!("shutdown requested");
                            return Ok(completed);
                        }
                        Err(e) => {
                            // Keep sampling without a listener
                            warn!(error = %e, "shutdown listener failed");
                            listening = false;
                        }
                    },
                }
            }
        }
        Ok(completed)
    }

    fn run_checked_cycle(&mut self) -> Result<(), CollectError> {
        let report = self.run_cycle();
        match report.into_fatal_error(self.policy) {
            Some(e) => {
                error!(error = %e, "aborting collection");
                Err(e)
            }
            None => Ok(()),
        }
    }
}

fn outcome(family: Family, result: Result<usize, CollectError>) -> FamilyOutcome {
    match result {
        Ok(rows) => {
            debug!(%family, rows, "family persisted");
            FamilyOutcome::Persisted(rows)
        }
        Err(e) if e.is_unavailable() => {
            debug!(%family, "source unavailable, skipping");
            FamilyOutcome::Failed(e)
        }
        Err(e) => {
            error!(%family, error = %e, "family skipped for this cycle");
            FamilyOutcome::Failed(e)
        }
    }
}
