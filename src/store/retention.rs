use rusqlite::params;
use tracing::info;

use super::{Store, StoreError};
use crate::model::Timestamp;

/// Deletes whole generations from the per-entity tables.
///
/// Aggregate tables (memory, power, system) and the host row are never
/// touched here; their history is unbounded.
#[derive(Clone, Debug)]
pub struct RetentionPolicy {
    store: Store,
}

impl RetentionPolicy {
    pub fn new(store: Store) -> Self {
        RetentionPolicy { store }
    }

    pub fn purge_process_samples(&self, timestamp: Timestamp) -> Result<usize, StoreError> {
        self.purge("ProcessSample", timestamp)
    }

    pub fn purge_cpu_core_samples(&self, timestamp: Timestamp) -> Result<usize, StoreError> {
        self.purge("CpuCoreSample", timestamp)
    }

    /// Drop every per-entity generation older than `timestamp`.
    ///
    /// Used when resuming an existing store: the previous run may have left
    /// more than one generation behind.
    pub fn purge_older_than(&self, timestamp: Timestamp) -> Result<usize, StoreError> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for table in ["ProcessSample", "CpuCoreSample"] {
            deleted += tx.execute(
                &format!("DELETE FROM {table} WHERE timestamp < ?1"),
                params![timestamp],
            )?;
        }
        tx.commit()?;
        info!(timestamp, deleted, "stale generations purged");
        Ok(deleted)
    }

    fn purge(&self, table: &'static str, timestamp: Timestamp) -> Result<usize, StoreError> {
        let conn = self.store.connect()?;
        let deleted = conn.execute(
            &format!("DELETE FROM {table} WHERE timestamp = ?1"),
            params![timestamp],
        )?;
        info!(table, timestamp, deleted, "generation purged");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoreReading, CoreTicks, HostIdentity, ProcessReading, stamp_all};
    use crate::store::Repository;

    fn setup() -> (tempfile::TempDir, Repository, RetentionPolicy) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("metrik.db"));
        store.ensure_schema().unwrap();
        let repo = Repository::new(store.clone());
        repo.insert_host(&HostIdentity {
            os: "Linux".into(),
            code_name: String::new(),
            version: "6.1".into(),
            cpu_signature: "cpu".into(),
            physical_cores: 1,
            vendor_frequency_hz: 1,
        })
        .unwrap();
        (dir, repo, RetentionPolicy::new(store))
    }

    fn processes(n: u32) -> Vec<ProcessReading> {
        (1..=n)
            .map(|pid| ProcessReading {
                pid,
                name: "p".into(),
                user: "u".into(),
                start_time_ms: 0,
                uptime_ms: 0,
                cpu_usage: 0.0,
            })
            .collect()
    }

    fn cores(n: u32) -> Vec<CoreReading> {
        (0..n)
            .map(|index| CoreReading {
                index,
                current_frequency_hz: 1,
                max_frequency_hz: 1,
                ticks: CoreTicks::default(),
            })
            .collect()
    }

    #[test]
    fn purge_removes_only_the_matching_generation() {
        let (_dir, repo, retention) = setup();
        repo.insert_process_samples(&stamp_all(1000, processes(3)))
            .unwrap();
        repo.insert_process_samples(&stamp_all(2000, processes(2)))
            .unwrap();

        assert_eq!(retention.purge_process_samples(1000).unwrap(), 3);
        assert_eq!(repo.distinct_timestamps("ProcessSample").unwrap(), vec![2000]);
    }

    #[test]
    fn cpu_purge_targets_core_table_only() {
        let (_dir, repo, retention) = setup();
        repo.insert_process_samples(&stamp_all(1000, processes(3)))
            .unwrap();
        repo.insert_cpu_core_samples(&stamp_all(1000, cores(2)))
            .unwrap();

        assert_eq!(retention.purge_cpu_core_samples(1000).unwrap(), 2);
        assert_eq!(repo.row_count("CpuCoreSample").unwrap(), 0);
        assert_eq!(repo.row_count("ProcessSample").unwrap(), 3);
    }

    #[test]
    fn purge_older_than_keeps_the_newest_generation() {
        let (_dir, repo, retention) = setup();
        for t in [1000, 2000, 3000] {
            repo.insert_process_samples(&stamp_all(t, processes(2)))
                .unwrap();
            repo.insert_cpu_core_samples(&stamp_all(t, cores(1)))
                .unwrap();
        }

        assert_eq!(retention.purge_older_than(3000).unwrap(), 6);
        assert_eq!(repo.distinct_timestamps("ProcessSample").unwrap(), vec![3000]);
        assert_eq!(repo.distinct_timestamps("CpuCoreSample").unwrap(), vec![3000]);
        assert_eq!(retention.purge_older_than(3000).unwrap(), 0);
    }

    #[test]
    fn purging_an_absent_generation_is_a_noop() {
        let (_dir, repo, retention) = setup();
        repo.insert_cpu_core_samples(&stamp_all(1000, cores(4)))
            .unwrap();

        assert_eq!(retention.purge_cpu_core_samples(5000).unwrap(), 0);
        assert_eq!(retention.purge_cpu_core_samples(5000).unwrap(), 0);
        assert_eq!(repo.row_count("CpuCoreSample").unwrap(), 4);
    }
}
