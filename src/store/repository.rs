use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use super::{Store, StoreError, checked_table};
use crate::model::{
    CoreReading, CoreTicks, CpuCoreSample, HOST_ID, HostIdentity, MemoryReading, MemorySample,
    PowerReading, PowerSample, ProcessReading, ProcessSample, Sample, SystemReading,
    SystemSample, Timestamp,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostInsert {
    Inserted,
    AlreadyPresent,
}

/// One row from [`Repository::query`], columns in statement order.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRow {
    columns: Vec<(String, Value)>,
}

impl QueryRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.columns.len());
        for (name, value) in &self.columns {
            let json = match value {
                Value::Null => JsonValue::Null,
                Value::Integer(v) => JsonValue::from(*v),
                Value::Real(v) => JsonValue::from(*v),
                Value::Text(v) => JsonValue::from(v.as_str()),
                Value::Blob(v) => JsonValue::from(v.clone()),
            };
            map.insert(name.clone(), json);
        }
        JsonValue::Object(map)
    }
}

/// Typed insert and read operations, one connection per call.
#[derive(Clone, Debug)]
pub struct Repository {
    store: Store,
}

impl Repository {
    pub fn new(store: Store) -> Self {
        Repository { store }
    }

    /// Insert the host identity unless a host row already exists.
    ///
    /// The row always gets id [`HOST_ID`], so the primary key backs the
    /// count check if two callers ever race.
    pub fn insert_host(&self, host: &HostIdentity) -> Result<HostInsert, StoreError> {
        let conn = self.store.connect()?;
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM Host", [], |row| row.get(0))?;
        if existing > 0 {
            info!("host entry already exists");
            return Ok(HostInsert::AlreadyPresent);
        }

        conn.execute(
            "INSERT INTO Host (id, os, code_name, version, cpu_signature, physical_cores, vendor_frequency_hz) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                HOST_ID,
                host.os,
                host.code_name,
                host.version,
                host.cpu_signature,
                host.physical_cores,
                host.vendor_frequency_hz as i64,
            ],
        )?;
        info!("entry inserted into Host table");
        debug!(?host, "host row");
        Ok(HostInsert::Inserted)
    }

    pub fn insert_memory_sample(&self, sample: &MemorySample) -> Result<(), StoreError> {
        let conn = self.store.connect()?;
        conn.execute(
            "INSERT INTO MemorySample (host_id, timestamp, available_bytes, total_bytes) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.host_id,
                sample.timestamp,
                sample.reading.available_bytes as i64,
                sample.reading.total_bytes as i64,
            ],
        )?;
        info!("entry inserted into MemorySample table");
        debug!(?sample, "memory row");
        Ok(())
    }

    pub fn insert_power_sample(&self, sample: &PowerSample) -> Result<(), StoreError> {
        let conn = self.store.connect()?;
        conn.execute(
            "INSERT INTO PowerSample \
             (host_id, timestamp, remaining_capacity, remaining_seconds, temperature_c, charging) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sample.host_id,
                sample.timestamp,
                sample.reading.remaining_capacity,
                sample.reading.remaining_seconds,
                sample.reading.temperature_c,
                sample.reading.charging,
            ],
        )?;
        info!("entry inserted into PowerSample table");
        debug!(?sample, "power row");
        Ok(())
    }

    pub fn insert_system_sample(&self, sample: &SystemSample) -> Result<(), StoreError> {
        let conn = self.store.connect()?;
        conn.execute(
            "INSERT INTO SystemSample \
             (host_id, timestamp, boot_time_ms, uptime_ms, process_count, service_count, thread_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sample.host_id,
                sample.timestamp,
                sample.reading.boot_time_ms,
                sample.reading.uptime_ms,
                sample.reading.process_count,
                sample.reading.service_count,
                sample.reading.thread_count,
            ],
        )?;
        info!("entry inserted into SystemSample table");
        debug!(?sample, "system row");
        Ok(())
    }

    /// Write one generation of process rows. All rows land or none do.
    pub fn insert_process_samples(&self, samples: &[ProcessSample]) -> Result<usize, StoreError> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ProcessSample \
                 (host_id, timestamp, pid, name, user, start_time_ms, uptime_ms, cpu_usage) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for sample in samples {
                let p = &sample.reading;
                stmt.execute(params![
                    sample.host_id,
                    sample.timestamp,
                    p.pid,
                    p.name,
                    p.user,
                    p.start_time_ms,
                    p.uptime_ms,
                    p.cpu_usage,
                ])?;
            }
        }
        tx.commit()?;
        info!(rows = samples.len(), "entries inserted into ProcessSample table");
        Ok(samples.len())
    }

    /// Write one generation of per-core rows. All rows land or none do.
    pub fn insert_cpu_core_samples(&self, samples: &[CpuCoreSample]) -> Result<usize, StoreError> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO CpuCoreSample \
                 (host_id, timestamp, core_index, current_frequency_hz, max_frequency_hz, \
                  user_ticks, nice_ticks, system_ticks, idle_ticks, io_wait_ticks, \
                  irq_ticks, soft_irq_ticks, steal_ticks) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for sample in samples {
                let c = &sample.reading;
                let t = &c.ticks;
                stmt.execute(params![
                    sample.host_id,
                    sample.timestamp,
                    c.index,
                    c.current_frequency_hz as i64,
                    c.max_frequency_hz as i64,
                    t.user as i64,
                    t.nice as i64,
                    t.system as i64,
                    t.idle as i64,
                    t.io_wait as i64,
                    t.irq as i64,
                    t.soft_irq as i64,
                    t.steal as i64,
                ])?;
            }
        }
        tx.commit()?;
        info!(rows = samples.len(), "entries inserted into CpuCoreSample table");
        Ok(samples.len())
    }

    /// Run an arbitrary read statement and collect every row.
    ///
    /// Statements that would modify the database are rejected before they
    /// run; the connection itself is opened read-only as well.
    pub fn query(&self, sql: &str) -> Result<Vec<QueryRow>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(StoreError::NotReadOnly(sql.trim().to_string()));
        }
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let rows = stmt.query_map([], |row| {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                columns.push((name.clone(), row.get::<_, Value>(i)?));
            }
            Ok(QueryRow { columns })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn host(&self) -> Result<Option<HostIdentity>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let host = conn
            .query_row(
                "SELECT os, code_name, version, cpu_signature, physical_cores, vendor_frequency_hz \
                 FROM Host WHERE id = ?1",
                [HOST_ID],
                |row| {
                    Ok(HostIdentity {
                        os: row.get(0)?,
                        code_name: row.get(1)?,
                        version: row.get(2)?,
                        cpu_signature: row.get(3)?,
                        physical_cores: row.get(4)?,
                        vendor_frequency_hz: row.get::<_, i64>(5)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(host)
    }

    pub fn latest_memory(&self) -> Result<Option<MemorySample>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let sample = conn
            .query_row(
                "SELECT host_id, timestamp, available_bytes, total_bytes \
                 FROM MemorySample ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| {
                    Ok(Sample {
                        host_id: row.get(0)?,
                        timestamp: row.get(1)?,
                        reading: MemoryReading {
                            available_bytes: row.get::<_, i64>(2)? as u64,
                            total_bytes: row.get::<_, i64>(3)? as u64,
                        },
                    })
                },
            )
            .optional()?;
        Ok(sample)
    }

    pub fn latest_power(&self) -> Result<Option<PowerSample>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let sample = conn
            .query_row(
                "SELECT host_id, timestamp, remaining_capacity, remaining_seconds, temperature_c, charging \
                 FROM PowerSample ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| {
                    Ok(Sample {
                        host_id: row.get(0)?,
                        timestamp: row.get(1)?,
                        reading: PowerReading {
                            remaining_capacity: row.get(2)?,
                            remaining_seconds: row.get(3)?,
                            temperature_c: row.get(4)?,
                            charging: row.get(5)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(sample)
    }

    pub fn latest_system(&self) -> Result<Option<SystemSample>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let sample = conn
            .query_row(
                "SELECT host_id, timestamp, boot_time_ms, uptime_ms, process_count, service_count, thread_count \
                 FROM SystemSample ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| {
                    Ok(Sample {
                        host_id: row.get(0)?,
                        timestamp: row.get(1)?,
                        reading: SystemReading {
                            boot_time_ms: row.get(2)?,
                            uptime_ms: row.get(3)?,
                            process_count: row.get(4)?,
                            service_count: row.get(5)?,
                            thread_count: row.get(6)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(sample)
    }

    /// Process rows from the newest generation, ordered by pid.
    pub fn latest_processes(&self) -> Result<Vec<ProcessSample>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let mut stmt = conn.prepare(
            "SELECT host_id, timestamp, pid, name, user, start_time_ms, uptime_ms, cpu_usage \
             FROM ProcessSample \
             WHERE timestamp = (SELECT MAX(timestamp) FROM ProcessSample) \
             ORDER BY pid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Sample {
                host_id: row.get(0)?,
                timestamp: row.get(1)?,
                reading: ProcessReading {
                    pid: row.get(2)?,
                    name: row.get(3)?,
                    user: row.get(4)?,
                    start_time_ms: row.get(5)?,
                    uptime_ms: row.get(6)?,
                    cpu_usage: row.get(7)?,
                },
            })
        })?;
        collect_rows(rows)
    }

    /// Per-core rows from the newest generation, ordered by core index.
    pub fn latest_cpu_cores(&self) -> Result<Vec<CpuCoreSample>, StoreError> {
        let conn = self.store.connect_read_only()?;
        let mut stmt = conn.prepare(
            "SELECT host_id, timestamp, core_index, current_frequency_hz, max_frequency_hz, \
                    user_ticks, nice_ticks, system_ticks, idle_ticks, io_wait_ticks, \
                    irq_ticks, soft_irq_ticks, steal_ticks \
             FROM CpuCoreSample \
             WHERE timestamp = (SELECT MAX(timestamp) FROM CpuCoreSample) \
             ORDER BY core_index",
        )?;
        let rows = stmt.query_map([], core_sample_from_row)?;
        collect_rows(rows)
    }

    /// Distinct cycle timestamps present in `table`, oldest first.
    pub fn distinct_timestamps(&self, table: &str) -> Result<Vec<Timestamp>, StoreError> {
        let table = checked_table(table)?;
        if table == "Host" {
            return Ok(Vec::new());
        }
        let conn = self.store.connect_read_only()?;
        let mut stmt =
            conn.prepare(&format!("SELECT DISTINCT timestamp FROM {table} ORDER BY timestamp"))?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        collect_rows(rows)
    }

    /// Newest cycle timestamp stored in `table`, if it has any rows.
    pub fn newest_timestamp(&self, table: &str) -> Result<Option<Timestamp>, StoreError> {
        let table = checked_table(table)?;
        if table == "Host" {
            return Ok(None);
        }
        let conn = self.store.connect_read_only()?;
        let newest = conn.query_row(&format!("SELECT MAX(timestamp) FROM {table}"), [], |row| {
            row.get::<_, Option<i64>>(0)
        })?;
        Ok(newest)
    }

    pub fn row_count(&self, table: &str) -> Result<u64, StoreError> {
        let table = checked_table(table)?;
        let conn = self.store.connect_read_only()?;
        count_rows(&conn, table)
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64, StoreError> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

fn core_sample_from_row(row: &Row<'_>) -> rusqlite::Result<CpuCoreSample> {
    let tick = |i: usize| row.get::<_, i64>(i).map(|v| v as u64);
    Ok(Sample {
        host_id: row.get(0)?,
        timestamp: row.get(1)?,
        reading: CoreReading {
            index: row.get(2)?,
            current_frequency_hz: tick(3)?,
            max_frequency_hz: tick(4)?,
            ticks: CoreTicks {
                user: tick(5)?,
                nice: tick(6)?,
                system: tick(7)?,
                idle: tick(8)?,
                io_wait: tick(9)?,
                irq: tick(10)?,
                soft_irq: tick(11)?,
                steal: tick(12)?,
            },
        },
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, StoreError> {
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}
