pub const TABLES: [&str; 6] = [
    "Host",
    "MemorySample",
    "PowerSample",
    "ProcessSample",
    "SystemSample",
    "CpuCoreSample",
];

pub const PRAGMAS: &str = "\
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
";

pub const SCHEMA_DDL: &str = "\
CREATE TABLE IF NOT EXISTS Host (
    id                  INTEGER PRIMARY KEY,
    os                  TEXT    NOT NULL,
    code_name           TEXT    NOT NULL,
    version             TEXT    NOT NULL,
    cpu_signature       TEXT    NOT NULL,
    physical_cores      INTEGER NOT NULL,
    vendor_frequency_hz INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS MemorySample (
    host_id         INTEGER NOT NULL,
    timestamp       INTEGER NOT NULL,
    available_bytes INTEGER NOT NULL,
    total_bytes     INTEGER NOT NULL,
    PRIMARY KEY (host_id, timestamp),
    FOREIGN KEY (host_id) REFERENCES Host(id)
);

CREATE TABLE IF NOT EXISTS PowerSample (
    host_id            INTEGER NOT NULL,
    timestamp          INTEGER NOT NULL,
    remaining_capacity REAL    NOT NULL,
    remaining_seconds  REAL    NOT NULL,
    temperature_c      REAL    NOT NULL,
    charging           INTEGER NOT NULL,
    PRIMARY KEY (host_id, timestamp),
    FOREIGN KEY (host_id) REFERENCES Host(id)
);

CREATE TABLE IF NOT EXISTS ProcessSample (
    host_id       INTEGER NOT NULL,
    timestamp     INTEGER NOT NULL,
    pid           INTEGER NOT NULL,
    name          TEXT    NOT NULL,
    user          TEXT    NOT NULL,
    start_time_ms INTEGER NOT NULL,
    uptime_ms     INTEGER NOT NULL,
    cpu_usage     REAL    NOT NULL,
    PRIMARY KEY (host_id, timestamp, pid),
    FOREIGN KEY (host_id) REFERENCES Host(id)
);
CREATE INDEX IF NOT EXISTS idx_process_sample_ts ON ProcessSample(timestamp);

CREATE TABLE IF NOT EXISTS SystemSample (
    host_id       INTEGER NOT NULL,
    timestamp     INTEGER NOT NULL,
    boot_time_ms  INTEGER NOT NULL,
    uptime_ms     INTEGER NOT NULL,
    process_count INTEGER NOT NULL,
    service_count INTEGER NOT NULL,
    thread_count  INTEGER NOT NULL,
    PRIMARY KEY (host_id, timestamp),
    FOREIGN KEY (host_id) REFERENCES Host(id)
);

CREATE TABLE IF NOT EXISTS CpuCoreSample (
    host_id              INTEGER NOT NULL,
    timestamp            INTEGER NOT NULL,
    core_index           INTEGER NOT NULL,
    current_frequency_hz INTEGER NOT NULL,
    max_frequency_hz     INTEGER NOT NULL,
    user_ticks           INTEGER NOT NULL,
    nice_ticks           INTEGER NOT NULL,
    system_ticks         INTEGER NOT NULL,
    idle_ticks           INTEGER NOT NULL,
    io_wait_ticks        INTEGER NOT NULL,
    irq_ticks            INTEGER NOT NULL,
    soft_irq_ticks       INTEGER NOT NULL,
    steal_ticks          INTEGER NOT NULL,
    PRIMARY KEY (host_id, timestamp, core_index),
    FOREIGN KEY (host_id) REFERENCES Host(id)
);
CREATE INDEX IF NOT EXISTS idx_cpu_core_sample_ts ON CpuCoreSample(timestamp);
";

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn ddl_executes_on_in_memory_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(PRAGMAS).unwrap();
        conn.execute_batch(SCHEMA_DDL).unwrap();
    }

    #[test]
    fn ddl_creates_every_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_DDL).unwrap();
        for table in TABLES {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[test]
    fn composite_key_rejects_duplicate_generation_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(PRAGMAS).unwrap();
        conn.execute_batch(SCHEMA_DDL).unwrap();
        conn.execute(
            "INSERT INTO Host (id, os, code_name, version, cpu_signature, physical_cores, vendor_frequency_hz) \
             VALUES (1, 'Linux', 'Focal', '20.04', 'Intel i7', 4, 3000000000)",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO ProcessSample \
                      (host_id, timestamp, pid, name, user, start_time_ms, uptime_ms, cpu_usage) \
                      VALUES (1, 1000, 7, 'init', 'root', 0, 0, 0.0)";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn foreign_key_requires_host_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(PRAGMAS).unwrap();
        conn.execute_batch(SCHEMA_DDL).unwrap();
        let result = conn.execute(
            "INSERT INTO MemorySample (host_id, timestamp, available_bytes, total_bytes) \
             VALUES (1, 1000, 1, 2)",
            [],
        );
        assert!(result.is_err());
    }
}
