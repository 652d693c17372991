use insta::assert_snapshot;
use metrik::clock::ManualClock;
use metrik::collector::Collector;
use metrik::model::HostIdentity;
use metrik::store::{Repository, Store};
use metrik::system::fake::ScriptedSensor;

fn host() -> HostIdentity {
    HostIdentity {
        os: "Linux".to_string(),
        code_name: "Focal".to_string(),
        version: "20.04".to_string(),
        cpu_signature: "Intel i7".to_string(),
        physical_cores: 4,
        vendor_frequency_hz: 3_000_000_000,
    }
}

fn table_names(repo: &Repository) -> String {
    repo.query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .unwrap()
    .iter()
    .filter_map(|row| row.get_str("name").map(str::to_string))
    .collect::<Vec<_>>()
    .join(",")
}

#[test]
fn schema_tables_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("nested").join("metrik.db"));
    store.ensure_schema().unwrap();
    // Second pass must be a no-op.
    store.ensure_schema().unwrap();

    let repo = Repository::new(store);
    assert_snapshot!(
        table_names(&repo),
        @"CpuCoreSample,Host,MemorySample,PowerSample,ProcessSample,SystemSample"
    );
}

#[test]
fn host_row_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("metrik.db"));
    let mut collector = Collector::with_clock(ScriptedSensor::new(host()), store, ManualClock::new(0));
    collector.bootstrap(true).unwrap();

    let rows = collector.repository().query("SELECT * FROM Host").unwrap();
    assert_eq!(rows.len(), 1);
    assert_snapshot!(
        rows[0].to_json().to_string(),
        @r#"{"code_name":"Focal","cpu_signature":"Intel i7","id":1,"os":"Linux","physical_cores":4,"vendor_frequency_hz":3000000000,"version":"20.04"}"#
    );
}

#[test]
fn reset_discards_previous_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrik.db");
    let clock = ManualClock::stepping(1000, 1000);

    let mut collector = Collector::with_clock(
        ScriptedSensor::new(host()).with_entities(2, 2),
        Store::new(&path),
        &clock,
    );
    collector.bootstrap(true).unwrap();
    collector.run_cycle();
    collector.run_cycle();
    assert_eq!(collector.repository().row_count("MemorySample").unwrap(), 2);

    let mut fresh = Collector::with_clock(
        ScriptedSensor::new(host()).with_entities(2, 2),
        Store::new(&path),
        &clock,
    );
    fresh.bootstrap(true).unwrap();
    let repo = fresh.repository();
    assert_eq!(repo.row_count("Host").unwrap(), 1);
    for table in ["MemorySample", "PowerSample", "ProcessSample", "SystemSample", "CpuCoreSample"] {
        assert_eq!(repo.row_count(table).unwrap(), 0, "{table}");
    }
}

#[test]
fn malformed_query_is_an_error_not_an_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("metrik.db"));
    store.ensure_schema().unwrap();
    let repo = Repository::new(store);

    assert!(repo.query("SELECT * FROM MemorySample").unwrap().is_empty());
    assert!(repo.query("SELEC nonsense").is_err());
    assert!(repo.query("SELECT * FROM NoSuchTable").is_err());
}
