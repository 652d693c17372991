use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use metrik::clock::ManualClock;
use metrik::collector::Collector;
use metrik::model::{HostIdentity, ProcessReading, stamp_all};
use metrik::store::{Repository, Store};
use metrik::system::fake::ScriptedSensor;

fn host() -> HostIdentity {
    HostIdentity {
        os: "Linux".to_string(),
        code_name: "Focal".to_string(),
        version: "20.04".to_string(),
        cpu_signature: "Intel i7".to_string(),
        physical_cores: 8,
        vendor_frequency_hz: 3_000_000_000,
    }
}

fn make_processes(n: u32) -> Vec<ProcessReading> {
    (1..=n)
        .map(|pid| ProcessReading {
            pid,
            name: format!("proc_{pid}"),
            user: format!("u{}", pid % 8),
            start_time_ms: 1_000,
            uptime_ms: 60_000,
            cpu_usage: f64::from(pid % 100) / 100.0,
        })
        .collect()
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("collector_cycle");
    for &processes in &[50u32, 500, 2_000] {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::stepping(1_000, 1_000);
        let mut collector = Collector::with_clock(
            ScriptedSensor::new(host()).with_entities(processes, 8),
            Store::new(dir.path().join("bench.db")),
            &clock,
        );
        collector.bootstrap(true).unwrap();

        group.bench_with_input(
            BenchmarkId::new("run_cycle", processes),
            &processes,
            |b, _| b.iter(|| black_box(collector.run_cycle())),
        );
    }
    group.finish();
}

fn bench_process_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_insert");
    for &n in &[100u32, 1_000] {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("bench.db"));
        let mut collector = Collector::with_clock(
            ScriptedSensor::new(host()),
            store.clone(),
            ManualClock::new(0),
        );
        collector.bootstrap(true).unwrap();
        let repo = Repository::new(store);
        let readings = make_processes(n);
        let mut timestamp = 0;

        group.bench_with_input(BenchmarkId::new("generation", n), &n, |b, _| {
            b.iter(|| {
                timestamp += 1;
                let samples = stamp_all(timestamp, readings.clone());
                black_box(repo.insert_process_samples(&samples).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cycle, bench_process_insert);
criterion_main!(benches);
