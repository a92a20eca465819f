use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use cruise_core::{ButtonId, ButtonCfg, InputDebouncer, Supervisor, parse_line};
use cruise_hardware::{SimulatedInputs, SimulatedServo, SimulatedVehicle};
use cruise_traits::clock::test_clock::TestClock;

fn supervisor(clock: &TestClock) -> Supervisor {
    let mut sup = Supervisor::builder()
        .with_sensors(SimulatedVehicle::new(60, 1800, 10))
        .with_actuator(SimulatedServo::new())
        .with_inputs(SimulatedInputs::new())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    sup.begin().unwrap();
    sup
}

fn sample_size(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // BENCH_SAMPLE_SIZE=10 cargo bench -p cruise_core --bench tick
    let n = std::env::var("BENCH_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(50);
    g.sample_size(n.max(10));
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("supervisor_tick");
    sample_size(&mut g);

    // A full second of loop iterations: pedal, sensor, evaluation and status tasks all fire.
    g.bench_function("one_second_idle", |b| {
        b.iter_batched(
            || {
                let clock = TestClock::new();
                (supervisor(&clock), clock)
            },
            |(mut sup, clock)| {
                for _ in 0..100 {
                    black_box(sup.tick().unwrap());
                    clock.advance_ms(10);
                }
            },
            BatchSize::SmallInput,
        );
    });

    g.bench_function("single_tick_nothing_due", |b| {
        let clock = TestClock::new();
        let mut sup = supervisor(&clock);
        sup.tick().unwrap();
        b.iter(|| black_box(sup.tick().unwrap()));
    });
    g.finish();
}

pub fn bench_inputs(c: &mut Criterion) {
    let mut g = c.benchmark_group("inputs");
    sample_size(&mut g);

    g.bench_function("debounce_hold_cycle", |b| {
        b.iter(|| {
            let mut d = InputDebouncer::new(ButtonCfg::default());
            let mut fired = 0;
            let mut lines = [false; 4];
            lines[ButtonId::A.index()] = true;
            for t in (0..3000u64).step_by(10) {
                fired += d.sample(black_box(lines), true, t).len();
            }
            black_box(fired)
        });
    });

    g.bench_function("parse_serial_line", |b| {
        b.iter(|| {
            for line in ["s=80", "r=2500", "p=45", "d=1", "x=1"] {
                black_box(parse_line(black_box(line)));
            }
        });
    });
    g.finish();
}

criterion_group!(benches, bench_tick, bench_inputs);
criterion_main!(benches);
