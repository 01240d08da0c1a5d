use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use enrich_core::{
    ConstantTable, Enrichment, FractionCfg, LoadCfg, LoadEnrichment, Runner, TaperTable,
    ThrottleCfg, ThrottleEnrichment, TraceRow,
};

// Synthetic trace: slow throttle sweep with periodic stabs, cycle end every 4th tick
fn synth_trace(n: usize, seed: u32) -> Vec<TraceRow> {
    let mut state = seed.max(1);
    let mut next_f32 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x as f32) / (u32::MAX as f32 + 1.0)
    };
    (0..n)
        .map(|i| {
            let base = 20.0 + 10.0 * (i as f32 / 300.0).sin();
            let stab = if i % 500 < 20 { 60.0 } else { 0.0 };
            TraceRow {
                tps: (base + stab + next_f32()).clamp(0.0, 100.0),
                load: 30.0 + stab * 0.5,
                cycle_end: i % 4 == 3,
            }
        })
        .collect()
}

fn runner(history_len: usize, period: i32) -> Runner<ConstantTable, TaperTable> {
    let tcfg = ThrottleCfg {
        accel_threshold: 10.0,
        decel_threshold: 10.0,
        decel_multiplier: 0.05,
        history_len,
        fraction: FractionCfg {
            period,
            divisor: 2.0,
        },
    };
    let lcfg = LoadCfg {
        accel_multiplier: 0.1,
        decel_multiplier: 0.1,
        history_len,
        ..LoadCfg::default()
    };
    Runner::new(
        ThrottleEnrichment::new(tcfg, ConstantTable(5.0)).unwrap(),
        LoadEnrichment::new(lcfg, TaperTable::flat()).unwrap(),
    )
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("tick");
    // BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p enrich_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(20_000, 0xC0FFEE);
    for &len in &[4usize, 16, 32] {
        g.bench_function(format!("replay_len_{len}"), |b| {
            b.iter_batched(
                || runner(len, 3),
                |mut r| {
                    let mut total = 0.0f32;
                    for row in &trace {
                        total += r.tick(black_box(row)).total_ms();
                    }
                    black_box(total);
                },
                BatchSize::SmallInput,
            )
        });
    }

    g.bench_function("compute_correction_len_32", |b| {
        let mut t = ThrottleEnrichment::new(
            ThrottleCfg {
                history_len: 32,
                ..ThrottleCfg::default()
            },
            ConstantTable(5.0),
        )
        .unwrap();
        for row in &trace[..32] {
            t.sample(row.tps);
        }
        b.iter(|| black_box(t.compute_correction()));
    });
    g.finish();
}

criterion_group!(tick, bench_tick);
criterion_main!(tick);
