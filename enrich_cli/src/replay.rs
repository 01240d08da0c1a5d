//! Trace replay: config mapping, runtime overrides, and per-tick output.

use crate::cli::ReplayOpts;
use crate::error_fmt::Stage;
use enrich_config::{Config, DebugMode, TaperData, ThrottleTableData};
use enrich_core::{
    Corrections, Enrichment, Runner, TaperTable, ThrottleTable, TraceRow, build_runner,
};
use enrich_traits::{DebugSink, DebugSnapshot};
use eyre::{Result, WrapErr};
use serde_json::json;
use std::io::Write;
use std::time::Instant;

/// Debug sink for the CLI: JSON lines on stdout with `--json`, debug events otherwise.
struct SnapshotPrinter {
    json: bool,
}

impl DebugSink for SnapshotPrinter {
    fn publish(&mut self, snapshot: &DebugSnapshot) {
        match (snapshot, self.json) {
            (DebugSnapshot::Throttle(s), true) => println!(
                "{}",
                json!({
                    "debug": "tps_accel",
                    "tps_from": s.tps_from,
                    "tps_to": s.tps_to,
                    "table_value": s.table_value,
                    "extra_ms": s.extra_ms,
                    "accumulated_ms": s.accumulated_ms,
                    "max_extra_per_period_ms": s.max_extra_per_period_ms,
                    "max_injected_per_period_ms": s.max_injected_per_period_ms,
                    "cycle_countdown": s.cycle_countdown,
                })
            ),
            (DebugSnapshot::Load(s), true) => println!(
                "{}",
                json!({
                    "debug": "load_accel",
                    "distance": s.distance,
                    "result_ms": s.result_ms,
                    "taper": s.taper,
                })
            ),
            (DebugSnapshot::Throttle(s), false) => tracing::debug!(
                tps_from = s.tps_from,
                tps_to = s.tps_to,
                table_value = s.table_value,
                extra_ms = s.extra_ms,
                accumulated_ms = s.accumulated_ms,
                cycle_countdown = s.cycle_countdown,
                "tps_accel"
            ),
            (DebugSnapshot::Load(s), false) => tracing::debug!(
                distance = s.distance,
                result_ms = s.result_ms,
                taper = s.taper,
                "load_accel"
            ),
        }
    }
}

/// Apply the command-line overrides. A rejected history length is reported and
/// the configured one kept; everything else is taken as given.
pub fn apply_overrides(runner: &mut Runner<ThrottleTable, TaperTable>, opts: &ReplayOpts) {
    let mut tcfg = *runner.throttle().config();
    if let Some(v) = opts.tps_accel_thr {
        tcfg.accel_threshold = v;
    }
    if let Some(v) = opts.tps_decel_thr {
        tcfg.decel_threshold = v;
    }
    if let Some(v) = opts.tps_decel_mult {
        tcfg.decel_multiplier = v;
    }
    if let Some(n) = opts.tps_accel_len {
        match runner.throttle_mut().set_capacity(n) {
            Ok(()) => tcfg.history_len = runner.throttle().history().capacity(),
            Err(e) => eprintln!("--tps-accel-len: {e}; keeping {}", tcfg.history_len),
        }
    }
    // history length already matches, so this cannot fail
    if let Err(e) = runner.throttle_mut().reconfigure(tcfg) {
        tracing::warn!(error = %e, "tps overrides not applied");
    }

    let mut lcfg = *runner.load().config();
    if let Some(v) = opts.load_accel_thr {
        lcfg.accel_threshold = v;
    }
    if let Some(v) = opts.load_accel_mult {
        lcfg.accel_multiplier = v;
    }
    if let Some(v) = opts.load_decel_thr {
        lcfg.decel_threshold = v;
    }
    if let Some(v) = opts.load_decel_mult {
        lcfg.decel_multiplier = v;
    }
    if let Some(n) = opts.load_accel_len {
        match runner.load_mut().set_capacity(n) {
            Ok(()) => lcfg.history_len = runner.load().history().capacity(),
            Err(e) => eprintln!("--load-accel-len: {e}; keeping {}", lcfg.history_len),
        }
    }
    if let Err(e) = runner.load_mut().reconfigure(lcfg) {
        tracing::warn!(error = %e, "load overrides not applied");
    }
}

fn attach_debug_sink(runner: &mut Runner<ThrottleTable, TaperTable>, mode: DebugMode, json: bool) {
    let sink = Box::new(SnapshotPrinter { json });
    match mode {
        DebugMode::Off => {}
        DebugMode::TpsAccel => runner.throttle_mut().set_debug_sink(Some(sink)),
        DebugMode::LoadAccel => runner.load_mut().set_debug_sink(Some(sink)),
    }
}

/// Observed `(min, max)` per correction; `None` until the first row.
#[derive(Debug, Default)]
struct Summary {
    rows: usize,
    tps_ms: Option<(f32, f32)>,
    load_ms: Option<(f32, f32)>,
}

fn widen(range: Option<(f32, f32)>, v: f32) -> Option<(f32, f32)> {
    Some(range.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
}

impl Summary {
    fn add(&mut self, c: &Corrections) {
        self.rows += 1;
        self.tps_ms = widen(self.tps_ms, c.tps_ms);
        self.load_ms = widen(self.load_ms, c.load_ms);
    }

    fn tps_range(&self) -> (f32, f32) {
        self.tps_ms.unwrap_or_default()
    }

    fn load_range(&self) -> (f32, f32) {
        self.load_ms.unwrap_or_default()
    }
}

pub fn run_replay(
    cfg: &Config,
    table: Option<&ThrottleTableData>,
    taper: Option<&TaperData>,
    opts: &ReplayOpts,
    json: bool,
) -> Result<()> {
    let samples = enrich_config::load_trace_csv(&opts.trace)
        .wrap_err_with(|| format!("read trace {}", opts.trace.display()))
        .wrap_err(Stage::Trace)?;
    let rows: Vec<TraceRow> = samples.iter().map(TraceRow::from).collect();

    let mut runner = build_runner(cfg, table, taper).wrap_err(Stage::Config)?;
    apply_overrides(&mut runner, opts);
    attach_debug_sink(&mut runner, cfg.debug.mode, json);
    tracing::info!(
        rows = rows.len(),
        tps_len = runner.throttle().history().capacity(),
        load_len = runner.load().history().capacity(),
        "replay start"
    );

    let mut latencies_ns: Vec<u64> = Vec::with_capacity(if opts.stats { rows.len() } else { 0 });
    let mut summary = Summary::default();
    // debug snapshots are printed between their rows
    let mut out = std::io::stdout().lock();

    for (i, row) in rows.iter().enumerate() {
        let t0 = Instant::now();
        let c = runner.tick(row);
        if opts.stats {
            latencies_ns.push(u64::try_from(t0.elapsed().as_nanos()).unwrap_or(u64::MAX));
        }
        summary.add(&c);
        if json {
            writeln!(
                out,
                "{}",
                json!({
                    "row": i,
                    "tps": row.tps,
                    "load": row.load,
                    "cycle_end": row.cycle_end,
                    "tps_ms": c.tps_ms,
                    "load_ms": c.load_ms,
                    "total_ms": c.total_ms(),
                })
            )?;
        } else {
            writeln!(
                out,
                "{i:>6}  tps={:>7.2} load={:>7.2}{}  tps_ms={:>8.3} load_ms={:>8.3}",
                row.tps,
                row.load,
                if row.cycle_end { " |" } else { "  " },
                c.tps_ms,
                c.load_ms
            )?;
        }
    }

    let (min_tps_ms, peak_tps_ms) = summary.tps_range();
    let (min_load_ms, peak_load_ms) = summary.load_range();
    if json {
        writeln!(
            out,
            "{}",
            json!({
                "summary": {
                    "rows": summary.rows,
                    "cycles": runner.cycles(),
                    "peak_tps_ms": peak_tps_ms,
                    "min_tps_ms": min_tps_ms,
                    "peak_load_ms": peak_load_ms,
                    "min_load_ms": min_load_ms,
                }
            })
        )?;
    } else {
        writeln!(
            out,
            "Replay complete: rows={} cycles={} tps_ms[min/max]={:.3}/{:.3} load_ms[min/max]={:.3}/{:.3}",
            summary.rows,
            runner.cycles(),
            min_tps_ms,
            peak_tps_ms,
            min_load_ms,
            peak_load_ms
        )?;
    }
    out.flush()?;

    if opts.stats {
        print_stats(&latencies_ns);
    }
    Ok(())
}

/// Print the effective parameters, the way `accelinfo` does on the console.
pub fn print_info(
    cfg: &Config,
    table: Option<&ThrottleTableData>,
    taper: Option<&TaperData>,
    json: bool,
) -> Result<()> {
    // Building validates the tables as well.
    let runner = build_runner(cfg, table, taper).wrap_err(Stage::Config)?;
    let t = runner.throttle().config();
    let l = runner.load().config();
    let table_dims = table
        .or(cfg.throttle.table.as_ref())
        .map(|d| (d.from_bins.len(), d.to_bins.len()));

    if json {
        println!(
            "{}",
            json!({
                "tps": {
                    "history_len": t.history_len,
                    "accel_threshold": t.accel_threshold,
                    "decel_threshold": t.decel_threshold,
                    "decel_multiplier": t.decel_multiplier,
                    "fraction_period": t.fraction.period,
                    "fraction_divisor": t.fraction.divisor,
                    "table": table_dims.map(|(f, to)| json!([f, to])),
                },
                "load": {
                    "history_len": l.history_len,
                    "accel_threshold": l.accel_threshold,
                    "decel_threshold": l.decel_threshold,
                    "accel_multiplier": l.accel_multiplier,
                    "decel_multiplier": l.decel_multiplier,
                    "cylinders": l.cylinders,
                },
                "debug_mode": format!("{:?}", cfg.debug.mode),
            })
        );
        return Ok(());
    }

    println!("tps accel length={}", t.history_len);
    println!(
        "tps accel threshold={:.2} decel threshold={:.2} decel multiplier={:.4}",
        t.accel_threshold, t.decel_threshold, t.decel_multiplier
    );
    println!(
        "tps fraction period={} divisor={:.2}",
        t.fraction.period, t.fraction.divisor
    );
    match table_dims {
        Some((f, to)) => println!("tps table {f}x{to}"),
        None => println!("tps table none (0 ms)"),
    }
    println!("load accel length={} cylinders={}", l.history_len, l.cylinders);
    println!(
        "load accel threshold={:.2} multiplier={:.4}",
        l.accel_threshold, l.accel_multiplier
    );
    println!(
        "load decel threshold={:.2} multiplier={:.4}",
        l.decel_threshold, l.decel_multiplier
    );
    println!("debug mode={:?}", cfg.debug.mode);
    Ok(())
}

fn print_stats(latencies_ns: &[u64]) {
    let min = *latencies_ns.iter().min().unwrap_or(&0);
    let max = *latencies_ns.iter().max().unwrap_or(&0);
    let avg = if latencies_ns.is_empty() {
        0.0
    } else {
        latencies_ns.iter().sum::<u64>() as f64 / latencies_ns.len() as f64
    };
    let stdev = if latencies_ns.len() > 1 {
        let mean = avg;
        let var = latencies_ns
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / (latencies_ns.len() as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    eprintln!("\n--- Enrich Stats ---");
    eprintln!("Ticks: {}", latencies_ns.len());
    eprintln!("Latency min/avg/max/stdev (ns): {min} / {avg:.1} / {max} / {stdev:.1}");
    eprintln!("--------------------\n");
}
