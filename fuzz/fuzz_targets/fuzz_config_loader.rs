#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<enrich_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A validated config must always build, and ticking it must not panic.
    let mut runner = match enrich_core::build_runner(&cfg, None, None) {
        Ok(r) => r,
        Err(e) => panic!("validated config failed to build: {e:#}"),
    };
    for (i, b) in data.bytes().enumerate() {
        runner.tick(&enrich_core::TraceRow {
            tps: f32::from(b) * 100.0 / 255.0,
            load: f32::from(b.rotate_left(3)),
            cycle_end: i % 4 == 3,
        });
    }
});
