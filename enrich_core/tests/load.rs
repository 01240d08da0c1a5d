use enrich_core::mocks::RecordingSink;
use enrich_core::{ConstantTable, Enrichment, LoadCfg, LoadEnrichment, TaperTable};
use enrich_traits::DebugSnapshot;

fn cfg(cylinders: u32) -> LoadCfg {
    LoadCfg {
        accel_threshold: 2.0,
        decel_threshold: 2.0,
        accel_multiplier: 0.5,
        decel_multiplier: 0.1,
        history_len: 4,
        cylinders,
    }
}

fn taper() -> TaperTable {
    TaperTable::new(vec![0.0, 1.0, 2.0, 4.0], vec![1.0, 0.5, 0.25, 0.0]).unwrap()
}

fn feed<E: Enrichment>(e: &mut E, values: &[f32]) {
    for v in values {
        e.sample(*v);
    }
}

#[test]
fn fresh_jump_uses_first_taper_step() {
    let mut l = LoadEnrichment::new(cfg(4), taper()).unwrap();
    feed(&mut l, &[10.0, 10.0, 10.0, 12.0]);
    // d = 2 * 4 cylinders, taper(1) = 0.5
    assert_eq!(l.compute_correction(), 2.0);
}

#[test]
fn older_jump_is_tapered_further() {
    let sink = RecordingSink::new();
    let mut l = LoadEnrichment::new(cfg(4), taper())
        .unwrap()
        .with_debug_sink(Box::new(sink.clone()));
    feed(&mut l, &[10.0, 12.0, 12.0, 12.0]);
    assert_eq!(l.compute_correction(), 0.5);
    let Some(DebugSnapshot::Load(s)) = sink.last() else {
        panic!("expected load snapshot");
    };
    assert_eq!(s.distance, 3);
    assert_eq!(s.taper, 0.125);
    assert_eq!(s.result_ms, 0.5);
}

#[test]
fn decel_ignores_taper() {
    let mut l = LoadEnrichment::new(cfg(4), ConstantTable(0.0)).unwrap();
    feed(&mut l, &[30.0, 25.0, 20.0, 15.0]);
    let v = l.compute_correction();
    assert!((v + 2.0).abs() < 1e-6, "got {v}");
}

#[test]
fn cylinders_scale_the_delta() {
    // 0.6 load per sample: below threshold for one cylinder, above it for four
    let mut one = LoadEnrichment::new(cfg(1), ConstantTable(1.0)).unwrap();
    let mut four = LoadEnrichment::new(cfg(4), ConstantTable(1.0)).unwrap();
    for l in [&mut one, &mut four] {
        feed(l, &[10.0, 10.6, 11.2, 11.8]);
    }
    assert_eq!(one.compute_correction(), 0.0);
    assert!(four.compute_correction() > 0.0);
}

#[test]
fn zero_cylinders_counts_as_one() {
    let mut l = LoadEnrichment::new(cfg(0), ConstantTable(1.0)).unwrap();
    feed(&mut l, &[10.0, 20.0]);
    assert_eq!(l.compute_correction(), 5.0);
}

#[test]
fn reset_clears_window() {
    let mut l = LoadEnrichment::new(cfg(4), ConstantTable(1.0)).unwrap();
    feed(&mut l, &[10.0, 20.0]);
    l.reset();
    assert!(l.history().is_empty());
    assert_eq!(l.compute_correction(), 0.0);
}

#[test]
fn snapshot_reports_distance_only_on_accel() {
    let sink = RecordingSink::new();
    let mut l = LoadEnrichment::new(cfg(4), taper())
        .unwrap()
        .with_debug_sink(Box::new(sink.clone()));
    feed(&mut l, &[30.0, 25.0, 20.0, 15.0]);
    l.compute_correction();
    let Some(DebugSnapshot::Load(s)) = sink.last() else {
        panic!("expected load snapshot");
    };
    assert_eq!((s.distance, s.taper), (0, 0.0));
    assert!((s.result_ms + 2.0).abs() < 1e-6);

    feed(&mut l, &[15.0, 15.0, 15.0, 15.0]);
    l.compute_correction();
    let Some(DebugSnapshot::Load(s)) = sink.last() else {
        panic!("expected load snapshot");
    };
    assert_eq!((s.distance, s.taper, s.result_ms), (0, 0.0, 0.0));
}

#[test]
fn repeated_compute_is_idempotent() {
    let mut l = LoadEnrichment::new(cfg(4), taper()).unwrap();
    feed(&mut l, &[10.0, 12.0, 12.0, 12.0]);
    let first = l.compute_correction();
    assert_eq!(first, 0.5);
    assert_eq!(l.compute_correction(), first);
    assert_eq!(l.compute_correction(), first);
    assert_eq!(l.history().len(), 4);
}
