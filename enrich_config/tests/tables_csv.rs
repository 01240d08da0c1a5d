use std::fs::File;
use std::io::Write;

use enrich_config::{load_taper_csv, load_throttle_table_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    path
}

#[rstest]
fn throttle_csv_builds_full_grid() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "tps.csv",
        &[
            "from,to,extra_ms",
            "0,0,0.0",
            "0,100,8.0",
            "100,0,0.0",
            "100,100,0.0",
        ],
    );
    let t = load_throttle_table_csv(&path).unwrap();
    assert_eq!(t.from_bins, vec![0.0, 100.0]);
    assert_eq!(t.to_bins, vec![0.0, 100.0]);
    assert_eq!(t.values[0][1], 8.0);
}

#[rstest]
fn throttle_csv_rejects_bad_headers() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "tps.csv", &["from,to,value", "0,0,0.0"]);
    let err = load_throttle_table_csv(&path).expect_err("bad headers");
    assert!(
        format!("{err}").contains("throttle table CSV must have headers 'from,to,extra_ms'")
    );
}

#[rstest]
fn throttle_csv_rejects_missing_cell() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "tps.csv",
        &["from,to,extra_ms", "0,0,0.0", "0,100,8.0", "100,0,0.0"],
    );
    let err = load_throttle_table_csv(&path).expect_err("missing cell");
    assert!(format!("{err}").contains("missing cell from=100 to=100"));
}

#[rstest]
fn throttle_csv_rejects_duplicate_cell() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "tps.csv",
        &["from,to,extra_ms", "0,0,0.0", "0,0,1.0"],
    );
    let err = load_throttle_table_csv(&path).expect_err("duplicate cell");
    assert!(format!("{err}").contains("duplicate cell"));
}

#[rstest]
fn throttle_csv_reports_unparsable_row() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "tps.csv", &["from,to,extra_ms", "0,zero,1.0"]);
    let err = load_throttle_table_csv(&path).expect_err("bad row");
    assert!(format!("{err}").contains("invalid CSV row 2"));
}

#[rstest]
fn taper_csv_round_trips_into_curve() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "taper.csv",
        &["distance,mult", "1,1.0", "2,0.5", "4,0.0"],
    );
    let t = load_taper_csv(&path).unwrap();
    assert_eq!(t.bins, vec![1.0, 2.0, 4.0]);
    assert_eq!(t.mult, vec![1.0, 0.5, 0.0]);
}

#[rstest]
fn taper_csv_rejects_non_increasing_distance() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "taper.csv", &["distance,mult", "2,1.0", "1,0.5"]);
    let err = load_taper_csv(&path).expect_err("not increasing");
    assert!(format!("{err}").contains("strictly increasing"));
}

#[rstest]
fn trace_csv_accepts_numeric_and_word_flags() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "trace.csv",
        &["tps,load,cycle_end", "20,0.3,0", "85,0.35,1", "85,0.9,true"],
    );
    let rows = enrich_config::load_trace_csv(&path).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(!rows[0].cycle_end);
    assert!(rows[1].cycle_end);
    assert!(rows[2].cycle_end);
    assert_eq!(rows[1].tps, 85.0);
}

#[rstest]
fn trace_csv_rejects_bad_flag() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "trace.csv", &["tps,load,cycle_end", "20,0.3,maybe"]);
    let err = enrich_config::load_trace_csv(&path).expect_err("bad flag");
    assert!(format!("{err}").contains("invalid CSV row 2"));
}
