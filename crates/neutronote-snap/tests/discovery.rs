//! File discovery against scratch SNAP data trees.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use neutronote_snap::{InMemoryReader, NexusValue, SnapArchive, SnapLayout, UnavailableReader};
use tempfile::TempDir;

const STATE: &str = "04bd2c53f6bf6754";

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"nexus").unwrap();
}

fn archive(root: &Path, reader: InMemoryReader) -> SnapArchive {
    SnapArchive::new(SnapLayout::new(root), Arc::new(reader))
}

fn reduction(root: &Path, run: u64, ts: &str) -> std::path::PathBuf {
    let dir = SnapLayout::new(root).state_dir("IPTS-100", STATE, true).join(run.to_string()).join(ts);
    let file = dir.join(format!("reduced_{run:06}_{ts}.nxs"));
    touch(&file);
    file
}

#[test]
fn test_find_prefers_native_over_lite() {
    let tmp = TempDir::new().unwrap();
    let layout = SnapLayout::new(tmp.path());
    touch(&layout.lite_nexus("IPTS-100", 7));
    let snap = archive(tmp.path(), InMemoryReader::new());
    assert_eq!(snap.find_nexus_file(7, Some("IPTS-100")), Some(layout.lite_nexus("IPTS-100", 7)));

    touch(&layout.native_nexus("IPTS-100", 7));
    assert_eq!(snap.find_nexus_file(7, Some("IPTS-100")), Some(layout.native_nexus("IPTS-100", 7)));
}

#[test]
fn test_find_scans_other_ipts_newest_first() {
    let tmp = TempDir::new().unwrap();
    let layout = SnapLayout::new(tmp.path());
    touch(&layout.native_nexus("IPTS-1", 9));
    touch(&layout.native_nexus("IPTS-2", 9));
    let snap = archive(tmp.path(), InMemoryReader::new());

    assert_eq!(snap.find_nexus_file(9, Some("IPTS-404")), Some(layout.native_nexus("IPTS-2", 9)));
    assert_eq!(snap.find_nexus_file(9, None), Some(layout.native_nexus("IPTS-2", 9)));
    assert_eq!(snap.find_nexus_file(10, None), None);
}

#[test]
fn test_find_with_missing_root() {
    let snap = archive(Path::new("/definitely/not/here"), InMemoryReader::new());
    assert_eq!(snap.find_nexus_file(1, None), None);
}

#[test]
fn test_run_metadata_from_reader() {
    let tmp = TempDir::new().unwrap();
    let layout = SnapLayout::new(tmp.path());
    let path = layout.native_nexus("IPTS-100", 64413);
    touch(&path);

    let reader = InMemoryReader::new();
    reader.insert(&path, "entry/title", NexusValue::Text("Diamond anvil cell".into()));
    reader.insert(&path, "entry/start_time", NexusValue::Text("2026-01-30T10:00:00-05:00:00".into()));
    reader.insert(&path, "entry/duration", NexusValue::Float(120.0));
    reader.insert(&path, "entry/total_counts", NexusValue::Int(240_000_000));

    let meta = archive(tmp.path(), reader).get_run_metadata(64413, Some("IPTS-100"));
    assert!(meta.is_ok(), "{:?}", meta.error);
    assert_eq!(meta.run_number, 64413);
    assert_eq!(meta.title, "Diamond anvil cell");
    assert_eq!(meta.duration_display(), "2.0 min");
    assert_eq!(meta.count_rate_display(), "2.000 ME/s");
    assert_eq!(meta.file_size_bytes, 5);
    assert_eq!(meta.to_json()["start_time_formatted"], "2026-01-30 10:00:00");
}

#[test]
fn test_run_metadata_errors() {
    let tmp = TempDir::new().unwrap();
    let snap = archive(tmp.path(), InMemoryReader::new());

    let meta = snap.get_run_metadata(5, Some("IPTS-100"));
    assert_eq!(meta.error.as_deref(), Some("Could not locate file for run 5 in IPTS-100"));
    let meta = snap.get_run_metadata(5, None);
    assert_eq!(meta.error.as_deref(), Some("Could not locate file for run 5"));

    let missing = tmp.path().join("nope.nxs.h5");
    let meta = snap.read_run_metadata(&missing);
    assert!(meta.error.unwrap().starts_with("File not found: "));
}

#[test]
fn test_run_metadata_without_hdf5() {
    let tmp = TempDir::new().unwrap();
    let layout = SnapLayout::new(tmp.path());
    touch(&layout.native_nexus("IPTS-100", 3));
    let snap = SnapArchive::new(layout, Arc::new(UnavailableReader));

    let meta = snap.get_run_metadata(3, Some("IPTS-100"));
    assert_eq!(meta.run_number, 3);
    assert_eq!(meta.error.as_deref(), Some("Error reading file: HDF5 support not enabled"));
}

#[test]
fn test_discover_state_ids_filters_names() {
    let tmp = TempDir::new().unwrap();
    let root = SnapLayout::new(tmp.path()).snapred_root("IPTS-100");
    for name in ["ffffffffffffffff", STATE, "not-a-state", "04BD2C53F6BF675A"] {
        fs::create_dir_all(root.join(name)).unwrap();
    }
    touch(&root.join("0123456789abcdef"));

    let snap = archive(tmp.path(), InMemoryReader::new());
    assert_eq!(
        snap.discover_state_ids("IPTS-100"),
        vec!["04BD2C53F6BF675A", STATE, "ffffffffffffffff"]
    );
    assert!(snap.discover_state_ids("IPTS-999").is_empty());
}

#[test]
fn test_discover_reduced_runs_latest_only() {
    let tmp = TempDir::new().unwrap();
    let older = reduction(tmp.path(), 64413, "2025-05-08T162147");
    let newer = reduction(tmp.path(), 64413, "2025-05-09T090000");
    reduction(tmp.path(), 64400, "2025-05-01T120000");
    touch(&older.with_file_name("ReductionRecord.json"));

    let reader = InMemoryReader::new();
    reader.insert(&newer, "mantid_workspace_1/logs/run_title/value", NexusValue::Text("Si powder".into()));
    reader.insert(&newer, "mantid_workspace_1/logs/duration/value", NexusValue::Float(4000.0));
    let snap = archive(tmp.path(), reader);

    let latest = snap.discover_reduced_runs("IPTS-100", STATE, true, true);
    let numbers: Vec<u64> = latest.iter().map(|r| r.run_number).collect();
    assert_eq!(numbers, vec![64400, 64413]);
    assert_eq!(latest[1].timestamp, "2025-05-09T090000");
    assert_eq!(latest[1].title, "Si powder");
    assert_eq!(latest[1].duration_display(), "1.1 hr");
    assert!(latest[1].record_file.is_none());

    let all = snap.discover_reduced_runs("IPTS-100", STATE, true, false);
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].timestamp, "2025-05-08T162147");
    assert!(all[1].record_file.is_some());
    assert_eq!(all[1].title, "");

    assert!(snap.discover_reduced_runs("IPTS-100", STATE, false, true).is_empty());
}

#[test]
fn test_discover_skips_folders_without_reduced_file() {
    let tmp = TempDir::new().unwrap();
    let state_dir = SnapLayout::new(tmp.path()).state_dir("IPTS-100", STATE, true);
    fs::create_dir_all(state_dir.join("64413").join("2025-05-08T162147")).unwrap();
    fs::create_dir_all(state_dir.join("notes").join("2025-05-08T162147")).unwrap();
    touch(&state_dir.join("64414").join("2025-05-08T162147").join("reduced_renamed.nxs"));
    touch(&state_dir.join("64415").join("latest").join("reduced_064415_latest.nxs"));

    let snap = archive(tmp.path(), InMemoryReader::new());
    let runs = snap.discover_reduced_runs("IPTS-100", STATE, true, true);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_number, 64414);
    assert!(runs[0].reduced_file.ends_with("reduced_renamed.nxs"));

    let states = snap.discover_all_reduced_data("IPTS-100", true);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].run_numbers(), vec![64414]);
}

#[test]
fn test_reduced_runs_stay_inside_ipts() {
    let tmp = TempDir::new().unwrap();
    let layout = SnapLayout::new(tmp.path());
    let other = layout.state_dir("IPTS-2", STATE, true).join("99999").join("2025-05-08T162147");
    touch(&other.join("reduced_099999_2025-05-08T162147.nxs"));
    let snap = archive(tmp.path(), InMemoryReader::new());

    assert_eq!(snap.discover_reduced_runs("IPTS-2", STATE, true, true).len(), 1);
    let escape = format!("../../../IPTS-2/shared/SNAPRed/{STATE}");
    assert!(snap.discover_reduced_runs("IPTS-1", &escape, true, true).is_empty());
}
