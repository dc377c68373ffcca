//! Discovery of SNAPRed reduction outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use neutronote_common::format::{format_duration_short, format_nexus_timestamp};
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::metadata::read_f64;
use crate::SnapArchive;

const RECORD_FILE: &str = "ReductionRecord.json";

fn state_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[a-f0-9]{16}$").expect("static regex"))
}

/// Whether `name` is a 16-hex-digit instrument state id.
pub fn is_state_id(name: &str) -> bool {
    state_id_regex().is_match(name)
}

fn timestamp_dir_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{6}$").expect("static regex"))
}

/// One reduction of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedRun {
    pub run_number: u64,
    pub state_id: String,
    /// Folder name, `YYYY-MM-DDTHHMMSS`.
    pub timestamp: String,
    pub reduced_file: PathBuf,
    pub record_file: Option<PathBuf>,
    pub pixelmask_file: Option<PathBuf>,
    pub title: String,
    pub duration: f64,
    pub start_time: String,
}

impl ReducedRun {
    pub fn timestamp_display(&self) -> String {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H%M%S")
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.timestamp.clone())
    }

    pub fn duration_display(&self) -> String {
        format_duration_short(self.duration)
    }

    pub fn start_time_display(&self) -> String {
        format_nexus_timestamp(&self.start_time, false)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "run_number": self.run_number,
            "state_id": self.state_id,
            "timestamp": self.timestamp,
            "timestamp_display": self.timestamp_display(),
            "reduced_file": self.reduced_file.display().to_string(),
            "record_file": self.record_file.as_ref().map(|p| p.display().to_string()),
            "pixelmask_file": self.pixelmask_file.as_ref().map(|p| p.display().to_string()),
            "title": self.title,
            "duration": self.duration,
            "duration_display": self.duration_display(),
            "start_time": self.start_time,
            "start_time_display": self.start_time_display(),
        })
    }
}

/// An instrument state (16-hex-digit hash) and its reduced runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInfo {
    pub state_id: String,
    pub reduced_runs: Vec<ReducedRun>,
}

impl StateInfo {
    pub fn run_count(&self) -> usize {
        self.reduced_runs.len()
    }

    pub fn run_numbers(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self.reduced_runs.iter().map(|r| r.run_number).collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn to_json(&self) -> Value {
        json!({
            "state_id": self.state_id,
            "run_count": self.run_count(),
            "run_numbers": self.run_numbers(),
            "reduced_runs": self.reduced_runs.iter().map(ReducedRun::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Keep runs whose number contains `search` (numeric searches only), then
/// truncate to `limit` when it is non-zero.
pub fn filter_runs(runs: Vec<ReducedRun>, search: &str, limit: usize) -> Vec<ReducedRun> {
    let search = search.trim();
    let mut runs = if !search.is_empty() && search.bytes().all(|b| b.is_ascii_digit()) {
        runs.into_iter()
            .filter(|r| r.run_number.to_string().contains(search))
            .collect()
    } else {
        runs
    };
    if limit > 0 {
        runs.truncate(limit);
    }
    runs
}

/// Sorted names of the subdirectories of `dir`; empty if unreadable.
fn subdirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

fn first_reduced_file(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("reduced_") && n.ends_with(".nxs"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

struct ReducedMetadata {
    title: String,
    duration: f64,
    start_time: String,
}

impl SnapArchive {
    /// State ids with a folder under the IPTS's SNAPRed root, sorted.
    pub fn discover_state_ids(&self, ipts: &str) -> Vec<String> {
        subdirs(&self.layout().snapred_root(ipts))
            .into_iter()
            .filter(|name| is_state_id(name))
            .collect()
    }

    /// Reductions stored for one state, sorted by run number.
    ///
    /// With `latest_only`, each run contributes its newest reduction;
    /// otherwise every reduction is returned, oldest first within a run.
    pub fn discover_reduced_runs(
        &self,
        ipts: &str,
        state_id: &str,
        lite: bool,
        latest_only: bool,
    ) -> Vec<ReducedRun> {
        if !is_state_id(state_id) {
            debug!(state_id, "not a state id, skipping discovery");
            return Vec::new();
        }
        let state_root = self.layout().state_dir(ipts, state_id, lite);
        let mut by_run: BTreeMap<u64, Vec<ReducedRun>> = BTreeMap::new();

        for run_name in subdirs(&state_root) {
            let Ok(run_number) = run_name.parse::<u64>() else {
                continue;
            };
            let run_dir = state_root.join(&run_name);

            for timestamp in subdirs(&run_dir) {
                if !timestamp_dir_regex().is_match(&timestamp) {
                    continue;
                }
                let ts_dir = run_dir.join(&timestamp);

                let expected = ts_dir.join(format!("reduced_{run_number:06}_{timestamp}.nxs"));
                let reduced_file = if expected.is_file() {
                    expected
                } else if let Some(found) = first_reduced_file(&ts_dir) {
                    found
                } else {
                    debug!(run_number, %timestamp, "no reduced file, skipping");
                    continue;
                };

                let record_file = Some(ts_dir.join(RECORD_FILE)).filter(|p| p.is_file());
                let pixelmask_file =
                    Some(ts_dir.join(format!("pixelmask_{run_number:06}_{timestamp}.h5")))
                        .filter(|p| p.is_file());

                let meta = self.reduced_file_metadata(&reduced_file);
                by_run.entry(run_number).or_default().push(ReducedRun {
                    run_number,
                    state_id: state_id.to_string(),
                    timestamp,
                    reduced_file,
                    record_file,
                    pixelmask_file,
                    title: meta.title,
                    duration: meta.duration,
                    start_time: meta.start_time,
                });
            }
        }

        let mut result = Vec::new();
        for (_, mut reductions) in by_run {
            reductions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            if latest_only {
                result.extend(reductions.pop());
            } else {
                result.extend(reductions);
            }
        }
        result
    }

    /// Every state with at least one reduced run (latest reductions only).
    pub fn discover_all_reduced_data(&self, ipts: &str, lite: bool) -> Vec<StateInfo> {
        self.discover_state_ids(ipts)
            .into_iter()
            .filter_map(|state_id| {
                let runs = self.discover_reduced_runs(ipts, &state_id, lite, true);
                (!runs.is_empty()).then_some(StateInfo {
                    state_id,
                    reduced_runs: runs,
                })
            })
            .collect()
    }

    /// Title, duration and start time stored in a reduced workspace file.
    fn reduced_file_metadata(&self, path: &Path) -> ReducedMetadata {
        let empty = ReducedMetadata {
            title: String::new(),
            duration: 0.0,
            start_time: String::new(),
        };
        let file = match self.reader().open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "reduced file metadata unavailable");
                return empty;
            }
        };

        let text = |ds: &str| file.read_scalar(ds).map(|v| v.as_text());
        ReducedMetadata {
            title: text("mantid_workspace_1/title")
                .or_else(|| text("mantid_workspace_1/logs/run_title/value"))
                .unwrap_or_default(),
            duration: read_f64(file.as_ref(), "mantid_workspace_1/logs/duration/value"),
            start_time: text("mantid_workspace_1/logs/start_time/value").unwrap_or_default(),
        }
    }
}
