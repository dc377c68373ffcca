//! Run metadata from raw NeXus files.

use std::path::{Path, PathBuf};

use neutronote_common::format::{
    format_count_rate, format_duration_long, format_file_size, format_nexus_timestamp,
};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::nexus::NexusFile;
use crate::SnapArchive;

/// Metadata for a single neutron run.
///
/// Lookups never fail outright: problems are reported through `error`
/// so the caller can show them next to the run number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetadata {
    pub run_number: u64,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    /// Seconds.
    pub duration: f64,
    pub total_counts: u64,
    pub file_size_bytes: u64,
    pub file_path: String,
    pub error: Option<String>,
    pub extras: Map<String, Value>,
}

impl RunMetadata {
    pub fn failed(run_number: u64, error: impl Into<String>) -> Self {
        Self {
            run_number,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn file_size_display(&self) -> String {
        format_file_size(self.file_size_bytes)
    }

    pub fn duration_display(&self) -> String {
        format_duration_long(self.duration)
    }

    pub fn count_rate_display(&self) -> String {
        format_count_rate(self.total_counts, self.duration)
    }

    pub fn start_time_formatted(&self) -> String {
        format_nexus_timestamp(&self.start_time, true)
    }

    pub fn end_time_formatted(&self) -> String {
        format_nexus_timestamp(&self.end_time, true)
    }

    /// JSON object with raw fields, display strings, and any extras
    /// merged at the top level.
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "run_number": self.run_number,
            "title": self.title,
            "start_time": self.start_time,
            "end_time": self.end_time,
            "start_time_formatted": self.start_time_formatted(),
            "end_time_formatted": self.end_time_formatted(),
            "duration": self.duration,
            "duration_display": self.duration_display(),
            "total_counts": self.total_counts,
            "count_rate_display": self.count_rate_display(),
            "file_size_bytes": self.file_size_bytes,
            "file_size_display": self.file_size_display(),
            "file_path": self.file_path,
            "error": self.error,
        });
        if let Value::Object(map) = &mut obj {
            for (k, v) in &self.extras {
                map.insert(k.clone(), v.clone());
            }
        }
        obj
    }
}

/// Run number encoded in `SNAP_<n>.nxs.h5` / `SNAP_<n>.lite.nxs.h5`, or 0.
pub fn run_number_from_filename(name: &str) -> u64 {
    name.strip_prefix("SNAP_")
        .and_then(|rest| rest.split(['.', '_']).next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

impl SnapArchive {
    /// Locate the NeXus file for a run, preferring native over lite.
    ///
    /// With an IPTS, that folder is checked first. Otherwise (or if the
    /// run is not there) every `IPTS-*` folder is scanned, newest name first.
    pub fn find_nexus_file(&self, run: u64, ipts: Option<&str>) -> Option<PathBuf> {
        let layout = self.layout();

        if let Some(ipts) = ipts.filter(|s| !s.is_empty()) {
            if layout.ipts_dir(ipts).exists() {
                if let Some(path) = self.native_or_lite(ipts, run) {
                    return Some(path);
                }
            }
        }

        let entries = match std::fs::read_dir(layout.data_root()) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %layout.data_root().display(), error = %e, "data root not readable");
                return None;
            }
        };
        let mut folders: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with("IPTS-"))
            .collect();
        folders.sort_unstable_by(|a, b| b.cmp(a));

        folders
            .iter()
            .find_map(|ipts| self.native_or_lite(ipts, run))
    }

    fn native_or_lite(&self, ipts: &str, run: u64) -> Option<PathBuf> {
        let layout = self.layout();
        [layout.native_nexus(ipts, run), layout.lite_nexus(ipts, run)]
            .into_iter()
            .find(|p| p.exists())
    }

    /// Read run metadata straight from a NeXus file.
    pub fn read_run_metadata(&self, path: &Path) -> RunMetadata {
        if !path.exists() {
            return RunMetadata::failed(0, format!("File not found: {}", path.display()));
        }

        let run_number = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(run_number_from_filename)
            .unwrap_or(0);

        let file_size_bytes = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => return RunMetadata::failed(run_number, format!("Error reading file: {e}")),
        };

        let file = match self.reader().open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open NeXus file");
                return RunMetadata::failed(run_number, format!("Error reading file: {e}"));
            }
        };

        let text = |ds: &str| file.read_scalar(ds).map(|v| v.as_text()).unwrap_or_default();
        RunMetadata {
            run_number,
            title: text("entry/title"),
            start_time: text("entry/start_time"),
            end_time: text("entry/end_time"),
            duration: read_f64(file.as_ref(), "entry/duration"),
            total_counts: file
                .read_scalar("entry/total_counts")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            file_size_bytes,
            file_path: path.display().to_string(),
            error: None,
            extras: Map::new(),
        }
    }

    /// Locate and read metadata for a run.
    pub fn get_run_metadata(&self, run: u64, ipts: Option<&str>) -> RunMetadata {
        match self.find_nexus_file(run, ipts) {
            Some(path) => {
                debug!(run, path = %path.display(), "reading run metadata");
                self.read_run_metadata(&path)
            }
            None => match ipts.filter(|s| !s.is_empty()) {
                Some(ipts) => {
                    RunMetadata::failed(run, format!("Could not locate file for run {run} in {ipts}"))
                }
                None => RunMetadata::failed(run, format!("Could not locate file for run {run}")),
            },
        }
    }
}

pub(crate) fn read_f64(file: &dyn NexusFile, dataset: &str) -> f64 {
    file.read_scalar(dataset)
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_number_from_filename() {
        assert_eq!(run_number_from_filename("SNAP_64413.nxs.h5"), 64413);
        assert_eq!(run_number_from_filename("SNAP_64413.lite.nxs.h5"), 64413);
        assert_eq!(run_number_from_filename("other.nxs.h5"), 0);
        assert_eq!(run_number_from_filename("SNAP_abc.nxs.h5"), 0);
    }

    #[test]
    fn test_display_fields() {
        let meta = RunMetadata {
            run_number: 1,
            duration: 7200.0,
            total_counts: 72_000_000_000,
            file_size_bytes: 3 * 1024 * 1024,
            start_time: "2026-01-30T10:00:00-05:00:00".into(),
            ..Default::default()
        };
        assert_eq!(meta.duration_display(), "2.0 hours");
        assert_eq!(meta.count_rate_display(), "10.000 ME/s");
        assert_eq!(meta.file_size_display(), "3.00 MB");
        assert_eq!(meta.start_time_formatted(), "2026-01-30 10:00:00");
        assert_eq!(meta.end_time_formatted(), "N/A");
    }

    #[test]
    fn test_to_json_merges_extras() {
        let mut meta = RunMetadata::failed(5, "boom");
        meta.extras.insert("sample".into(), json!("Si"));
        let value = meta.to_json();
        assert_eq!(value["run_number"], 5);
        assert_eq!(value["error"], "boom");
        assert_eq!(value["sample"], "Si");
        assert_eq!(value["count_rate_display"], "N/A");
    }
}
