use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelState {
    Starting,
    Idle,
    Busy,
    Dead,
}

/// Outcome of running one code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Captured stdout/stderr, followed by the traceback on failure.
    pub output: String,
    pub error: Option<String>,
    /// Seconds.
    pub execution_time: f64,
}

impl ExecutionResult {
    /// Combine a kernel reply into the displayed output.
    pub fn from_reply(success: bool, output: String, error: Option<String>, execution_time: f64) -> Self {
        let output = match error.as_deref() {
            Some(err) if !err.is_empty() && !output.is_empty() => format!("{output}\n{err}"),
            Some(err) if !err.is_empty() => err.to_string(),
            _ => output,
        };
        Self {
            success,
            output,
            error,
            execution_time,
        }
    }

    pub fn failure(error: impl Into<String>, execution_time: f64) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            execution_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelStatus {
    pub state: KernelState,
    pub pid: Option<u32>,
    pub uptime_seconds: f64,
    pub executions_count: u64,
    pub last_execution_time: Option<f64>,
}

/// A Mantid workspace held by the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub name: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub ws_type: String,
    #[serde(default)]
    pub num_spectra: u64,
    #[serde(default)]
    pub num_bins: u64,
    #[serde(default, serialize_with = "round2")]
    pub memory_mb: f64,
}

fn unknown_type() -> String {
    "Unknown".to_string()
}

/// A user-level name in the kernel namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub(crate) fn round1<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*value, 1))
}

pub(crate) fn round2<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*value, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_combines_error() {
        let r = ExecutionResult::from_reply(false, "partial".into(), Some("Traceback".into()), 0.1);
        assert_eq!(r.output, "partial\nTraceback");
        let r = ExecutionResult::from_reply(false, String::new(), Some("Traceback".into()), 0.1);
        assert_eq!(r.output, "Traceback");
        let r = ExecutionResult::from_reply(true, "2\n".into(), None, 0.1);
        assert_eq!(r.output, "2\n");
    }

    #[test]
    fn test_workspace_memory_rounded() {
        let ws = WorkspaceInfo {
            name: "w".into(),
            ws_type: "EventWorkspace".into(),
            num_spectra: 1,
            num_bins: 2,
            memory_mb: 1.23456,
        };
        let value = serde_json::to_value(&ws).unwrap();
        assert_eq!(value["memory_mb"], 1.23);
        assert_eq!(value["type"], "EventWorkspace");
    }

    #[test]
    fn test_state_strings() {
        assert_eq!(serde_json::to_string(&KernelState::Busy).unwrap(), "\"busy\"");
    }
}
