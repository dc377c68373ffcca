//! JSON-lines messages exchanged with the kernel process.
//!
//! Requests carry an `"action"` tag, replies a `"type"` tag; each message
//! is one line.

use serde::{Deserialize, Serialize};

use crate::types::{VariableInfo, WorkspaceInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KernelCommand {
    Execute { code: String },
    Workspaces,
    Variables,
    Memory,
    DeleteWorkspace { name: String },
    Ping,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelReply {
    Result {
        success: bool,
        #[serde(default)]
        output: String,
        #[serde(default)]
        error: Option<String>,
    },
    Workspaces {
        #[serde(default)]
        workspaces: Vec<WorkspaceInfo>,
    },
    Variables {
        #[serde(default)]
        variables: Vec<VariableInfo>,
    },
    Memory {
        #[serde(default)]
        mantid_mb: f64,
    },
    Deleted {
        #[serde(default)]
        name: String,
        success: bool,
        #[serde(default)]
        error: Option<String>,
    },
    Pong,
    Shutdown {
        #[serde(default)]
        success: bool,
    },
    Error {
        error: String,
    },
}

impl KernelCommand {
    /// Encode as a single protocol line, newline included.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_encoding() {
        let line = KernelCommand::Execute { code: "x = 1".into() }.to_line().unwrap();
        assert_eq!(line, "{\"action\":\"execute\",\"code\":\"x = 1\"}\n");
        assert_eq!(
            serde_json::to_string(&KernelCommand::DeleteWorkspace { name: "ws".into() }).unwrap(),
            r#"{"action":"delete_workspace","name":"ws"}"#
        );
        assert_eq!(serde_json::to_string(&KernelCommand::Ping).unwrap(), r#"{"action":"ping"}"#);
    }

    #[test]
    fn test_reply_decoding() {
        let reply: KernelReply =
            serde_json::from_str(r#"{"type": "result", "success": false, "output": "", "error": "Traceback"}"#).unwrap();
        assert_eq!(
            reply,
            KernelReply::Result { success: false, output: String::new(), error: Some("Traceback".into()) }
        );

        let reply: KernelReply = serde_json::from_str(r#"{"type": "pong"}"#).unwrap();
        assert_eq!(reply, KernelReply::Pong);

        let reply: KernelReply = serde_json::from_str(
            r#"{"type": "workspaces", "workspaces": [{"name": "w", "type": "Workspace2D", "num_spectra": 18}]}"#,
        )
        .unwrap();
        let KernelReply::Workspaces { workspaces } = reply else { panic!("wrong variant") };
        assert_eq!(workspaces[0].ws_type, "Workspace2D");
        assert_eq!(workspaces[0].num_bins, 0);
    }
}
