use serde::{Deserialize, Serialize};

use crate::RUNNER_SCRIPT;

/// How to launch the kernel process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Interpreter used to run the embedded runner script.
    #[serde(default = "default_python")]
    pub python: String,

    /// Seconds to wait for any single reply.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Start the kernel when the server starts instead of on first use.
    #[serde(default)]
    pub autostart: bool,

    /// Replace the interpreter command entirely. The program must speak
    /// the same JSON-lines protocol as the runner script.
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            timeout_secs: default_timeout_secs(),
            autostart: false,
            program: None,
            args: Vec::new(),
        }
    }
}

impl KernelConfig {
    /// Config for a custom kernel program, mostly useful in tests.
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: Some(program.into()),
            args,
            ..Self::default()
        }
    }

    /// Program and arguments to spawn.
    pub fn command(&self) -> (String, Vec<String>) {
        match &self.program {
            Some(program) => (program.clone(), self.args.clone()),
            None => (
                self.python.clone(),
                vec!["-u".to_string(), "-c".to_string(), RUNNER_SCRIPT.to_string()],
            ),
        }
    }
}
