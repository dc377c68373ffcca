//! Persistent Python kernel for notebook code cells.
//!
//! A single long-lived interpreter is shared by every user of the server,
//! so variables and Mantid workspaces created by one cell are visible to
//! the next. The interpreter runs an embedded runner script and talks
//! JSON lines over stdin/stdout (see [`protocol`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use neutronote_kernel::{KernelConfig, KernelManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let kernel = KernelManager::new(KernelConfig::default());
//!     let result = kernel.execute("print(1 + 1)").await;
//!     println!("{} ({:.2}s)", result.output, result.execution_time);
//!     kernel.stop().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod protocol;
pub mod types;

pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use manager::KernelManager;
pub use memory::MemoryInfo;
pub use types::{ExecutionResult, KernelState, KernelStatus, VariableInfo, WorkspaceInfo};

/// Python source of the kernel loop, passed to the interpreter with `-c`.
pub const RUNNER_SCRIPT: &str = include_str!("runner.py");
