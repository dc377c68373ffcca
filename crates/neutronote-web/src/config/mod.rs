//! Configuration loading for neutroNote.
//!
//! Reads `neutronote.toml` from the current directory or the path in the
//! `NEUTRONOTE_CONFIG` env var. A missing file means defaults. Environment
//! variables and then CLI flags are layered on top.

use std::path::{Path, PathBuf};

use anyhow::Context;
use neutronote_common::{notebook_dir, Ipts};
use neutronote_kernel::KernelConfig;
use serde::{Deserialize, Serialize};

/// Database file name inside the storage folder.
pub const DB_FILE: &str = "neutronote.db";
/// Upload folder name inside the storage folder.
pub const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_max_upload_bytes() -> usize { 16 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the instrument data tree.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Local storage used when no IPTS is given.
    #[serde(default = "default_instance_dir")]
    pub instance_dir: PathBuf,
    /// IPTS whose shared folder holds the notebook.
    #[serde(default)]
    pub ipts: Option<String>,
}

fn default_data_root() -> PathBuf { PathBuf::from(neutronote_snap::DEFAULT_DATA_ROOT) }
fn default_instance_dir() -> PathBuf { PathBuf::from("instance") }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            instance_dir: default_instance_dir(),
            ipts: None,
        }
    }
}

/// Where a running server keeps its database and uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub ipts: Option<Ipts>,
}

impl StoragePaths {
    fn in_dir(root: PathBuf, ipts: Option<Ipts>) -> Self {
        Self {
            db_path: root.join(DB_FILE),
            upload_dir: root.join(UPLOADS_DIR),
            root,
            ipts,
        }
    }

    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)
    }
}

impl StorageConfig {
    /// The IPTS share when an IPTS is configured, the instance folder otherwise.
    pub fn resolve(&self) -> anyhow::Result<StoragePaths> {
        match self.ipts.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => {
                let ipts = Ipts::parse(raw).with_context(|| format!("invalid IPTS '{raw}'"))?;
                Ok(StoragePaths::in_dir(notebook_dir(&self.data_root, &ipts), Some(ipts)))
            }
            None => Ok(StoragePaths::in_dir(self.instance_dir.clone(), None)),
        }
    }
}

impl Config {
    /// Load configuration from neutronote.toml and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("NEUTRONOTE_CONFIG")
            .unwrap_or_else(|_| "neutronote.toml".to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `NEUTRONOTE_IPTS`, `NEUTRONOTE_DATA_ROOT` and `NEUTRONOTE_PORT`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(ipts) = var("NEUTRONOTE_IPTS").filter(|s| !s.trim().is_empty()) {
            self.storage.ipts = Some(ipts);
        }
        if let Some(root) = var("NEUTRONOTE_DATA_ROOT").filter(|s| !s.trim().is_empty()) {
            self.storage.data_root = PathBuf::from(root);
        }
        if let Some(port) = var("NEUTRONOTE_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("NEUTRONOTE_PORT is not a port number: '{port}'"))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests;
