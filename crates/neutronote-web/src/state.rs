//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use neutronote_common::Ipts;
use neutronote_db::{Database, EntryRepository, NotebookConfig, NotebookConfigRepository, TagRepository};
use neutronote_kernel::KernelManager;
use neutronote_snap::{SnapArchive, SnapLayout};
use tracing::info;

use crate::config::{Config, StoragePaths};
use crate::templates::Templates;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub entries: EntryRepository,
    pub tags: TagRepository,
    pub notebook: NotebookConfigRepository,
    pub snap: SnapArchive,
    pub kernel: Arc<KernelManager>,
    pub templates: Arc<Templates>,
    /// Folder holding uploaded images.
    pub upload_dir: PathBuf,
    /// IPTS the server was launched for, if any.
    pub launch_ipts: Option<Ipts>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire repositories and services around an opened database.
    pub async fn new(
        db: Database,
        snap: SnapArchive,
        kernel: KernelManager,
        upload_dir: PathBuf,
        launch_ipts: Option<Ipts>,
        max_upload_bytes: usize,
    ) -> anyhow::Result<Self> {
        db.initialize().await?;
        let db = Arc::new(db);
        let templates = Templates::new(launch_ipts.as_ref()).context("loading templates")?;
        Ok(Self {
            entries: EntryRepository::new(db.clone()),
            tags: TagRepository::new(db.clone()),
            notebook: NotebookConfigRepository::new(db.clone()),
            db,
            snap,
            kernel: Arc::new(kernel),
            templates: Arc::new(templates),
            upload_dir,
            launch_ipts,
            max_upload_bytes,
        })
    }

    /// Open the notebook database under `paths` and build the full state.
    pub async fn open(config: &Config, paths: &StoragePaths) -> anyhow::Result<Self> {
        paths
            .create_dirs()
            .with_context(|| format!("creating {}", paths.upload_dir.display()))?;
        let db = Database::open(&paths.db_path)
            .await
            .with_context(|| format!("opening {}", paths.db_path.display()))?;
        info!(db = %paths.db_path.display(), "notebook database opened");

        let snap = SnapArchive::with_default_reader(SnapLayout::new(&config.storage.data_root));
        let state = Self::new(
            db,
            snap,
            KernelManager::new(config.kernel.clone()),
            paths.upload_dir.clone(),
            paths.ipts.clone(),
            config.server.max_upload_bytes,
        )
        .await?;

        // A notebook launched for an IPTS starts out configured for it.
        if let Some(ipts) = &paths.ipts {
            let current = state.notebook.get_or_create().await?;
            if !current.is_configured() {
                state.notebook.configure(ipts.as_str(), None).await?;
            }
        }
        Ok(state)
    }

    /// The notebook config row, created on first use.
    pub async fn notebook_config(&self) -> neutronote_common::Result<NotebookConfig> {
        Ok(self.notebook.get_or_create().await?)
    }

    /// IPTS the notebook is configured for, if any.
    pub async fn configured_ipts(&self) -> neutronote_common::Result<Option<String>> {
        let config = self.notebook_config().await?;
        if config.is_configured() {
            Ok(config.ipts)
        } else {
            Ok(None)
        }
    }
}

pub type SharedState = Arc<AppState>;
