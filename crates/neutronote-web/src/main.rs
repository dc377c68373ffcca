//! neutroNote server
//!
//! Run with: cargo run -p neutronote-web -- --ipts 33219

use std::path::PathBuf;

use clap::Parser;
use neutronote_web::config::Config;
use neutronote_web::router::build_router;
use neutronote_web::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "neutronote", version, about = "Lab notebook for neutron scattering experiments")]
struct Cli {
    /// IPTS whose shared folder holds the notebook (e.g. 33219 or IPTS-33219)
    #[arg(short, long)]
    ipts: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Root of the instrument data tree
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Local storage used when no IPTS is given
    #[arg(long)]
    instance_dir: Option<PathBuf>,

    /// Config file (defaults to neutronote.toml or $NEUTRONOTE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(ipts) = self.ipts {
            config.storage.ipts = Some(ipts);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(root) = self.data_root {
            config.storage.data_root = root;
        }
        if let Some(dir) = self.instance_dir {
            config.storage.instance_dir = dir;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("neutronote=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => Config::load()?,
    };
    cli.apply(&mut config);

    info!("neutroNote {} starting", env!("CARGO_PKG_VERSION"));

    let paths = config.storage.resolve()?;
    match &paths.ipts {
        Some(ipts) => info!(%ipts, storage = %paths.root.display(), "using IPTS shared storage"),
        None => info!(storage = %paths.root.display(), "using local storage"),
    }

    let state = AppState::open(&config, &paths).await?;
    if config.kernel.autostart {
        if let Err(e) = state.kernel.start().await {
            warn!(error = %e, "kernel autostart failed; cells will retry on first run");
        }
    }
    let kernel = state.kernel.clone();

    let app = build_router(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    kernel.stop().await;
    Ok(())
}
