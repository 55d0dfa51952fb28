//! rdshell entry point.
//!
//! Loads the TOML config, applies command-line overrides, spawns the session
//! shell and connects.  Until a browser front-end is attached, the binary
//! runs against the loopback remote adapters in
//! `infrastructure::remote::mock`, which walk through the same
//! `CONNECTING → WAITING → CONNECTED` sequence a real manager reports.
//!
//! # Usage
//!
//! ```text
//! rdshell [OPTIONS]
//!
//! Options:
//!   --config      <PATH>   Config file [default: platform config dir]
//!   --endpoint    <URL>    Gateway WebSocket endpoint
//!   --hostname    <HOST>   Remote host
//!   --port        <PORT>   Remote port
//!   --ignore-cert          Accept any server certificate
//!   --width/--height/--dpi Requested remote display geometry
//!   --save-config          Write the effective config back and exit
//! ```
//!
//! Every option also reads an `RDSHELL_*` environment variable.  CLI args
//! take precedence, then the environment, then the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rdshell_client::application::bridge_clipboard::{
    ClipboardBridge, ScratchDocument, SystemClipboard,
};
use rdshell_client::application::ports::{
    FullscreenApi, InputCaptureFactory, SessionFactory, SurfaceContainer,
};
use rdshell_client::application::session_shell::{ShellCommand, ShellDeps};
use rdshell_client::infrastructure::clipboard::mock::{MockScratchDocument, MockSystemClipboard};
use rdshell_client::infrastructure::remote::mock::{
    MockCaptureFactory, MockContainer, MockFullscreen, MockSessionFactory,
};
use rdshell_client::infrastructure::runtime::spawn_shell;
use rdshell_client::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, ShellConfig,
};
use rdshell_core::Dimensions;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote-desktop session shell.
#[derive(Debug, Parser)]
#[command(name = "rdshell", about = "Remote-desktop session shell", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "RDSHELL_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket endpoint of the gateway tunnel.
    #[arg(long, env = "RDSHELL_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "RDSHELL_HOSTNAME")]
    hostname: Option<String>,

    #[arg(long, env = "RDSHELL_PORT")]
    port: Option<u16>,

    /// Accept the remote host's certificate without verification.
    #[arg(long, env = "RDSHELL_IGNORE_CERT")]
    ignore_cert: bool,

    #[arg(long, env = "RDSHELL_WIDTH")]
    width: Option<u32>,

    #[arg(long, env = "RDSHELL_HEIGHT")]
    height: Option<u32>,

    #[arg(long, env = "RDSHELL_DPI")]
    dpi: Option<u32>,

    /// `tracing` filter; overrides the config's `log_level`.
    #[arg(long, env = "RDSHELL_LOG")]
    log_level: Option<String>,

    /// Write the merged config to the config file, then exit.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Loads the config file and layers the CLI overrides on top.  Returns
    /// the file path alongside the merged config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    fn into_config(self) -> anyhow::Result<(PathBuf, ShellConfig)> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config_file_path().context("failed to locate config file")?,
        };
        let mut config = load_config_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if let Some(endpoint) = self.endpoint {
            config.tunnel.endpoint = endpoint;
        }
        if let Some(level) = self.log_level {
            config.shell.log_level = level;
        }
        let connection = &mut config.connection;
        if let Some(hostname) = self.hostname {
            connection.hostname = hostname;
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if self.ignore_cert {
            connection.ignore_cert = true;
        }
        if let Some(width) = self.width {
            connection.width = width;
        }
        if let Some(height) = self.height {
            connection.height = height;
        }
        if let Some(dpi) = self.dpi {
            connection.dpi = dpi;
        }
        Ok((path, config))
    }
}

/// Loopback collaborators sized from the requested remote geometry.
fn loopback_deps(config: &ShellConfig) -> ShellDeps {
    let remote = Dimensions::new(config.connection.width, config.connection.height);
    let viewport = Dimensions::new(1280, 800);

    ShellDeps {
        factory: Arc::new(MockSessionFactory::loopback(remote)) as Arc<dyn SessionFactory>,
        capture: Arc::new(MockCaptureFactory::default()) as Arc<dyn InputCaptureFactory>,
        fullscreen: Arc::new(MockFullscreen::new(true)) as Arc<dyn FullscreenApi>,
        shell_container: Arc::new(MockContainer::new(viewport)) as Arc<dyn SurfaceContainer>,
        display_container: Arc::new(MockContainer::new(viewport)) as Arc<dyn SurfaceContainer>,
        clipboard: Arc::new(ClipboardBridge::new(
            Arc::new(MockSystemClipboard::with_text("")) as Arc<dyn SystemClipboard>,
            Arc::new(MockScratchDocument::default()) as Arc<dyn ScratchDocument>,
        )),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let save = cli.save_config;
    let (path, config) = cli.into_config()?;

    if save {
        save_config_to(&path, &config)
            .with_context(|| format!("failed to save config to {}", path.display()))?;
        println!("config written to {}", path.display());
        return Ok(());
    }

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.shell.log_level)),
        )
        .init();

    info!(endpoint = %config.tunnel.endpoint, "rdshell starting");

    let (handle, task) = spawn_shell(
        loopback_deps(&config),
        config.shell_settings(),
        config.screenshot_path(),
    );

    // ── Snapshot logger ───────────────────────────────────────────────────────
    let mut updates = handle.subscribe();
    tokio::spawn(async move {
        let mut last_state = updates.borrow().state;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.state != last_state {
                info!(from = %last_state, to = %snapshot.state, "session state changed");
                last_state = snapshot.state;
            }
            match serde_json::to_string(&snapshot) {
                Ok(json) => debug!(snapshot = %json, "shell snapshot"),
                Err(e) => warn!("could not serialise snapshot: {e}"),
            }
        }
    });

    if let Err(e) = handle.request(ShellCommand::Connect).await {
        warn!("initial connect failed: {e}");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("shutdown signal received");

    handle.shutdown();
    task.await.context("shell task panicked")?;

    info!("rdshell stopped");
    Ok(())
}
