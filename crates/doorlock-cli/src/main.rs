//! `doorlock`: runs the door lock appliance.
//!
//! Boots the appliance, serves the status endpoint and runs the control loop
//! until Ctrl-C. A provisioning reset (or a failed provisioning at boot)
//! re-executes the binary so the next boot starts from scratch.

mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use doorlock_appliance::{Appliance, BootOutcome, LoopExit};
use doorlock_hardware::{BoardConfig, Peripherals};
use doorlock_network::{
    AnyProvisioner, AnyRemoteStore, FileProvisioner, FirebaseConfig, FirebaseStore, MemoryStore,
    MockProvisioner, StatusServer,
};

use crate::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "doorlock", version, about = "Door lock appliance")]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long, env = "DOORLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Run on a simulated board with an in-memory remote store
    #[arg(long)]
    simulate: bool,

    /// Realtime database host
    #[arg(long, env = "DOORLOCK_FIREBASE_HOST")]
    firebase_host: Option<String>,

    /// Realtime database secret or ID token
    #[arg(long, env = "DOORLOCK_FIREBASE_AUTH", hide_env_values = true)]
    firebase_auth: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => {
            let settings = Settings::default();
            settings.validate()?;
            settings
        }
    };
    info!(
        version = doorlock_core::VERSION,
        simulate = cli.simulate,
        "Starting door lock"
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    // Simulated board handles must outlive the appliance.
    let (peripherals, _simulated) = if cli.simulate {
        let (peripherals, handles) = Peripherals::mock();
        (peripherals, Some(handles))
    } else {
        (open_board(&settings.board)?, None)
    };
    let store = remote_store(&cli, &settings)?;
    let provisioner = if cli.simulate {
        AnyProvisioner::Mock(MockProvisioner::connected())
    } else {
        AnyProvisioner::File(
            FileProvisioner::new(&settings.credentials_path).with_window(settings.portal_window()),
        )
    };

    let mut appliance = Appliance::new(peripherals, store, provisioner, settings.appliance.clone());

    let exit = match appliance.boot().await {
        BootOutcome::Ready => {
            let status = StatusServer::bind(settings.status_addr()?)
                .await
                .with_context(|| format!("failed to bind status endpoint {}", settings.status_addr))?;
            let status_task = tokio::spawn(status.serve(cancel.clone()));

            let exit = appliance.run(cancel.clone()).await;

            cancel.cancel();
            match status_task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Status endpoint failed"),
                Err(e) => warn!(error = %e, "Status endpoint task panicked"),
            }
            exit
        }
        BootOutcome::Restart => LoopExit::Restart,
        BootOutcome::Halt => {
            error!("Remote store unavailable, halted");
            cancel.cancelled().await;
            LoopExit::Shutdown
        }
    };

    match exit {
        LoopExit::Restart => restart(),
        LoopExit::Shutdown => {
            info!("Door lock stopped");
            Ok(())
        }
    }
}

#[cfg(feature = "hardware")]
fn open_board(board: &BoardConfig) -> anyhow::Result<Peripherals> {
    Peripherals::open(board).context("failed to open board devices")
}

#[cfg(not(feature = "hardware"))]
fn open_board(_board: &BoardConfig) -> anyhow::Result<Peripherals> {
    anyhow::bail!("built without the `hardware` feature, run with --simulate")
}

fn remote_store(cli: &Cli, settings: &Settings) -> anyhow::Result<AnyRemoteStore> {
    if cli.simulate {
        return Ok(AnyRemoteStore::Memory(MemoryStore::new()));
    }

    let host = cli
        .firebase_host
        .as_deref()
        .context("DOORLOCK_FIREBASE_HOST is not set")?;
    let mut config = FirebaseConfig::new(host).with_timeout(settings.remote_timeout());
    if let Some(auth) = &cli.firebase_auth {
        config = config.with_auth(auth);
    }
    let store = FirebaseStore::new(config).context("invalid remote store configuration")?;
    Ok(AnyRemoteStore::Firebase(store))
}

/// Replace this process with a fresh copy of itself.
fn restart() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("failed to locate the running binary")?;
    let args: Vec<_> = std::env::args_os().skip(1).collect();
    info!(exe = %exe.display(), "Restarting");

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = std::process::Command::new(&exe).args(&args).exec();
        Err(err).context("failed to re-execute")
    }

    #[cfg(not(unix))]
    {
        std::process::Command::new(&exe)
            .args(&args)
            .spawn()
            .context("failed to start a new instance")?;
        Ok(())
    }
}
