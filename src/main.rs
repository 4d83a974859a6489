use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inhome_gateway::config::Overrides;
use inhome_gateway::db::{self, DbPool, DeviceRegistry, PolicyRegistry, RevisionLog};
use inhome_gateway::{ApiServer, Config};

/// InHome - device and policy management API for the home gateway
#[derive(Parser)]
#[command(name = "inhome", version, about)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "INHOME_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(long, env = "INHOME_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database
    #[arg(long, env = "INHOME_DB_PATH")]
    db: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print all registered devices, newest first
    Devices,
    /// Print all policies
    Policies,
    /// Print the devices a device has policies with
    Peers {
        /// Device name
        name: String,
    },
    /// Print the latest configuration revision
    Revision,
    /// Mark a device as trusted
    Trust {
        /// Device MAC address
        mac: String,
    },
    /// Mark a device as untrusted
    Untrust {
        /// Device MAC address
        mac: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity, RUST_LOG when not given
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,inhome_gateway=info")),
        1 => EnvFilter::new("info,inhome_gateway=debug"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        bind: cli.bind,
        port: cli.port,
        db_path: cli.db,
    };
    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    let pool = db::init(&config.db_path)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                addr = %config.server.addr(),
                db = %config.db_path.display(),
                "starting inhome gateway"
            );
            ApiServer::new(pool, config.server.addr()).run().await?;
            Ok(())
        }
        Command::Devices => print_devices(pool),
        Command::Policies => print_policies(pool),
        Command::Peers { name } => print_peers(pool, &name),
        Command::Revision => print_revision(pool),
        Command::Trust { mac } => set_trusted(pool, &mac, true),
        Command::Untrust { mac } => set_trusted(pool, &mac, false),
    }
}

/// Print all registered devices
fn print_devices(pool: DbPool) -> anyhow::Result<()> {
    let devices = DeviceRegistry::new(pool).list()?;
    if devices.is_empty() {
        println!("No devices registered");
        return Ok(());
    }

    for device in devices {
        let added = chrono::DateTime::from_timestamp(device.date_added, 0)
            .map_or_else(|| device.date_added.to_string(), |dt| dt.to_rfc3339());
        let trust = if device.is_trusted { "trusted" } else { "untrusted" };
        println!(
            "{:<30} {}  {:<15}  {trust:<9}  added {added}",
            device.name, device.mac, device.ipv4
        );
    }

    Ok(())
}

/// Print all policies
fn print_policies(pool: DbPool) -> anyhow::Result<()> {
    let policies = PolicyRegistry::new(pool).list()?;
    if policies.is_empty() {
        println!("No policies defined");
        return Ok(());
    }

    for policy in policies {
        println!("#{:<5} {} <-> {}", policy.id, policy.device_1, policy.device_2);
    }

    Ok(())
}

/// Print the devices paired with `name`
fn print_peers(pool: DbPool, name: &str) -> anyhow::Result<()> {
    let peers = PolicyRegistry::new(pool).peers(name)?;
    if peers.is_empty() {
        println!("{name} has no policies with registered devices");
        return Ok(());
    }

    for peer in peers {
        println!("{:<30} {}  {}", peer.name, peer.mac, peer.ipv4);
    }

    Ok(())
}

/// Print the latest revision
fn print_revision(pool: DbPool) -> anyhow::Result<()> {
    match RevisionLog::new(pool).latest()? {
        Some(revision) => {
            let date = chrono::DateTime::from_timestamp(revision.date, 0)
                .map_or_else(|| revision.date.to_string(), |dt| dt.to_rfc3339());
            println!("Revision {} at {date}", revision.id);
        }
        None => println!("No revisions recorded"),
    }

    Ok(())
}

/// Update a device's trust flag
fn set_trusted(pool: DbPool, mac: &str, trusted: bool) -> anyhow::Result<()> {
    let registry = DeviceRegistry::new(pool);
    registry.set_trusted(mac, trusted)?;

    let state = if trusted { "trusted" } else { "untrusted" };
    match registry.find_by_mac(mac)? {
        Some(device) => println!("{} ({}) marked {state}", device.name, device.mac),
        None => println!("Device {mac} marked {state}"),
    }
    Ok(())
}
