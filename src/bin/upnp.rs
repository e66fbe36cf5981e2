//! upnp - forward and clear router ports over UPnP

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use upnp_cli::igd::{PortMappingProtocol, SsdpDeviceFinder};
use upnp_cli::keep::{KeepSession, ShutdownSignal};
use upnp_cli::router::{discover_and_select_router, RouterClient};
use upnp_cli::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "upnp")]
#[command(about = "Forward ports on your router through UPnP", version)]
struct Args {
    /// Path to a JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log discovery and SOAP details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the external IP address
    #[command(name = "external-ip", visible_alias = "eip", alias = "ip")]
    ExternalIp,

    /// Forward a port (TCP and UDP)
    #[command(visible_alias = "f")]
    Forward {
        /// Port to forward (external and internal)
        port: u16,
        /// Optional description
        description: Vec<String>,
    },

    /// Clear (unforward) a port
    #[command(visible_aliases = ["c", "unforward", "uf"])]
    Clear {
        /// Port to clear
        port: u16,
    },

    /// Keep a port forwarded for as long as this program is running
    #[command(visible_alias = "k")]
    Keep {
        /// Port to forward (external and internal)
        port: u16,
        /// Optional description
        description: Vec<String>,
    },

    /// Show the router's TCP and UDP mappings of a port
    #[command(visible_alias = "s")]
    Status {
        /// Port to look up
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    upnp_cli::init_logging(args.verbose);

    let settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    println!("Finding your router...");
    let router = match find_router(&settings).await {
        Ok(router) => router,
        Err(e) => {
            println!("Couldn't find a UPnP router: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args.command, router, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn find_router(settings: &Settings) -> Result<RouterClient, upnp_cli::router::RouterError> {
    let mut finder = SsdpDeviceFinder::new(settings.search_options());
    if !settings.strict_discovery {
        finder = finder.lenient();
    }

    // Ctrl-C while searching abandons the search
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = discover_and_select_router(Arc::new(finder), &cancel).await;
    watcher.abort();
    result
}

async fn run(command: Command, mut router: RouterClient, settings: &Settings) -> anyhow::Result<()> {
    use anyhow::anyhow;

    match command {
        Command::ExternalIp => {
            let ip = router
                .get_external_ip_address()
                .await
                .map_err(|e| anyhow!("Couldn't discover external IP: {}", e))?;
            println!("Your external IP is: {}", ip);
        }
        Command::Forward { port, description } => {
            let description = settings.description_or_default(&description);
            router
                .forward(port, &description)
                .await
                .map_err(|e| anyhow!("Couldn't forward: {}", e))?;
            println!("Forwarded port {} successfully!", port);
        }
        Command::Clear { port } => {
            router
                .clear(port)
                .await
                .map_err(|e| anyhow!("Couldn't clear: {}", e))?;
            println!("Cleared port {} successfully!", port);
        }
        Command::Keep { port, description } => {
            let description = settings.description_or_default(&description);
            // Signals raised while forwarding are queued until `recv`
            let mut signals = ShutdownSignal::register()
                .map_err(|e| anyhow!("Couldn't listen for close signals: {}", e))?;

            let mut session = KeepSession::start(router, port, &description)
                .await
                .map_err(|e| anyhow!("Couldn't forward: {}", e))?;
            println!("Forwarded port {} successfully!", port);

            println!("Waiting for a close signal...");
            let (_, cleared) = session
                .hold(async {
                    let name = signals.recv().await;
                    println!("Received signal '{}', clearing port {}...", name, port);
                })
                .await;

            match cleared {
                Ok(()) => println!("Cleared port {} successfully!", port),
                Err(e) => println!("Couldn't clear port {}: {}", port, e),
            }
            session.exit();
            println!("Exiting...");
        }
        Command::Status { port } => {
            for protocol in PortMappingProtocol::BOTH {
                match router.mapping_entry(port, protocol).await {
                    Ok(entry) => println!(
                        "{}/{} -> {}:{} ({}, {}, lease {}s)",
                        port,
                        protocol,
                        entry.internal_client,
                        entry.internal_port,
                        if entry.enabled { "enabled" } else { "disabled" },
                        entry.description,
                        entry.lease_duration
                    ),
                    Err(e) => println!("{}/{}: {}", port, protocol, e),
                }
            }
        }
    }

    Ok(())
}
