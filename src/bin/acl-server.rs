//! ACL decision server.
//!
//! `acl-server -i` reads commands from standard input; `acl-server <port>`
//! serves them over TCP.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use acl_server_r::session::{run_interactive, Server, ServerOptions};
use acl_server_r::CommandProcessor;

#[derive(Parser)]
#[command(name = "acl-server")]
#[command(about = "IP/port access-control decision service")]
#[command(version)]
struct Cli {
    /// Interactive mode: read commands from standard input
    #[arg(short = 'i', conflicts_with = "port")]
    interactive: bool,

    /// TCP port to listen on (1-65535)
    #[arg(
        required_unless_present = "interactive",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    port: Option<u16>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let result = match cli.port {
        Some(port) if !cli.interactive => serve(port),
        _ => interactive(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse process arguments. Anything but `-i` or a single port, including
/// `--help` and `--version`, prints clap's message and yields exit code 1.
fn parse_args<I, T>(args: I) -> std::result::Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        ExitCode::from(1)
    })
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("acl_server_r=info,acl_server=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn interactive() -> Result<()> {
    let processor = CommandProcessor::new();
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_interactive(&processor, stdin.lock(), stdout.lock())?;
    Ok(())
}

fn serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let options = ServerOptions::new().with_port(port);
        let processor = Arc::new(CommandProcessor::new());
        let server = Server::bind(&options, processor)
            .with_context(|| format!("failed to listen on port {}", port))?;

        tokio::select! {
            result = server.run() => result?,
            _ = tokio::signal::ctrl_c() => info!("Shutting down"),
        }
        Ok::<(), anyhow::Error>(())
    })
}
