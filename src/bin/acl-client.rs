//! One-shot client for the ACL server.
//!
//! `acl-client <host> <port> <command-words...>` sends the words joined by
//! single spaces and prints the reply.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use acl_server_r::client::{join_command, send_command};

#[derive(Parser)]
#[command(name = "acl-client")]
#[command(about = "Send one command to an ACL server")]
#[command(version)]
struct Cli {
    /// Server host name or IP address
    host: String,

    /// Server port (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Command words, e.g. `A 147.188.193.15 22`
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version output count as a bad invocation too
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let command = join_command(cli.command.as_slice());
    let reply = send_command(&cli.host, cli.port, &command)?;

    let mut stdout = io::stdout();
    stdout.write_all(reply.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
