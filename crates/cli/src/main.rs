mod config;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use libkvsh::{SessionClient, session};

/// Interactive shell for a kvsh key-value server
#[derive(Parser)]
#[command(name = "kvsh", version, about)]
struct Cli {
    /// Server host to connect to (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Server port to connect to (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kvsh=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    debug!(?config, "config loaded");

    let host = cli.host.unwrap_or(config.host);
    let port = cli.port.unwrap_or(config.port);

    let mut client = match SessionClient::connect(&host, port) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    println!("Connected to {host}:{port}");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    match session::run(&mut client, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
