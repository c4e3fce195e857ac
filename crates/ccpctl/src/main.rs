//! `ccpctl` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use ccp_config::DefaultsStore;
use ccpctl::cli::{Cli, Commands};
use ccpctl::commands::{
    AddonCommand, ClusterCommand, ConfigCommand, LoginCommand, LookupCommand, Resource,
};
use ccpctl::{CliError, Connection, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(cli.debug)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log level for a `--debug` count.
fn level_for(debug: u8) -> &'static str {
    match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let store = DefaultsStore::resolve(cli.config.clone())?;
    debug!(
        path = %store.path().display(),
        remote = cli.command.is_remote(),
        "dispatching command"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted");
            on_interrupt.cancel();
        }
    });

    let mut stdout = io::stdout().lock();

    if let Commands::Config { command } = &cli.command {
        let cmd = ConfigCommand::new(&store, cli.insecure);
        return cmd.execute(&mut stdout, &format, command).await;
    }

    let defaults = store.load()?;
    let mut conn = Connection::open(store, defaults, cli.insecure)?;

    if let Commands::Login = cli.command {
        return LoginCommand::new(&mut conn)
            .execute(&mut stdout, &format)
            .await;
    }

    conn.authenticate().await?;

    let outcome = match &cli.command {
        Commands::Cluster { command } => {
            let cmd = ClusterCommand::new(&conn);
            cmd.execute(&mut stdout, &format, command, &cancel).await
        }
        Commands::Provider { command } => {
            let cmd = LookupCommand::new(&conn, Resource::Provider);
            cmd.execute(&mut stdout, &format, command).await
        }
        Commands::Subnet { command } => {
            let cmd = LookupCommand::new(&conn, Resource::Subnet);
            cmd.execute(&mut stdout, &format, command).await
        }
        Commands::AciProfile { command } => {
            let cmd = LookupCommand::new(&conn, Resource::AciProfile);
            cmd.execute(&mut stdout, &format, command).await
        }
        Commands::Addon { command } => {
            let cmd = AddonCommand::new(&conn);
            cmd.execute(&mut stdout, &format, command).await
        }
        Commands::Login | Commands::Config { .. } => Ok(()),
    };

    // A long --wait may have logged in again
    conn.persist_session()?;
    outcome
}
