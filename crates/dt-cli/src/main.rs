//! deploy-tunnel CLI binary entrypoint.
//!
//! This is the main entry point for the `dt` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dt_bridge::BridgeClient;
use dt_cli::cli::{Cli, Commands};
use dt_cli::commands::{AuthCommand, CallCommand, CapabilitiesCommand, DnsCommand, VerbCommand};
use dt_cli::{CliError, OutputFormat, RetryPolicy};

/// Log directive used when `RUST_LOG` is unset.
const DEFAULT_LOG_DIRECTIVE: &str = "dt_cli=info,dt_bridge=warn";

fn main() -> ExitCode {
    // Logs go to stderr so JSON output on stdout stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
        .with(filter)
        .init();

    let cli = Cli::parse();

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

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = BridgeClient::from_config(cli.bridge_config()?)?;
    let retry = RetryPolicy::new(cli.retries);
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Capabilities { provider } => {
            let cmd = CapabilitiesCommand::new(&client, retry);
            cmd.execute(&mut stdout, &format, provider).await?;
        }
        Commands::Auth(args) => {
            let cmd = AuthCommand::new(&client, retry);
            let mut stdin = io::stdin().lock();
            cmd.execute(&mut stdin, &mut stdout, &format, args).await?;
        }
        Commands::AuthRefresh {
            provider,
            refresh_token,
        } => {
            let cmd = VerbCommand::new(&client, retry);
            cmd.auth_refresh(&mut stdout, &format, provider, refresh_token)
                .await?;
        }
        Commands::FetchConfig {
            provider,
            token,
            project_id,
        } => {
            let cmd = VerbCommand::new(&client, retry);
            cmd.fetch_config(
                &mut stdout,
                &format,
                provider,
                &token.value,
                project_id.as_deref(),
            )
            .await?;
        }
        Commands::SyncEnv(args) => {
            let cmd = VerbCommand::new(&client, retry);
            cmd.sync_env(&mut stdout, &format, args).await?;
        }
        Commands::DeployPreview(args) => {
            let cmd = VerbCommand::new(&client, retry);
            cmd.deploy_preview(&mut stdout, &format, args).await?;
        }
        Commands::Dns { command } => {
            let cmd = DnsCommand::new(&client, retry);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Call {
            provider,
            verb,
            params,
        } => {
            let cmd = CallCommand::new(&client, retry);
            cmd.execute(&mut stdout, &format, provider, verb, params.as_deref())
                .await?;
        }
    }

    Ok(())
}
