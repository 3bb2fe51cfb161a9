//! Command-line argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dt_bridge::{BridgeConfig, Launcher};
use dt_proto::Provider;

use crate::error::CliError;

/// deploy-tunnel controller - drive provider adapters.
#[derive(Parser, Debug, Clone)]
#[command(name = "dt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML bridge configuration file.
    #[arg(long, env = "DT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding one adapter directory per provider.
    #[arg(short, long, env = "DT_ADAPTERS_PATH")]
    pub adapters_path: Option<PathBuf>,

    /// Entry point file name inside each adapter directory.
    #[arg(long, env = "DT_ADAPTER_ENTRY")]
    pub entry_point: Option<String>,

    /// Runtime command placed before the entry point (`direct` to execute it).
    #[arg(long, env = "DT_ADAPTER_RUNTIME")]
    pub runtime: Option<String>,

    /// Per-call deadline in seconds.
    #[arg(short, long, env = "DT_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Retry recoverable failures this many times.
    #[arg(short, long, default_value_t = 0)]
    pub retries: u32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Layer flags and environment over the config file (or defaults).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or the result is
    /// invalid.
    pub fn bridge_config(&self) -> Result<BridgeConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_file(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(root) = &self.adapters_path {
            config.adapters_root.clone_from(root);
        }
        if let Some(entry) = &self.entry_point {
            config = config.with_entry_point(entry.clone());
        }
        if let Some(runtime) = &self.runtime {
            config = config.with_launcher(parse_launcher(runtime)?);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }
}

/// Parse `direct` or a whitespace-separated runtime command such as `bun run`.
///
/// # Errors
///
/// Returns an error for an empty command.
pub fn parse_launcher(s: &str) -> Result<Launcher, CliError> {
    if s.trim().eq_ignore_ascii_case("direct") {
        return Ok(Launcher::Direct);
    }
    let mut parts = s.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| CliError::InvalidArgument("empty adapter runtime".into()))?;
    Ok(Launcher::Runtime {
        program,
        args: parts.collect(),
    })
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show an adapter's identity, auth model and features.
    Capabilities {
        /// Provider name.
        provider: Provider,
    },

    /// Authenticate with a provider and verify the token.
    Auth(AuthArgs),

    /// Exchange a refresh token for a new access token.
    AuthRefresh {
        /// Provider name.
        provider: Provider,

        /// Refresh token.
        #[arg(long)]
        refresh_token: String,
    },

    /// Show project, build settings and environment.
    FetchConfig {
        /// Provider name.
        provider: Provider,

        #[command(flatten)]
        token: TokenArg,

        /// Project id.
        #[arg(short, long)]
        project_id: Option<String>,
    },

    /// Push environment variables to a project.
    SyncEnv(SyncEnvArgs),

    /// Trigger a preview deployment.
    DeployPreview(DeployPreviewArgs),

    /// DNS record management.
    Dns {
        /// DNS subcommand to execute.
        #[command(subcommand)]
        command: DnsCommands,
    },

    /// Run any verb with raw JSON params.
    Call {
        /// Provider name.
        provider: Provider,

        /// Verb name, e.g. `fetch:config`.
        verb: String,

        /// JSON params object.
        #[arg(short, long)]
        params: Option<String>,
    },
}

/// Bearer token shared by provider-calling commands.
#[derive(Args, Debug, Clone)]
pub struct TokenArg {
    /// Provider access token.
    #[arg(long = "token", env = "DT_TOKEN", hide_env_values = true)]
    pub value: String,
}

/// Arguments for the auth command.
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Provider name.
    pub provider: Provider,

    /// Use this token instead of starting an auth flow.
    #[arg(long, env = "DT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// OAuth redirect URL passed to `auth:start`.
    #[arg(long)]
    pub callback_url: Option<String>,

    /// Project used to verify the token.
    #[arg(short, long)]
    pub project_id: Option<String>,
}

/// Arguments for sync-env.
#[derive(Args, Debug, Clone)]
pub struct SyncEnvArgs {
    /// Provider name.
    pub provider: Provider,

    #[command(flatten)]
    pub token: TokenArg,

    /// Project id.
    #[arg(short, long)]
    pub project_id: String,

    /// Variables to push (KEY=VALUE).
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val, required = true)]
    pub env: Vec<(String, String)>,

    /// Deployment targets for every variable.
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<String>,
}

/// Arguments for deploy-preview.
#[derive(Args, Debug, Clone)]
pub struct DeployPreviewArgs {
    /// Provider name.
    pub provider: Provider,

    #[command(flatten)]
    pub token: TokenArg,

    /// Project id.
    #[arg(short, long)]
    pub project_id: String,

    /// Git branch to deploy.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Extra environment for this deployment (KEY=VALUE).
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,
}

/// DNS subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DnsCommands {
    /// Create or change a record.
    Update {
        /// Provider name.
        provider: Provider,

        #[command(flatten)]
        token: TokenArg,

        /// Zone apex, e.g. `example.com`.
        #[arg(short, long)]
        domain: String,

        /// Record type.
        #[arg(long = "type", value_name = "TYPE", default_value = "CNAME")]
        record_type: String,

        /// Record name within the zone.
        #[arg(short, long)]
        name: String,

        /// New record value.
        #[arg(short, long)]
        value: String,

        /// TTL in seconds.
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Restore a record to an earlier value.
    Rollback {
        /// Provider name.
        provider: Provider,

        #[command(flatten)]
        token: TokenArg,

        /// Record id returned by `dns update`.
        #[arg(short, long)]
        record_id: String,

        /// Value to restore.
        #[arg(long = "to", value_name = "VALUE")]
        rollback_to: String,
    },
}

/// Parse a `KEY=VALUE` pair.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_positional() {
        let cli = Cli::parse_from(["dt", "capabilities", "vercel"]);
        match cli.command {
            Commands::Capabilities { provider } => assert_eq!(provider, Provider::Vercel),
            other => panic!("expected capabilities, got {other:?}"),
        }
    }

    #[test]
    fn rejects_path_like_provider() {
        assert!(Cli::try_parse_from(["dt", "capabilities", "../etc"]).is_err());
    }

    #[test]
    fn global_flags() {
        let cli = Cli::parse_from([
            "dt", "--format", "json", "--retries", "3", "-t", "5", "capabilities", "render",
        ]);
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.retries, 3);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn sync_env_collects_pairs() {
        let cli = Cli::parse_from([
            "dt", "sync-env", "netlify", "--token", "t", "-p", "prj", "-e", "A=1", "-e",
            "B=x=y", "--target", "production,preview",
        ]);
        match cli.command {
            Commands::SyncEnv(args) => {
                assert_eq!(
                    args.env,
                    vec![("A".into(), "1".into()), ("B".into(), "x=y".into())]
                );
                assert_eq!(args.target, vec!["production", "preview"]);
            }
            other => panic!("expected sync-env, got {other:?}"),
        }
    }

    #[test]
    fn dns_rollback_args() {
        let cli = Cli::parse_from([
            "dt", "dns", "rollback", "cloudflare", "--token", "t", "-r", "rec_1", "--to",
            "1.1.1.1",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Dns {
                command: DnsCommands::Rollback { .. }
            }
        ));
    }

    #[test]
    fn key_val_rejects_missing_separator() {
        assert!(parse_key_val("NOPE").is_err());
        assert!(parse_key_val("=v").is_err());
        assert_eq!(parse_key_val("K=").unwrap(), ("K".into(), String::new()));
    }

    #[test]
    fn launcher_parsing() {
        assert_eq!(parse_launcher("direct").unwrap(), Launcher::Direct);
        assert_eq!(
            parse_launcher("node --enable-source-maps").unwrap(),
            Launcher::Runtime {
                program: "node".into(),
                args: vec!["--enable-source-maps".into()],
            }
        );
        assert!(parse_launcher("   ").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "dt",
            "--adapters-path",
            "/opt/adapters",
            "--entry-point",
            "main.js",
            "--runtime",
            "node",
            "--timeout",
            "7",
            "capabilities",
            "vercel",
        ]);
        let config = cli.bridge_config().unwrap();
        assert_eq!(config.adapters_root, PathBuf::from("/opt/adapters"));
        assert_eq!(config.entry_point, "main.js");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(
            config.adapter_path(&Provider::Vercel),
            PathBuf::from("/opt/adapters/vercel/main.js")
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = Cli::parse_from(["dt", "--timeout", "0", "capabilities", "vercel"]);
        assert!(matches!(cli.bridge_config(), Err(CliError::Config(_))));
    }
}
