//! Typed verb commands.
//!
//! Each method builds the verb's params from command-line arguments, runs
//! the call and prints the decoded result.

use std::io::Write;

use dt_bridge::BridgeClient;
use dt_proto::{AuthRefreshParams, DeployPreviewParams, EnvVar, FetchConfigParams, Provider, SyncEnvParams};

use crate::cli::{DeployPreviewArgs, SyncEnvArgs};
use crate::commands::print_call;
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::retry::RetryPolicy;

/// Handler for the per-verb commands.
pub struct VerbCommand<'a> {
    client: &'a BridgeClient,
    retry: RetryPolicy,
}

impl<'a> VerbCommand<'a> {
    /// Creates a new verb command handler.
    #[must_use]
    pub const fn new(client: &'a BridgeClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// `dt auth-refresh`.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn auth_refresh<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        provider: &Provider,
        refresh_token: &str,
    ) -> Result<(), CliError> {
        let params = AuthRefreshParams {
            provider: provider.clone(),
            refresh_token: refresh_token.to_string(),
        };
        print_call(self.client, self.retry, out, format, &params).await
    }

    /// `dt fetch-config`.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn fetch_config<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        provider: &Provider,
        token: &str,
        project_id: Option<&str>,
    ) -> Result<(), CliError> {
        let params = FetchConfigParams {
            provider: provider.clone(),
            token: token.to_string(),
            project_id: project_id.map(str::to_string),
        };
        print_call(self.client, self.retry, out, format, &params).await
    }

    /// `dt sync-env`. Not idempotent on every provider; retries may re-send.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn sync_env<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SyncEnvArgs,
    ) -> Result<(), CliError> {
        print_call(self.client, self.retry, out, format, &sync_env_params(args)).await
    }

    /// `dt deploy-preview`.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn deploy_preview<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &DeployPreviewArgs,
    ) -> Result<(), CliError> {
        print_call(self.client, self.retry, out, format, &deploy_preview_params(args)).await
    }
}

fn sync_env_params(args: &SyncEnvArgs) -> SyncEnvParams {
    SyncEnvParams {
        provider: args.provider.clone(),
        token: args.token.value.clone(),
        project_id: args.project_id.clone(),
        env_vars: args
            .env
            .iter()
            .map(|(key, value)| EnvVar {
                key: key.clone(),
                value: value.clone(),
                target: args.target.clone(),
            })
            .collect(),
    }
}

fn deploy_preview_params(args: &DeployPreviewArgs) -> DeployPreviewParams {
    DeployPreviewParams {
        provider: args.provider.clone(),
        token: args.token.value.clone(),
        project_id: args.project_id.clone(),
        branch: args.branch.clone(),
        env: (!args.env.is_empty()).then(|| args.env.iter().cloned().collect()),
    }
}
