//! Authentication command implementation.
//!
//! The flow is: ask the adapter for its capabilities, start authentication,
//! obtain a token (from `--token`, from the adapter, or pasted by the user
//! after an OAuth consent page or prompt), then verify it with
//! `fetch:config`.

use std::io::{BufRead, Write};

use dt_bridge::BridgeClient;
use dt_proto::{
    AuthStartData, AuthStartParams, AuthType, CapabilitiesData, ErrorCode, FetchConfigParams,
    Provider, Verb,
};

use crate::cli::AuthArgs;
use crate::error::CliError;
use crate::output::{AuthOutcome, OutputFormat};
use crate::retry::RetryPolicy;

/// Handler for `dt auth`.
pub struct AuthCommand<'a> {
    client: &'a BridgeClient,
    retry: RetryPolicy,
}

impl<'a> AuthCommand<'a> {
    /// Creates a new auth command handler.
    #[must_use]
    pub const fn new(client: &'a BridgeClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Runs the authentication flow. Pasted tokens are read from `input`.
    ///
    /// # Errors
    ///
    /// Returns error if a call fails, the token is rejected, or no token was
    /// entered.
    pub async fn execute<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
        format: &OutputFormat,
        args: &AuthArgs,
    ) -> Result<(), CliError> {
        let provider = &args.provider;
        let capabilities = self
            .retry
            .run(|| self.client.capabilities(provider))
            .await?;

        let (token, method, expires_at) = match &args.token {
            Some(token) => (token.clone(), "flag", None),
            None => {
                let start = self.start(provider, &capabilities, args.callback_url.clone()).await?;
                let expires_at = start.expires_at;
                if let Some(token) = start.token {
                    (token, "adapter", expires_at)
                } else if let Some(url) = start.auth_url {
                    eprintln!("Open this URL in your browser to authorize dt:\n\n  {url}\n");
                    eprint!("Paste the token here: ");
                    (read_token(input)?, "oauth", expires_at)
                } else {
                    eprint!(
                        "Enter your {provider} {}: ",
                        token_label(capabilities.auth_type)
                    );
                    (read_token(input)?, "prompt", expires_at)
                }
            }
        };

        let (verified, project) = self
            .verify(provider, &capabilities, token, args.project_id.clone())
            .await?;

        let outcome = AuthOutcome {
            provider: provider.to_string(),
            adapter: format!(
                "{} v{}",
                capabilities.adapter_name, capabilities.adapter_version
            ),
            method: method.to_string(),
            verified,
            project,
            expires_at,
        };
        format.write(out, &outcome)
    }

    async fn start(
        &self,
        provider: &Provider,
        capabilities: &CapabilitiesData,
        callback_url: Option<String>,
    ) -> Result<AuthStartData, CliError> {
        if !capabilities.supports(Verb::AuthStart) {
            return Ok(AuthStartData::default());
        }
        let params = AuthStartParams {
            provider: provider.clone(),
            callback_url,
        };
        Ok(self.retry.run(|| self.client.auth_start(&params)).await?)
    }

    /// Check the token with `fetch:config`.
    ///
    /// `INVALID_PARAMS` means the token was accepted but a project id is
    /// needed, which still counts as verified.
    async fn verify(
        &self,
        provider: &Provider,
        capabilities: &CapabilitiesData,
        token: String,
        project_id: Option<String>,
    ) -> Result<(bool, Option<String>), CliError> {
        if !capabilities.supports(Verb::FetchConfig) {
            return Ok((false, None));
        }
        let params = FetchConfigParams {
            provider: provider.clone(),
            token,
            project_id,
        };
        match self.retry.run(|| self.client.fetch_config(&params)).await {
            Ok(config) => Ok((true, Some(config.project.name))),
            Err(err) if err.code() == Some(ErrorCode::InvalidParams) => Ok((true, None)),
            Err(err) => Err(err.into()),
        }
    }
}

const fn token_label(auth_type: AuthType) -> &'static str {
    match auth_type {
        AuthType::ApiKey => "API key",
        AuthType::Token => "personal access token",
        AuthType::Oauth => "access token",
    }
}

fn read_token<R: BufRead>(input: &mut R) -> Result<String, CliError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        return Err(CliError::InvalidArgument("no token entered".into()));
    }
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_token_trims_line() {
        let mut input = "  tok_123  \nignored\n".as_bytes();
        assert_eq!(read_token(&mut input).unwrap(), "tok_123");
    }

    #[test]
    fn read_token_rejects_eof_and_blank() {
        assert!(matches!(
            read_token(&mut "".as_bytes()),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(read_token(&mut "\n".as_bytes()).is_err());
    }

    #[test]
    fn token_labels() {
        assert_eq!(token_label(AuthType::ApiKey), "API key");
        assert_eq!(token_label(AuthType::Token), "personal access token");
    }
}
