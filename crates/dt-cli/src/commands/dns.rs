//! DNS command implementation.

use std::io::Write;

use dt_bridge::BridgeClient;
use dt_proto::{DnsRollbackParams, DnsUpdateParams};

use crate::cli::DnsCommands;
use crate::commands::print_call;
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::retry::RetryPolicy;

/// Handler for `dt dns` subcommands.
pub struct DnsCommand<'a> {
    client: &'a BridgeClient,
    retry: RetryPolicy,
}

impl<'a> DnsCommand<'a> {
    /// Creates a new DNS command handler.
    #[must_use]
    pub const fn new(client: &'a BridgeClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Executes the DNS subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &DnsCommands,
    ) -> Result<(), CliError> {
        match command {
            DnsCommands::Update {
                provider,
                token,
                domain,
                record_type,
                name,
                value,
                ttl,
            } => {
                let params = DnsUpdateParams {
                    provider: provider.clone(),
                    token: token.value.clone(),
                    domain: domain.clone(),
                    record_type: record_type.to_ascii_uppercase(),
                    record_name: name.clone(),
                    record_value: value.clone(),
                    ttl: *ttl,
                };
                print_call(self.client, self.retry, out, format, &params).await
            }
            DnsCommands::Rollback {
                provider,
                token,
                record_id,
                rollback_to,
            } => {
                let params = DnsRollbackParams {
                    provider: provider.clone(),
                    token: token.value.clone(),
                    record_id: record_id.clone(),
                    rollback_to: rollback_to.clone(),
                };
                print_call(self.client, self.retry, out, format, &params).await
            }
        }
    }
}
