//! Capabilities command implementation.

use std::io::Write;

use dt_bridge::BridgeClient;
use dt_proto::Provider;

use crate::error::CliError;
use crate::output::OutputFormat;
use crate::retry::RetryPolicy;

/// Handler for `dt capabilities`.
pub struct CapabilitiesCommand<'a> {
    client: &'a BridgeClient,
    retry: RetryPolicy,
}

impl<'a> CapabilitiesCommand<'a> {
    /// Creates a new capabilities command handler.
    #[must_use]
    pub const fn new(client: &'a BridgeClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Print the adapter's capabilities.
    ///
    /// # Errors
    ///
    /// Returns error if the call fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        provider: &Provider,
    ) -> Result<(), CliError> {
        let capabilities = self
            .retry
            .run(|| self.client.capabilities(provider))
            .await?;
        format.write(out, &capabilities)
    }
}
