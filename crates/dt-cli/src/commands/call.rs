//! Raw verb invocation.
//!
//! `dt call <provider> <verb> --params '{...}'` sends the params as given and
//! decodes the result through the verb's record, which makes it handy for
//! checking a new adapter against the schema.

use std::io::Write;

use serde_json::Value;

use dt_bridge::BridgeClient;
use dt_proto::Provider;

use crate::error::CliError;
use crate::output::{CallOutput, OutputFormat};
use crate::retry::RetryPolicy;

/// Handler for `dt call`.
pub struct CallCommand<'a> {
    client: &'a BridgeClient,
    retry: RetryPolicy,
}

impl<'a> CallCommand<'a> {
    /// Creates a new call command handler.
    #[must_use]
    pub const fn new(client: &'a BridgeClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Executes the call.
    ///
    /// # Errors
    ///
    /// Returns error if the params are not a JSON object or the call fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        provider: &Provider,
        verb: &str,
        params: Option<&str>,
    ) -> Result<(), CliError> {
        let params = params.map(parse_params).transpose()?;
        let data = self
            .retry
            .run(|| self.client.call_named(provider, verb, params.clone()))
            .await?;
        format.write(out, &CallOutput::new(data)?)
    }
}

fn parse_params(raw: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArgument(format!("--params is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(CliError::InvalidArgument(
            "--params must be a JSON object".into(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_must_be_an_object() {
        assert!(parse_params(r#"{"provider":"vercel"}"#).is_ok());
        assert!(matches!(
            parse_params("[1, 2]"),
            Err(CliError::InvalidArgument(msg)) if msg.contains("object")
        ));
        assert!(matches!(
            parse_params("{oops"),
            Err(CliError::InvalidArgument(msg)) if msg.contains("not valid JSON")
        ));
    }
}
