//! CLI command implementations.
//!
//! Each submodule implements one group of commands:
//! - [`capabilities`] - Adapter identity and features
//! - [`auth`] - Authentication flow
//! - [`verbs`] - One command per provider verb
//! - [`dns`] - DNS record management
//! - [`call`] - Raw verb invocation

use std::io::Write;

use dt_bridge::BridgeClient;
use dt_proto::VerbCall;

use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};
use crate::retry::RetryPolicy;

pub mod auth;
pub mod call;
pub mod capabilities;
pub mod dns;
pub mod verbs;

pub use auth::AuthCommand;
pub use call::CallCommand;
pub use capabilities::CapabilitiesCommand;
pub use dns::DnsCommand;
pub use verbs::VerbCommand;

/// Run one typed call under `retry` and print its result.
pub(crate) async fn print_call<P, W>(
    client: &BridgeClient,
    retry: RetryPolicy,
    out: &mut W,
    format: &OutputFormat,
    params: &P,
) -> Result<(), CliError>
where
    P: VerbCall + Sync,
    P::Output: TableDisplay,
    W: Write,
{
    let data = retry.run(|| client.call(params)).await?;
    format.write(out, &data)
}
