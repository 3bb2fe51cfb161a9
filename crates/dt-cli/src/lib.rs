//! # dt-cli
//!
//! deploy-tunnel controller command-line interface.
//!
//! Every command resolves a provider adapter through [`dt_bridge`], runs one
//! or more verbs and prints the result as a table or JSON:
//!
//! ```text
//! ┌──────┐  BridgeClient   ┌──────────┐  argv + stdin   ┌─────────┐
//! │  dt  │ ──────────────► │  Engine  │ ──────────────► │ adapter │
//! └──────┘                 └──────────┘ ◄────────────── └─────────┘
//!                                         stdout JSON
//! ```
//!
//! Recoverable failures are retried here, never in the engine, and only
//! when `--retries` asks for it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod retry;

pub use cli::{Cli, Commands, DnsCommands, Format};
pub use error::CliError;
pub use output::OutputFormat;
pub use retry::RetryPolicy;
