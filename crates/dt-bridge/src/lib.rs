//! # dt-bridge
//!
//! Controller side of the deploy-tunnel adapter bridge.
//!
//! Provider adapters are external executables, one process per call. This
//! crate resolves the adapter for a provider, runs one verb through it under
//! a deadline, and turns the single JSON envelope it writes into a typed
//! result or a structured error.
//!
//! ```text
//! ┌──────────────┐  typed params   ┌──────────┐  argv + stdin  ┌─────────┐
//! │ BridgeClient │ ──────────────► │  Engine  │ ─────────────► │ adapter │
//! │  (façade)    │ ◄────────────── │          │ ◄───────────── │ process │
//! └──────────────┘  typed result   └──────────┘  stdout JSON   └─────────┘
//! ```
//!
//! Each call ends in one of four states, all distinguishable through
//! [`CallError`]: a decoded result, [`CallError::Failed`] (adapter-reported,
//! carries `code` and `recoverable`), [`CallError::Timeout`], or
//! [`CallError::MalformedResponse`]. Retry policy belongs to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod engine;
pub mod error;

pub use client::BridgeClient;
pub use config::{BridgeConfig, Launcher, DEFAULT_TIMEOUT};
pub use engine::Engine;
pub use error::{CallError, CallResult, ConfigError};
