//! # dt-proto
//!
//! Payload schema for the deploy-tunnel bridge.
//!
//! Both sides of the process boundary depend on this crate: the controller
//! (through `dt-bridge`) and every Rust adapter (through `dt-adapter`). Field
//! names here are the wire names and must stay compatible with adapters
//! written in other languages.
//!
//! ```text
//! ┌────────────┐  argv[1] = verb, stdin = params   ┌─────────────┐
//! │ controller │ ─────────────────────────────────►│   adapter   │
//! │ (dt-bridge)│ ◄─────────────────────────────────│ (any exe)   │
//! └────────────┘  stdout = one Response envelope   └─────────────┘
//! ```
//!
//! Undeclared fields are ignored when decoding so that an adapter newer than
//! the controller can add fields without breaking it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capabilities;
pub mod data;
pub mod envelope;
pub mod error;
pub mod payload;
pub mod provider;
pub mod verb;

pub use capabilities::{AuthType, CapabilitiesData, Features};
pub use data::{VerbData, VerbParams};
pub use envelope::{BridgeError, ErrorCode, Request, Response};
pub use error::ProtoError;
pub use payload::{
    AuthRefreshData, AuthRefreshParams, AuthStartData, AuthStartParams, BuildConfig,
    DeployPreviewData, DeployPreviewParams, DnsRollbackData, DnsRollbackParams, DnsUpdateData,
    DnsUpdateParams, EnvVar, FetchConfigData, FetchConfigParams, Project, SyncEnvData,
    SyncEnvParams, VerbCall,
};
pub use provider::{Provider, ProviderName};
pub use verb::Verb;
