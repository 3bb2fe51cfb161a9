//! # dt-adapter
//!
//! Adapter side of the deploy-tunnel bridge.
//!
//! An adapter is any executable that takes a verb as its first argument,
//! optionally reads one JSON object from stdin, and writes exactly one
//! response envelope to stdout. This crate takes care of that contract so a
//! Rust adapter only implements the provider calls:
//!
//! ```rust,no_run
//! use std::process::ExitCode;
//!
//! use dt_adapter::{ProviderAdapter, Typed};
//! use dt_proto::{AuthType, CapabilitiesData, Features, Verb};
//!
//! struct MyAdapter;
//!
//! impl ProviderAdapter for MyAdapter {
//!     fn capabilities(&self) -> CapabilitiesData {
//!         CapabilitiesData {
//!             adapter_name: "my-provider".into(),
//!             adapter_version: "0.1.0".into(),
//!             supported_verbs: vec![Verb::Capabilities],
//!             auth_type: AuthType::Token,
//!             features: Features::default(),
//!         }
//!     }
//! }
//!
//! fn main() -> ExitCode {
//!     dt_adapter::run(Typed(MyAdapter))
//! }
//! ```
//!
//! Verbs the adapter does not override answer `UNSUPPORTED`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod handler;
pub mod reference;
pub mod runtime;

pub use adapter::{AdapterResult, ProviderAdapter, Typed};
pub use handler::Handler;
pub use runtime::{dispatch, run, write_response};
