//! Bridge error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use dt_proto::{BridgeError, ErrorCode, ProtoError, Provider, Verb};

use crate::engine::{MAX_STDERR_DISPLAY, preview};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::BridgeConfig`].
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("configuration error: {0}")]
    Invalid(String),
}

/// Why a bridge call did not produce a typed result.
///
/// [`CallError::Failed`] is the only variant reported by the adapter itself;
/// every other variant is raised locally by the engine or the façade.
#[derive(Debug, Error)]
pub enum CallError {
    /// The verb is not part of the vocabulary. Nothing was spawned.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// No entry point at the resolved path. Nothing was spawned.
    #[error("adapter not found: {provider} (looked for {})", path.display())]
    AdapterNotFound {
        /// Provider that was requested.
        provider: Provider,
        /// Path that was checked.
        path: PathBuf,
    },

    /// The resolved entry point lies outside the adapters root. Nothing was
    /// spawned.
    #[error("adapter path for {provider} escapes the adapters root: {}", path.display())]
    OutsideRoot {
        /// Provider that was requested.
        provider: Provider,
        /// Offending path.
        path: PathBuf,
    },

    /// The params could not be serialized.
    #[error("failed to encode params: {0}")]
    Encode(#[source] ProtoError),

    /// The adapter process could not be started.
    #[error("failed to spawn adapter for {provider}: {source}")]
    Spawn {
        /// Provider whose adapter failed to start.
        provider: Provider,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the adapter process failed.
    #[error("adapter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The deadline elapsed; the adapter was killed and reaped.
    #[error("{verb} on {provider} timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// Provider whose adapter was killed.
        provider: Provider,
        /// Verb that was running.
        verb: Verb,
        /// Configured deadline.
        timeout: Duration,
    },

    /// The adapter exited unsuccessfully without writing an envelope.
    #[error(
        "adapter for {provider} exited with status {} before responding: {}",
        exit_code_display(.exit_code.as_ref()),
        preview(.stderr.as_bytes(), MAX_STDERR_DISPLAY)
    )]
    Crashed {
        /// Provider whose adapter crashed.
        provider: Provider,
        /// Verb that was running.
        verb: Verb,
        /// Exit code, `None` if killed by a signal.
        exit_code: Option<i32>,
        /// Everything the adapter wrote to standard error.
        stderr: String,
    },

    /// The adapter exited but its output is not a valid envelope.
    #[error("malformed response from {provider} adapter: {reason} (output: {output})")]
    MalformedResponse {
        /// Provider whose adapter misbehaved.
        provider: Provider,
        /// Verb that was running.
        verb: Verb,
        /// What was wrong with the output.
        reason: String,
        /// Bounded prefix of raw stdout.
        output: String,
    },

    /// The adapter answered `ok: false`.
    #[error("adapter error {0}")]
    Failed(#[from] BridgeError),

    /// A valid envelope whose `data` does not match the verb's result shape.
    #[error("failed to decode {verb} result from adapter {adapter_version}: {source}")]
    Decode {
        /// Verb whose result failed to decode.
        verb: Verb,
        /// Version reported by the adapter, to diagnose skew.
        adapter_version: String,
        /// Underlying decode error.
        #[source]
        source: ProtoError,
    },
}

fn exit_code_display(code: Option<&i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl CallError {
    /// Adapter-reported error, if this is a [`CallError::Failed`].
    #[must_use]
    pub const fn bridge_error(&self) -> Option<&BridgeError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Error code for policy decisions.
    ///
    /// `Failed` reports the adapter's code, `Timeout` maps to
    /// [`ErrorCode::Timeout`] and `Crashed` to [`ErrorCode::Unknown`]. Other
    /// local conditions have no code.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Failed(err) => Some(err.code),
            Self::Timeout { .. } => Some(ErrorCode::Timeout),
            Self::Crashed { .. } => Some(ErrorCode::Unknown),
            _ => None,
        }
    }

    /// Whether the same call may be retried unchanged.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Failed(err) => err.recoverable,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true for [`CallError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for [`CallError::MalformedResponse`].
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// Express this error as a wire [`BridgeError`], synthesizing one for
    /// timeouts (`TIMEOUT`) and crashes (`UNKNOWN` with stderr attached).
    #[must_use]
    pub fn to_bridge_error(&self) -> Option<BridgeError> {
        match self {
            Self::Failed(err) => Some(err.clone()),
            Self::Timeout { verb, timeout, .. } => Some(
                BridgeError::new(
                    ErrorCode::Timeout,
                    format!("adapter command timed out after {}ms", timeout.as_millis()),
                )
                .with_detail("verb", verb.as_str()),
            ),
            Self::Crashed {
                exit_code, stderr, ..
            } => {
                let mut err = BridgeError::new(
                    ErrorCode::Unknown,
                    "adapter exited before writing a response",
                )
                .with_detail("stderr", stderr.clone());
                if let Some(code) = exit_code {
                    err = err.with_detail("exit_code", *code);
                }
                Some(err)
            }
            _ => None,
        }
    }
}

/// Result alias for bridge calls.
pub type CallResult<T> = Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_preserves_code_and_recoverable() {
        let err = CallError::from(
            BridgeError::new(ErrorCode::AuthFailed, "bad token").with_recoverable(true),
        );
        assert_eq!(err.code(), Some(ErrorCode::AuthFailed));
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "adapter error AUTH_FAILED: bad token");
    }

    #[test]
    fn timeout_is_recoverable_with_timeout_code() {
        let err = CallError::Timeout {
            provider: Provider::Render,
            verb: Verb::SyncEnv,
            timeout: Duration::from_millis(1500),
        };
        assert!(err.is_timeout());
        assert!(err.is_recoverable());
        assert_eq!(err.code(), Some(ErrorCode::Timeout));
        assert_eq!(err.to_string(), "sync:env on render timed out after 1500ms");
        let wire = err.to_bridge_error().unwrap();
        assert_eq!(wire.code, ErrorCode::Timeout);
        assert!(wire.recoverable);
    }

    #[test]
    fn crash_synthesizes_unknown() {
        let err = CallError::Crashed {
            provider: Provider::Netlify,
            verb: Verb::FetchConfig,
            exit_code: Some(2),
            stderr: "TypeError: x is undefined".into(),
        };
        assert_eq!(err.code(), Some(ErrorCode::Unknown));
        assert!(!err.is_recoverable());
        let wire = err.to_bridge_error().unwrap();
        let details = wire.details.unwrap();
        assert_eq!(details["stderr"], "TypeError: x is undefined");
        assert_eq!(details["exit_code"], 2);
    }

    #[test]
    fn crash_keeps_full_stderr_but_bounds_message() {
        let stderr = format!("{}\nlast line", "trace ".repeat(1000));
        let err = CallError::Crashed {
            provider: Provider::Render,
            verb: Verb::DeployPreview,
            exit_code: None,
            stderr: stderr.clone(),
        };
        assert!(err.to_string().len() < stderr.len());
        assert!(err.to_string().contains("exited with status signal"));
        let wire = err.to_bridge_error().unwrap();
        assert_eq!(wire.details.unwrap()["stderr"], stderr.as_str());
    }

    #[test]
    fn local_conditions_have_no_code() {
        let err = CallError::AdapterNotFound {
            provider: Provider::Vercel,
            path: PathBuf::from("/x/vercel/index.ts"),
        };
        assert_eq!(err.code(), None);
        assert!(!err.is_recoverable());
        assert!(err.to_bridge_error().is_none());

        let err = CallError::MalformedResponse {
            provider: Provider::Vercel,
            verb: Verb::Capabilities,
            reason: "expected value".into(),
            output: "not json".into(),
        };
        assert!(err.is_malformed());
        assert!(err.to_string().contains("not json"));
    }
}
