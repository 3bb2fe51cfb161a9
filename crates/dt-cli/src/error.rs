//! CLI error types.

use std::fmt;

use dt_bridge::{CallError, ConfigError};
use dt_proto::ErrorCode;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid bridge configuration.
    Config(String),
    /// A bridge call failed.
    Call(CallError),
    /// Invalid argument.
    InvalidArgument(String),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Call(err) => {
                let status = if err.is_recoverable() {
                    "retries exhausted"
                } else {
                    "requires action"
                };
                write!(f, "{} ({status})", advice(err))
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

/// One actionable sentence describing `err`.
#[must_use]
pub fn advice(err: &CallError) -> String {
    match err {
        CallError::Failed(e) => {
            let msg = &e.message;
            match e.code {
                ErrorCode::AuthFailed => {
                    format!("authentication failed: {msg}; run `dt auth` to sign in again")
                }
                ErrorCode::AuthRequired => {
                    format!("not signed in: {msg}; run `dt auth` first")
                }
                ErrorCode::ProviderError => format!("provider API error: {msg}"),
                ErrorCode::NetworkError => {
                    format!("could not reach the provider: {msg}; check your connection")
                }
                ErrorCode::InvalidParams => format!("invalid request: {msg}"),
                ErrorCode::NotFound => {
                    format!("not found: {msg}; check the project or record id")
                }
                ErrorCode::RateLimited => {
                    format!("rate limited by the provider: {msg}; wait before retrying")
                }
                ErrorCode::Unsupported => format!("not supported by this adapter: {msg}"),
                ErrorCode::Timeout => format!("provider timed out: {msg}"),
                ErrorCode::Unknown => format!("adapter error: {msg}"),
            }
        }
        CallError::AdapterNotFound { provider, path } => format!(
            "no adapter installed for {provider} (looked for {}); set DT_ADAPTERS_PATH or install the adapter",
            path.display()
        ),
        CallError::Timeout { .. } => {
            format!("{err}; raise --timeout if the provider is slow")
        }
        CallError::Crashed {
            provider, stderr, ..
        } => {
            let first = stderr.lines().next().unwrap_or("no output");
            format!("adapter for {provider} crashed: {first}; run with RUST_LOG=dt_bridge=trace for its full stderr")
        }
        CallError::MalformedResponse {
            provider, reason, ..
        } => format!("adapter for {provider} returned an invalid response: {reason}"),
        CallError::Decode {
            verb,
            adapter_version,
            source,
        } => format!(
            "adapter {adapter_version} returned an unexpected {verb} result ({source}); it may be out of date"
        ),
        other => other.to_string(),
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Call(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CallError> for CliError {
    fn from(err: CallError) -> Self {
        Self::Call(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_proto::{BridgeError, Provider, Verb};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn auth_failed_requires_action() {
        let err = CliError::from(CallError::from(BridgeError::new(
            ErrorCode::AuthFailed,
            "bad token",
        )));
        let text = err.to_string();
        assert!(text.starts_with("authentication failed: bad token"));
        assert!(text.ends_with("(requires action)"));
    }

    #[test]
    fn recoverable_reports_exhausted_retries() {
        let err = CliError::from(CallError::from(BridgeError::new(
            ErrorCode::RateLimited,
            "slow down",
        )));
        assert!(err.to_string().ends_with("(retries exhausted)"));
    }

    #[test]
    fn timeout_suggests_raising_deadline() {
        let err = CallError::Timeout {
            provider: Provider::Vercel,
            verb: Verb::DeployPreview,
            timeout: Duration::from_secs(30),
        };
        assert!(advice(&err).contains("--timeout"));
    }

    #[test]
    fn missing_adapter_names_env_var() {
        let err = CliError::from(CallError::AdapterNotFound {
            provider: Provider::Netlify,
            path: PathBuf::from("/a/netlify/index.ts"),
        });
        let text = err.to_string();
        assert!(text.contains("DT_ADAPTERS_PATH"));
        assert!(text.contains("/a/netlify/index.ts"));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(matches!(CliError::from(io_err), CliError::Io(_)));
    }
}
