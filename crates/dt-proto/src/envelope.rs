//! Request and response envelopes exchanged with adapters.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ProtoError;
use crate::verb::Verb;

/// Closed taxonomy of adapter-reported failures.
///
/// A code this build does not know (from a newer adapter) decodes as
/// [`ErrorCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Credentials were rejected.
    AuthFailed,
    /// The call needs credentials that were not supplied.
    AuthRequired,
    /// The provider API returned an error.
    ProviderError,
    /// The provider could not be reached.
    NetworkError,
    /// Parameters were missing or malformed, or the verb was unrecognized.
    InvalidParams,
    /// The referenced project, record or deployment does not exist.
    NotFound,
    /// The provider throttled the call.
    RateLimited,
    /// The adapter does not implement this verb.
    Unsupported,
    /// The call did not finish in time.
    Timeout,
    /// Anything else.
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// Every code, in taxonomy order.
    pub const ALL: [Self; 10] = [
        Self::AuthFailed,
        Self::AuthRequired,
        Self::ProviderError,
        Self::NetworkError,
        Self::InvalidParams,
        Self::NotFound,
        Self::RateLimited,
        Self::Unsupported,
        Self::Timeout,
        Self::Unknown,
    ];

    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Unsupported => "UNSUPPORTED",
            Self::Timeout => "TIMEOUT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether an error with this code can usually be retried unchanged.
    ///
    /// Adapters may override this per error via [`BridgeError::with_recoverable`].
    #[must_use]
    pub const fn default_recoverable(self) -> bool {
        matches!(self, Self::NetworkError | Self::RateLimited | Self::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure carried in a response's `error` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct BridgeError {
    /// Failure class.
    pub code: ErrorCode,
    /// Human-readable description from the adapter.
    pub message: String,
    /// Whether the same call may be retried unchanged.
    pub recoverable: bool,
    /// Adapter-specific diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl BridgeError {
    /// Create an error whose `recoverable` flag follows the code's default.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            recoverable: code.default_recoverable(),
            details: None,
        }
    }

    /// Override the `recoverable` flag.
    #[must_use]
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Attach one diagnostic detail.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Error returned for a verb name outside the vocabulary.
    pub fn unknown_verb(name: &str) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("unknown verb: {name}"))
            .with_detail("verb", name)
    }

    /// Error returned for a recognized verb the adapter does not implement.
    pub fn unsupported(verb: Verb) -> Self {
        Self::new(ErrorCode::Unsupported, format!("verb not supported: {verb}"))
            .with_recoverable(false)
            .with_detail("verb", verb.as_str())
    }

    /// Error returned when params do not decode into the verb's record.
    pub fn invalid_params(verb: Verb, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            format!("invalid params for {verb}: {reason}"),
        )
    }
}

/// A request as the adapter sees it: the verb argument plus stdin params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The verb to perform.
    pub verb: Verb,
    /// Verb-specific parameters, `None` when stdin was empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a request.
    #[must_use]
    pub const fn new(verb: Verb, params: Option<Value>) -> Self {
        Self { verb, params }
    }

    /// Bytes written to the adapter's stdin. Empty when there are no params.
    ///
    /// # Errors
    ///
    /// Returns an error if the params cannot be serialized.
    pub fn stdin_payload(&self) -> Result<Vec<u8>, ProtoError> {
        match &self.params {
            Some(params) => Ok(serde_json::to_vec(params)?),
            None => Ok(Vec::new()),
        }
    }

    /// Rebuild a request from a verb argument and raw stdin bytes.
    ///
    /// Empty or whitespace-only input means "no parameters".
    ///
    /// # Errors
    ///
    /// Returns an error if the verb is unknown or stdin is not a JSON value.
    pub fn from_process_input(verb: &str, stdin: &[u8]) -> Result<Self, ProtoError> {
        let verb: Verb = verb.parse()?;
        let params = if stdin.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            let value: Value = serde_json::from_slice(stdin).map_err(|source| {
                ProtoError::Decoding {
                    verb: verb.as_str(),
                    source,
                }
            })?;
            (!value.is_null()).then_some(value)
        };
        Ok(Self { verb, params })
    }
}

/// The single JSON object an adapter writes to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the verb succeeded.
    pub ok: bool,
    /// Verb-specific result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure on `ok: false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BridgeError>,
    /// Adapter version, present on every response.
    pub adapter_version: String,
}

impl Response {
    /// Create a success envelope.
    pub fn success(adapter_version: impl Into<String>, data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            adapter_version: adapter_version.into(),
        }
    }

    /// Create a failure envelope.
    pub fn failure(adapter_version: impl Into<String>, error: BridgeError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            adapter_version: adapter_version.into(),
        }
    }

    /// Check the `ok`/`data`/`error` invariant.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated rule.
    pub fn validate(&self) -> Result<(), ProtoError> {
        match (self.ok, &self.data, &self.error) {
            (true, _, Some(_)) => Err(ProtoError::Envelope("ok response carries an error")),
            (false, _, None) => Err(ProtoError::Envelope("failed response is missing its error")),
            (false, Some(data), Some(_)) if !data.is_null() => {
                Err(ProtoError::Envelope("failed response carries data"))
            }
            _ => Ok(()),
        }
    }

    /// Split the envelope into its data or its error.
    ///
    /// Assumes [`Response::validate`] passed. A success with no data yields
    /// an empty object.
    ///
    /// # Errors
    ///
    /// Returns the adapter's [`BridgeError`] when `ok` is false.
    pub fn into_result(self) -> Result<Value, BridgeError> {
        if self.ok {
            return Ok(match self.data {
                Some(Value::Null) | None => Value::Object(Map::new()),
                Some(data) => data,
            });
        }
        Err(self.error.unwrap_or_else(|| {
            BridgeError::new(ErrorCode::Unknown, "adapter reported failure without an error")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_code_wire_names() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn unrecognized_error_code_decodes_as_unknown() {
        let code: ErrorCode = serde_json::from_str(r#""QUOTA_EXCEEDED""#).unwrap();
        assert_eq!(code, ErrorCode::Unknown);
    }

    #[test]
    fn default_recoverability() {
        let recoverable: Vec<_> = ErrorCode::ALL
            .into_iter()
            .filter(|c| c.default_recoverable())
            .collect();
        assert_eq!(
            recoverable,
            vec![ErrorCode::NetworkError, ErrorCode::RateLimited, ErrorCode::Timeout]
        );
    }

    #[test]
    fn bridge_error_builders() {
        let err = BridgeError::new(ErrorCode::AuthFailed, "bad token")
            .with_recoverable(true)
            .with_detail("status", 401);
        assert!(err.recoverable);
        assert_eq!(err.details.as_ref().unwrap()["status"], json!(401));
        assert_eq!(err.to_string(), "AUTH_FAILED: bad token");

        let unsupported = BridgeError::unsupported(Verb::DnsUpdate);
        assert_eq!(unsupported.code, ErrorCode::Unsupported);
        assert!(!unsupported.recoverable);
    }

    #[test]
    fn failure_envelope_parses_without_details() {
        let raw = r#"{"ok":false,"error":{"code":"AUTH_FAILED","message":"bad token","recoverable":true},"adapter_version":"1.0.0"}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        response.validate().unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
        assert!(err.recoverable);
        assert!(err.details.is_none());
    }

    #[test]
    fn envelope_ignores_undeclared_fields() {
        let raw = r#"{"ok":true,"data":{},"adapter_version":"2.0.0","trace_id":"abc"}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        assert!(response.validate().is_ok());
    }

    #[test]
    fn envelope_requires_adapter_version() {
        let raw = r#"{"ok":true,"data":{}}"#;
        assert!(serde_json::from_str::<Response>(raw).is_err());
    }

    #[test]
    fn envelope_invariants() {
        let mut ok_with_error = Response::success("1", json!({}));
        ok_with_error.error = Some(BridgeError::new(ErrorCode::Unknown, "x"));
        assert!(ok_with_error.validate().is_err());

        let mut failed_without_error = Response::failure("1", BridgeError::new(ErrorCode::Unknown, "x"));
        failed_without_error.error = None;
        assert!(failed_without_error.validate().is_err());

        let mut failed_with_data = Response::failure("1", BridgeError::new(ErrorCode::Unknown, "x"));
        failed_with_data.data = Some(json!({"id": 1}));
        assert!(failed_with_data.validate().is_err());
    }

    #[test]
    fn success_without_data_yields_empty_object() {
        let response: Response =
            serde_json::from_str(r#"{"ok":true,"data":null,"adapter_version":"1"}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), json!({}));
    }

    #[test]
    fn request_without_params_has_empty_stdin() {
        let request = Request::new(Verb::Capabilities, None);
        assert!(request.stdin_payload().unwrap().is_empty());
    }

    #[test]
    fn request_from_process_input() {
        let request = Request::from_process_input("fetch:config", br#"{"provider":"vercel"}"#).unwrap();
        assert_eq!(request.verb, Verb::FetchConfig);
        assert_eq!(request.params, Some(json!({"provider": "vercel"})));

        let empty = Request::from_process_input("capabilities", b"  \n").unwrap();
        assert_eq!(empty.params, None);

        assert!(Request::from_process_input("nope", b"").is_err());
        assert!(Request::from_process_input("sync:env", b"{not json").is_err());
    }
}
