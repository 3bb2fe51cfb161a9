//! Error types for the dt-proto crate.

use thiserror::Error;

/// Errors raised while validating or decoding schema values.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Verb name outside the closed vocabulary.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// Provider name that cannot be used as an adapter directory.
    #[error("invalid provider name '{name}': {reason}")]
    InvalidProvider {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A response envelope that violates the `ok`/`data`/`error` invariant.
    #[error("envelope invariant violated: {0}")]
    Envelope(&'static str),

    /// Payload did not match the expected record shape.
    #[error("decoding error for {verb}: {source}")]
    Decoding {
        /// Verb whose payload failed to decode.
        verb: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Payload could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_verb_display() {
        let err = ProtoError::UnknownVerb("deploy:prod".into());
        assert_eq!(err.to_string(), "unknown verb: deploy:prod");
    }

    #[test]
    fn invalid_provider_display() {
        let err = ProtoError::InvalidProvider {
            name: "../etc".into(),
            reason: "path separators are not allowed",
        };
        assert_eq!(
            err.to_string(),
            "invalid provider name '../etc': path separators are not allowed"
        );
    }
}
