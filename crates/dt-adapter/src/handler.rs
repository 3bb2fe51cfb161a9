//! Raw verb handler seam.

use std::future::Future;

use serde_json::Value;

use dt_proto::{BridgeError, CapabilitiesData, VerbParams};

/// Answers already-validated requests with an untyped `data` object.
///
/// [`crate::dispatch`] parses the verb, rejects verbs missing from
/// [`Handler::capabilities`], decodes the params, and only then calls
/// [`Handler::handle`]. Implement this directly when the result shape is not
/// one of the verb records (the echo adapter does); otherwise implement
/// [`crate::ProviderAdapter`] and wrap it in [`crate::Typed`].
pub trait Handler: Send + Sync {
    /// Identity, version and supported verbs.
    fn capabilities(&self) -> CapabilitiesData;

    /// Produce the response `data` for `params`.
    fn handle(&self, params: VerbParams)
    -> impl Future<Output = Result<Value, BridgeError>> + Send;
}
