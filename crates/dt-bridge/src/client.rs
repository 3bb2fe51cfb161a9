//! Typed call façade.
//!
//! One method per verb. Each builds the request, hands it to the
//! [`Engine`], and decodes the envelope's `data` into the verb's result
//! record. Adapter-reported errors come back unchanged as
//! [`CallError::Failed`]; a result that does not decode is
//! [`CallError::Decode`]. Nothing here retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use dt_bridge::{BridgeClient, BridgeConfig};
//! use dt_proto::{FetchConfigParams, Provider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BridgeClient::from_config(BridgeConfig::new("./adapters"))?;
//! let caps = client.capabilities(&Provider::Vercel).await?;
//! println!("{} v{}", caps.adapter_name, caps.adapter_version);
//!
//! let config = client
//!     .fetch_config(&FetchConfigParams {
//!         provider: Provider::Vercel,
//!         token: "token".into(),
//!         project_id: Some("prj_123".into()),
//!     })
//!     .await?;
//! println!("{}", config.project.name);
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use tracing::debug;

use dt_proto::data::decode;
use dt_proto::{
    AuthRefreshData, AuthRefreshParams, AuthStartData, AuthStartParams, CapabilitiesData,
    DeployPreviewData, DeployPreviewParams, DnsRollbackData, DnsRollbackParams, DnsUpdateData,
    DnsUpdateParams, FetchConfigData, FetchConfigParams, ProtoError, Provider, Response,
    SyncEnvData, SyncEnvParams, Verb, VerbCall, VerbData, VerbParams,
};

use crate::config::BridgeConfig;
use crate::engine::Engine;
use crate::error::{CallError, CallResult, ConfigError};

/// Strongly typed access to provider adapters.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    engine: Engine,
}

impl BridgeClient {
    /// Wrap an engine.
    #[must_use]
    pub const fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Build an engine from `config` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn from_config(config: BridgeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Engine::new(config)?))
    }

    /// Underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Ask an adapter for its identity, auth model and features.
    ///
    /// Usually the first call of a workflow.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn capabilities(&self, provider: &Provider) -> CallResult<CapabilitiesData> {
        let response = self.engine.execute(provider, Verb::Capabilities, None).await?;
        decode_response(Verb::Capabilities, response)
    }

    /// Run the verb bound to `params`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn call<P: VerbCall>(&self, params: &P) -> CallResult<P::Output> {
        let value = serde_json::to_value(params)
            .map_err(|e| CallError::Encode(ProtoError::Encoding(e)))?;
        let response = self
            .engine
            .execute(params.provider(), P::VERB, Some(value))
            .await?;
        decode_response(P::VERB, response)
    }

    /// `auth:start`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn auth_start(&self, params: &AuthStartParams) -> CallResult<AuthStartData> {
        self.call(params).await
    }

    /// `auth:refresh`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn auth_refresh(&self, params: &AuthRefreshParams) -> CallResult<AuthRefreshData> {
        self.call(params).await
    }

    /// `fetch:config`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn fetch_config(&self, params: &FetchConfigParams) -> CallResult<FetchConfigData> {
        self.call(params).await
    }

    /// `sync:env`. Not guaranteed idempotent.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn sync_env(&self, params: &SyncEnvParams) -> CallResult<SyncEnvData> {
        self.call(params).await
    }

    /// `deploy:preview`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn deploy_preview(
        &self,
        params: &DeployPreviewParams,
    ) -> CallResult<DeployPreviewData> {
        self.call(params).await
    }

    /// `dns:update`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn dns_update(&self, params: &DnsUpdateParams) -> CallResult<DnsUpdateData> {
        self.call(params).await
    }

    /// `dns:rollback`.
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn dns_rollback(&self, params: &DnsRollbackParams) -> CallResult<DnsRollbackData> {
        self.call(params).await
    }

    /// Run any verb with already-typed params and decode into [`VerbData`].
    ///
    /// # Errors
    ///
    /// Returns any [`CallError`].
    pub async fn call_dynamic(
        &self,
        provider: &Provider,
        params: &VerbParams,
    ) -> CallResult<VerbData> {
        let verb = params.verb();
        let value = params.to_value().map_err(CallError::Encode)?;
        let response = self.engine.execute(provider, verb, value).await?;
        decode_data(verb, response)
    }

    /// Run a verb given by name with untyped params.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::UnknownVerb`] before spawning for names outside the
    /// vocabulary, otherwise any [`CallError`].
    pub async fn call_named(
        &self,
        provider: &Provider,
        verb: &str,
        params: Option<Value>,
    ) -> CallResult<VerbData> {
        let (verb, response) = self.engine.execute_named(provider, verb, params).await?;
        decode_data(verb, response)
    }
}

fn decode_response<T: serde::de::DeserializeOwned>(verb: Verb, response: Response) -> CallResult<T> {
    let adapter_version = response.adapter_version.clone();
    let data = response.into_result()?;
    debug!(verb = %verb, adapter_version = %adapter_version, "decoding result");
    decode(verb, data).map_err(|source| CallError::Decode {
        verb,
        adapter_version,
        source,
    })
}

fn decode_data(verb: Verb, response: Response) -> CallResult<VerbData> {
    let adapter_version = response.adapter_version.clone();
    let data = response.into_result()?;
    VerbData::decode(verb, data).map_err(|source| CallError::Decode {
        verb,
        adapter_version,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(data: Value) -> Response {
        Response::success("1.0.0", data)
    }

    #[test]
    fn decode_response_success() {
        let data: dt_proto::AuthRefreshData = decode_response(
            Verb::AuthRefresh,
            ok(json!({"token": "new", "expires_at": 1_700_000_000})),
        )
        .unwrap();
        assert_eq!(data.token, "new");
    }

    #[test]
    fn decode_response_skew_is_decode_error() {
        let err = decode_response::<dt_proto::DnsUpdateData>(Verb::DnsUpdate, ok(json!({})))
            .unwrap_err();
        match err {
            CallError::Decode {
                verb,
                adapter_version,
                ..
            } => {
                assert_eq!(verb, Verb::DnsUpdate);
                assert_eq!(adapter_version, "1.0.0");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn decode_data_null_treated_as_empty_object() {
        let response = Response {
            ok: true,
            data: None,
            error: None,
            adapter_version: "1".into(),
        };
        let data = decode_data(Verb::AuthStart, response).unwrap();
        assert_eq!(data, VerbData::AuthStart(AuthStartData::default()));
    }
}
