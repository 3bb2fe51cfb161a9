//! Typed provider adapter trait.

use std::future::{Future, ready};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use dt_proto::{
    AuthRefreshData, AuthRefreshParams, AuthStartData, AuthStartParams, BridgeError,
    CapabilitiesData, DeployPreviewData, DeployPreviewParams, DnsRollbackData, DnsRollbackParams,
    DnsUpdateData, DnsUpdateParams, ErrorCode, FetchConfigData, FetchConfigParams, SyncEnvData,
    SyncEnvParams, Verb, VerbParams,
};

use crate::handler::Handler;

/// Result of one provider call.
pub type AdapterResult<T> = Result<T, BridgeError>;

/// One method per verb over the typed records.
///
/// Only [`ProviderAdapter::capabilities`] is required. Every other method
/// defaults to `UNSUPPORTED`; a verb also has to be listed in
/// `supported_verbs` before it is ever called.
pub trait ProviderAdapter: Send + Sync {
    /// Identity, auth model and supported verbs.
    fn capabilities(&self) -> CapabilitiesData;

    /// Start authentication.
    fn auth_start(
        &self,
        params: AuthStartParams,
    ) -> impl Future<Output = AdapterResult<AuthStartData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::AuthStart)))
    }

    /// Exchange a refresh token.
    fn auth_refresh(
        &self,
        params: AuthRefreshParams,
    ) -> impl Future<Output = AdapterResult<AuthRefreshData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::AuthRefresh)))
    }

    /// Read project, build settings and environment.
    fn fetch_config(
        &self,
        params: FetchConfigParams,
    ) -> impl Future<Output = AdapterResult<FetchConfigData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::FetchConfig)))
    }

    /// Push environment variables.
    fn sync_env(
        &self,
        params: SyncEnvParams,
    ) -> impl Future<Output = AdapterResult<SyncEnvData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::SyncEnv)))
    }

    /// Trigger a preview deployment.
    fn deploy_preview(
        &self,
        params: DeployPreviewParams,
    ) -> impl Future<Output = AdapterResult<DeployPreviewData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::DeployPreview)))
    }

    /// Create or change a DNS record.
    fn dns_update(
        &self,
        params: DnsUpdateParams,
    ) -> impl Future<Output = AdapterResult<DnsUpdateData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::DnsUpdate)))
    }

    /// Restore a DNS record to an earlier value.
    fn dns_rollback(
        &self,
        params: DnsRollbackParams,
    ) -> impl Future<Output = AdapterResult<DnsRollbackData>> + Send {
        let _ = params;
        ready(Err(BridgeError::unsupported(Verb::DnsRollback)))
    }
}

/// Adapts a [`ProviderAdapter`] to the raw [`Handler`] seam.
#[derive(Debug, Clone, Default)]
pub struct Typed<A>(pub A);

impl<A: ProviderAdapter> Handler for Typed<A> {
    fn capabilities(&self) -> CapabilitiesData {
        self.0.capabilities()
    }

    async fn handle(&self, params: VerbParams) -> Result<Value, BridgeError> {
        let verb = params.verb();
        debug!(verb = %verb, "handling verb");
        match params {
            VerbParams::Capabilities => encode(verb, &self.0.capabilities()),
            VerbParams::AuthStart(p) => encode(verb, &self.0.auth_start(p).await?),
            VerbParams::AuthRefresh(p) => encode(verb, &self.0.auth_refresh(p).await?),
            VerbParams::FetchConfig(p) => encode(verb, &self.0.fetch_config(p).await?),
            VerbParams::SyncEnv(p) => encode(verb, &self.0.sync_env(p).await?),
            VerbParams::DeployPreview(p) => encode(verb, &self.0.deploy_preview(p).await?),
            VerbParams::DnsUpdate(p) => encode(verb, &self.0.dns_update(p).await?),
            VerbParams::DnsRollback(p) => encode(verb, &self.0.dns_rollback(p).await?),
        }
    }
}

fn encode<T: Serialize>(verb: Verb, data: &T) -> Result<Value, BridgeError> {
    serde_json::to_value(data).map_err(|e| {
        BridgeError::new(
            ErrorCode::Unknown,
            format!("failed to encode {verb} result: {e}"),
        )
    })
}
