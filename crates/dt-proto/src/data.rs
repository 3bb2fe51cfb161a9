//! Closed sum types over the per-verb records.
//!
//! Callers that know the verb at compile time use [`crate::VerbCall`]; these
//! enums serve code that only learns the verb at runtime (the adapter
//! dispatcher, the CLI's raw `call` command).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::capabilities::CapabilitiesData;
use crate::error::ProtoError;
use crate::payload::{
    AuthRefreshData, AuthRefreshParams, AuthStartData, AuthStartParams, DeployPreviewData,
    DeployPreviewParams, DnsRollbackData, DnsRollbackParams, DnsUpdateData, DnsUpdateParams,
    FetchConfigData, FetchConfigParams, SyncEnvData, SyncEnvParams,
};
use crate::provider::Provider;
use crate::verb::Verb;

/// Decode an untyped JSON object into a known record shape.
///
/// # Errors
///
/// Returns [`ProtoError::Decoding`] if the value does not match `T`.
pub fn decode<T: DeserializeOwned>(verb: Verb, value: Value) -> Result<T, ProtoError> {
    serde_json::from_value(value).map_err(|source| ProtoError::Decoding {
        verb: verb.as_str(),
        source,
    })
}

/// Typed parameters for any verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbParams {
    /// `capabilities` carries no parameters.
    Capabilities,
    /// `auth:start`.
    AuthStart(AuthStartParams),
    /// `auth:refresh`.
    AuthRefresh(AuthRefreshParams),
    /// `fetch:config`.
    FetchConfig(FetchConfigParams),
    /// `sync:env`.
    SyncEnv(SyncEnvParams),
    /// `deploy:preview`.
    DeployPreview(DeployPreviewParams),
    /// `dns:update`.
    DnsUpdate(DnsUpdateParams),
    /// `dns:rollback`.
    DnsRollback(DnsRollbackParams),
}

impl VerbParams {
    /// Decode the params of `verb`. Missing params decode as an empty object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not match the verb's record.
    pub fn decode(verb: Verb, params: Option<Value>) -> Result<Self, ProtoError> {
        let value = params.unwrap_or_else(|| Value::Object(Map::new()));
        Ok(match verb {
            Verb::Capabilities => Self::Capabilities,
            Verb::AuthStart => Self::AuthStart(decode(verb, value)?),
            Verb::AuthRefresh => Self::AuthRefresh(decode(verb, value)?),
            Verb::FetchConfig => Self::FetchConfig(decode(verb, value)?),
            Verb::SyncEnv => Self::SyncEnv(decode(verb, value)?),
            Verb::DeployPreview => Self::DeployPreview(decode(verb, value)?),
            Verb::DnsUpdate => Self::DnsUpdate(decode(verb, value)?),
            Verb::DnsRollback => Self::DnsRollback(decode(verb, value)?),
        })
    }

    /// Verb these params belong to.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Capabilities => Verb::Capabilities,
            Self::AuthStart(_) => Verb::AuthStart,
            Self::AuthRefresh(_) => Verb::AuthRefresh,
            Self::FetchConfig(_) => Verb::FetchConfig,
            Self::SyncEnv(_) => Verb::SyncEnv,
            Self::DeployPreview(_) => Verb::DeployPreview,
            Self::DnsUpdate(_) => Verb::DnsUpdate,
            Self::DnsRollback(_) => Verb::DnsRollback,
        }
    }

    /// Provider named in the params, if the verb carries one.
    #[must_use]
    pub const fn provider(&self) -> Option<&Provider> {
        match self {
            Self::Capabilities => None,
            Self::AuthStart(p) => Some(&p.provider),
            Self::AuthRefresh(p) => Some(&p.provider),
            Self::FetchConfig(p) => Some(&p.provider),
            Self::SyncEnv(p) => Some(&p.provider),
            Self::DeployPreview(p) => Some(&p.provider),
            Self::DnsUpdate(p) => Some(&p.provider),
            Self::DnsRollback(p) => Some(&p.provider),
        }
    }

    /// Encode back into the wire object; `None` for `capabilities`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Option<Value>, ProtoError> {
        Ok(match self {
            Self::Capabilities => None,
            Self::AuthStart(p) => Some(serde_json::to_value(p)?),
            Self::AuthRefresh(p) => Some(serde_json::to_value(p)?),
            Self::FetchConfig(p) => Some(serde_json::to_value(p)?),
            Self::SyncEnv(p) => Some(serde_json::to_value(p)?),
            Self::DeployPreview(p) => Some(serde_json::to_value(p)?),
            Self::DnsUpdate(p) => Some(serde_json::to_value(p)?),
            Self::DnsRollback(p) => Some(serde_json::to_value(p)?),
        })
    }
}

/// Typed result for any verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbData {
    /// `capabilities`.
    Capabilities(CapabilitiesData),
    /// `auth:start`.
    AuthStart(AuthStartData),
    /// `auth:refresh`.
    AuthRefresh(AuthRefreshData),
    /// `fetch:config`.
    FetchConfig(FetchConfigData),
    /// `sync:env`.
    SyncEnv(SyncEnvData),
    /// `deploy:preview`.
    DeployPreview(DeployPreviewData),
    /// `dns:update`.
    DnsUpdate(DnsUpdateData),
    /// `dns:rollback`.
    DnsRollback(DnsRollbackData),
}

impl VerbData {
    /// Decode a response's `data` for `verb`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not match the verb's result record.
    pub fn decode(verb: Verb, data: Value) -> Result<Self, ProtoError> {
        Ok(match verb {
            Verb::Capabilities => Self::Capabilities(decode(verb, data)?),
            Verb::AuthStart => Self::AuthStart(decode(verb, data)?),
            Verb::AuthRefresh => Self::AuthRefresh(decode(verb, data)?),
            Verb::FetchConfig => Self::FetchConfig(decode(verb, data)?),
            Verb::SyncEnv => Self::SyncEnv(decode(verb, data)?),
            Verb::DeployPreview => Self::DeployPreview(decode(verb, data)?),
            Verb::DnsUpdate => Self::DnsUpdate(decode(verb, data)?),
            Verb::DnsRollback => Self::DnsRollback(decode(verb, data)?),
        })
    }

    /// Verb this result belongs to.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Capabilities(_) => Verb::Capabilities,
            Self::AuthStart(_) => Verb::AuthStart,
            Self::AuthRefresh(_) => Verb::AuthRefresh,
            Self::FetchConfig(_) => Verb::FetchConfig,
            Self::SyncEnv(_) => Verb::SyncEnv,
            Self::DeployPreview(_) => Verb::DeployPreview,
            Self::DnsUpdate(_) => Verb::DnsUpdate,
            Self::DnsRollback(_) => Verb::DnsRollback,
        }
    }

    /// Encode back into the wire object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Value, ProtoError> {
        fn enc<T: Serialize>(v: &T) -> Result<Value, ProtoError> {
            Ok(serde_json::to_value(v)?)
        }
        match self {
            Self::Capabilities(d) => enc(d),
            Self::AuthStart(d) => enc(d),
            Self::AuthRefresh(d) => enc(d),
            Self::FetchConfig(d) => enc(d),
            Self::SyncEnv(d) => enc(d),
            Self::DeployPreview(d) => enc(d),
            Self::DnsUpdate(d) => enc(d),
            Self::DnsRollback(d) => enc(d),
        }
    }
}
