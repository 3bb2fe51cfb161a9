//! Adapter identity and feature surface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::verb::{deserialize_known_verbs, Verb};

/// How an adapter authenticates against its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Browser-based OAuth; `auth:start` returns an `auth_url`.
    Oauth,
    /// Personal access token pasted by the user.
    Token,
    /// Account-level API key.
    ApiKey,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Oauth => "oauth",
            Self::Token => "token",
            Self::ApiKey => "api_key",
        })
    }
}

/// Optional provider features an adapter exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    /// `dns:update` / `dns:rollback` are backed by the provider.
    pub dns_management: bool,
    /// `deploy:preview` is backed by the provider.
    pub preview_deployments: bool,
    /// `sync:env` is backed by the provider.
    pub env_variables: bool,
    /// The provider exposes build logs.
    pub build_logs: bool,
}

/// Result of the `capabilities` verb.
///
/// Fetched once per session. Not guaranteed stable across adapter upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesData {
    /// Adapter display name.
    pub adapter_name: String,
    /// Adapter version.
    pub adapter_version: String,
    /// Verbs the adapter implements. Names unknown to this build are dropped.
    #[serde(deserialize_with = "deserialize_known_verbs")]
    pub supported_verbs: Vec<Verb>,
    /// Authentication model.
    pub auth_type: AuthType,
    /// Feature flags.
    pub features: Features,
}

impl CapabilitiesData {
    /// Returns true if the adapter advertises `verb`.
    #[must_use]
    pub fn supports(&self, verb: Verb) -> bool {
        verb == Verb::Capabilities || self.supported_verbs.contains(&verb)
    }
}
