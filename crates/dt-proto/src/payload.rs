//! Per-verb parameter and result records.
//!
//! Optional fields are omitted from the wire when absent; presence is
//! meaningful (for instance an [`AuthStartData`] with an `auth_url` starts an
//! OAuth flow, one without it asks the user for a token).

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::provider::Provider;
use crate::verb::Verb;

/// Binds a parameter record to its verb and result record.
pub trait VerbCall: Serialize + DeserializeOwned {
    /// Verb this record is sent with.
    const VERB: Verb;
    /// Result record decoded from the response `data`.
    type Output: Serialize + DeserializeOwned;

    /// Provider whose adapter handles the call.
    fn provider(&self) -> &Provider;
}

// ─────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────

/// Parameters of `auth:start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStartParams {
    /// Provider to authenticate with.
    pub provider: Provider,
    /// Where an OAuth provider should redirect after consent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

impl AuthStartParams {
    /// Parameters with no callback URL.
    #[must_use]
    pub const fn new(provider: Provider) -> Self {
        Self {
            provider,
            callback_url: None,
        }
    }
}

/// Result of `auth:start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStartData {
    /// OAuth consent URL. Absent for token-prompt providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    /// Token issued directly by the adapter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Token expiry as a Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthStartData {
    /// True when the adapter started a browser OAuth flow.
    #[must_use]
    pub fn is_oauth(&self) -> bool {
        self.auth_url.is_some()
    }
}

/// Parameters of `auth:refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRefreshParams {
    /// Provider that issued the refresh token.
    pub provider: Provider,
    /// Refresh token to exchange.
    pub refresh_token: String,
}

/// Result of `auth:refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRefreshData {
    /// New access token.
    pub token: String,
    /// Expiry as a Unix timestamp.
    pub expires_at: i64,
}

// ─────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────

/// Parameters of `fetch:config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfigParams {
    /// Provider to read from.
    pub provider: Provider,
    /// Bearer token from the credential store.
    pub token: String,
    /// Project to read. Adapters answer `INVALID_PARAMS` when it is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// One environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// Deployment targets (`production`, `preview`, ...).
    #[serde(default)]
    pub target: Vec<String>,
}

/// Provider project summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Provider project id.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Primary domain.
    pub domain: String,
    /// Detected framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Build settings of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build command.
    pub command: String,
    /// Output directory.
    pub output_dir: String,
    /// Install command, if overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
}

/// Result of `fetch:config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfigData {
    /// Project summary.
    pub project: Project,
    /// Build settings.
    pub build: BuildConfig,
    /// Environment variables.
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

// ─────────────────────────────────────────────────────────────
// Environment sync
// ─────────────────────────────────────────────────────────────

/// Parameters of `sync:env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvParams {
    /// Provider to write to.
    pub provider: Provider,
    /// Bearer token.
    pub token: String,
    /// Target project.
    pub project_id: String,
    /// Variables to push.
    pub env_vars: Vec<EnvVar>,
}

/// Result of `sync:env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvData {
    /// Number of variables written.
    pub synced: u32,
    /// Keys that could not be written.
    #[serde(default)]
    pub failed: Vec<String>,
}

// ─────────────────────────────────────────────────────────────
// Preview deployments
// ─────────────────────────────────────────────────────────────

/// Parameters of `deploy:preview`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPreviewParams {
    /// Provider to deploy to.
    pub provider: Provider,
    /// Bearer token.
    pub token: String,
    /// Project to deploy.
    pub project_id: String,
    /// Git branch to deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Extra environment for this deployment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

/// Result of `deploy:preview`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPreviewData {
    /// Provider deployment id.
    pub deployment_id: String,
    /// Preview URL.
    pub url: String,
    /// Provider-reported status.
    pub status: String,
    /// Build duration in seconds, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_time: Option<u64>,
}

// ─────────────────────────────────────────────────────────────
// DNS
// ─────────────────────────────────────────────────────────────

/// Parameters of `dns:update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsUpdateParams {
    /// Provider hosting the zone.
    pub provider: Provider,
    /// Bearer token.
    pub token: String,
    /// Zone apex.
    pub domain: String,
    /// Record type (`A`, `CNAME`, ...).
    pub record_type: String,
    /// Record name within the zone.
    pub record_name: String,
    /// New record value.
    pub record_value: String,
    /// TTL in seconds; provider default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Result of `dns:update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsUpdateData {
    /// Provider record id, needed for rollback.
    pub record_id: String,
    /// Value before the update, absent for new records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<String>,
    /// Provider's propagation estimate in seconds.
    pub propagation_time: u32,
}

/// Parameters of `dns:rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRollbackParams {
    /// Provider hosting the zone.
    pub provider: Provider,
    /// Bearer token.
    pub token: String,
    /// Record to restore.
    pub record_id: String,
    /// Value to restore.
    pub rollback_to: String,
}

/// Result of `dns:rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRollbackData {
    /// Whether the record was restored.
    pub restored: bool,
    /// Record value after the rollback.
    pub current_value: String,
}

macro_rules! verb_call {
    ($params:ty => $output:ty, $verb:expr) => {
        impl VerbCall for $params {
            const VERB: Verb = $verb;
            type Output = $output;

            fn provider(&self) -> &Provider {
                &self.provider
            }
        }
    };
}

verb_call!(AuthStartParams => AuthStartData, Verb::AuthStart);
verb_call!(AuthRefreshParams => AuthRefreshData, Verb::AuthRefresh);
verb_call!(FetchConfigParams => FetchConfigData, Verb::FetchConfig);
verb_call!(SyncEnvParams => SyncEnvData, Verb::SyncEnv);
verb_call!(DeployPreviewParams => DeployPreviewData, Verb::DeployPreview);
verb_call!(DnsUpdateParams => DnsUpdateData, Verb::DnsUpdate);
verb_call!(DnsRollbackParams => DnsRollbackData, Verb::DnsRollback);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_params_are_omitted() {
        let params = FetchConfigParams {
            provider: Provider::Vercel,
            token: "tok".into(),
            project_id: None,
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"provider": "vercel", "token": "tok"})
        );
    }

    #[test]
    fn auth_start_presence_distinguishes_flows() {
        let oauth: AuthStartData =
            serde_json::from_value(json!({"auth_url": "https://example.com/oauth"})).unwrap();
        assert!(oauth.is_oauth());

        let prompt: AuthStartData = serde_json::from_value(json!({})).unwrap();
        assert!(!prompt.is_oauth());
        assert_eq!(prompt, AuthStartData::default());
    }

    #[test]
    fn fetch_config_env_defaults_to_empty() {
        let data: FetchConfigData = serde_json::from_value(json!({
            "project": {"id": "prj_1", "name": "site", "domain": "site.dev"},
            "build": {"command": "npm run build", "output_dir": "dist"}
        }))
        .unwrap();
        assert!(data.env.is_empty());
        assert_eq!(data.project.framework, None);
    }

    #[test]
    fn dns_update_previous_value_absent_for_new_record() {
        let data: DnsUpdateData =
            serde_json::from_value(json!({"record_id": "rec_1", "propagation_time": 60})).unwrap();
        assert_eq!(data.previous_value, None);
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"record_id": "rec_1", "propagation_time": 60})
        );
    }

    #[test]
    fn verb_call_bindings() {
        assert_eq!(<SyncEnvParams as VerbCall>::VERB, Verb::SyncEnv);
        assert_eq!(<DnsRollbackParams as VerbCall>::VERB, Verb::DnsRollback);
        let params = AuthRefreshParams {
            provider: Provider::Render,
            refresh_token: "r".into(),
        };
        assert_eq!(params.provider(), &Provider::Render);
    }
}
