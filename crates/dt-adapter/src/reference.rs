//! Reference adapters.
//!
//! Both support every verb and never talk to a real provider. They back the
//! `dt-echo-adapter` and `dt-static-adapter` binaries used by tests and
//! demos.

use serde_json::{Value, json};

use dt_proto::{
    AuthRefreshData, AuthRefreshParams, AuthStartData, AuthStartParams, AuthType, BridgeError,
    BuildConfig, CapabilitiesData, DeployPreviewData, DeployPreviewParams, DnsRollbackData,
    DnsRollbackParams, DnsUpdateData, DnsUpdateParams, EnvVar, ErrorCode, Features,
    FetchConfigData, FetchConfigParams, Project, SyncEnvData, SyncEnvParams, Verb, VerbParams,
};

use crate::adapter::{AdapterResult, ProviderAdapter};
use crate::handler::Handler;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Token the static adapter rejects with `AUTH_FAILED`.
pub const REJECTED_TOKEN: &str = "invalid";

/// Token the static adapter throttles with `RATE_LIMITED`.
pub const THROTTLED_TOKEN: &str = "rate-limited";

/// Project id the static adapter reports as `NOT_FOUND`.
pub const MISSING_PROJECT: &str = "missing";

fn all_features() -> Features {
    Features {
        dns_management: true,
        preview_deployments: true,
        env_variables: true,
        build_logs: false,
    }
}

// ─────────────────────────────────────────────────────────────
// Echo
// ─────────────────────────────────────────────────────────────

/// Answers every verb with `{"verb": ..., "params": ...}`.
///
/// Params are decoded into the verb's record first and re-encoded, so the
/// echo also proves the params survived the trip intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAdapter;

impl Handler for EchoAdapter {
    fn capabilities(&self) -> CapabilitiesData {
        CapabilitiesData {
            adapter_name: "echo".into(),
            adapter_version: VERSION.into(),
            supported_verbs: Verb::ALL.to_vec(),
            auth_type: AuthType::Token,
            features: all_features(),
        }
    }

    async fn handle(&self, params: VerbParams) -> Result<Value, BridgeError> {
        let echoed = params
            .to_value()
            .map_err(|e| BridgeError::new(ErrorCode::Unknown, e.to_string()))?;
        Ok(json!({
            "verb": params.verb(),
            "params": echoed,
        }))
    }
}

// ─────────────────────────────────────────────────────────────
// Static
// ─────────────────────────────────────────────────────────────

/// Canned, deterministic data for every verb.
///
/// A few magic inputs produce errors: [`REJECTED_TOKEN`], [`THROTTLED_TOKEN`]
/// and an empty token fail authentication-bearing verbs, [`MISSING_PROJECT`]
/// is not found, and `fetch:config` without a project id is
/// `INVALID_PARAMS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAdapter;

fn check_token(token: &str) -> AdapterResult<()> {
    match token {
        "" => Err(BridgeError::new(ErrorCode::AuthRequired, "no token supplied")),
        REJECTED_TOKEN => Err(BridgeError::new(ErrorCode::AuthFailed, "token rejected")),
        THROTTLED_TOKEN => Err(BridgeError::new(ErrorCode::RateLimited, "too many requests")
            .with_detail("retry_after", 1)),
        _ => Ok(()),
    }
}

fn check_project(project_id: &str) -> AdapterResult<()> {
    if project_id == MISSING_PROJECT {
        return Err(BridgeError::new(
            ErrorCode::NotFound,
            format!("project not found: {project_id}"),
        ));
    }
    Ok(())
}

fn slug(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn valid_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ProviderAdapter for StaticAdapter {
    fn capabilities(&self) -> CapabilitiesData {
        CapabilitiesData {
            adapter_name: "static".into(),
            adapter_version: VERSION.into(),
            supported_verbs: Verb::ALL.to_vec(),
            auth_type: AuthType::Token,
            features: all_features(),
        }
    }

    async fn auth_start(&self, params: AuthStartParams) -> AdapterResult<AuthStartData> {
        Ok(match params.callback_url {
            Some(callback) => AuthStartData {
                auth_url: Some(format!(
                    "https://auth.{}.example/authorize?redirect_uri={callback}",
                    params.provider
                )),
                token: None,
                expires_at: None,
            },
            None => AuthStartData::default(),
        })
    }

    async fn auth_refresh(&self, params: AuthRefreshParams) -> AdapterResult<AuthRefreshData> {
        check_token(&params.refresh_token)?;
        Ok(AuthRefreshData {
            token: format!("static-{}", params.refresh_token),
            expires_at: 1_900_000_000,
        })
    }

    async fn fetch_config(&self, params: FetchConfigParams) -> AdapterResult<FetchConfigData> {
        check_token(&params.token)?;
        let Some(id) = params.project_id else {
            return Err(BridgeError::new(
                ErrorCode::InvalidParams,
                "project_id is required",
            ));
        };
        check_project(&id)?;
        Ok(FetchConfigData {
            project: Project {
                name: format!("{id}-site"),
                domain: format!("{id}.{}.example", params.provider),
                framework: Some("nextjs".into()),
                id,
            },
            build: BuildConfig {
                command: "npm run build".into(),
                output_dir: ".next".into(),
                install_command: Some("npm ci".into()),
            },
            env: vec![EnvVar {
                key: "NODE_ENV".into(),
                value: "production".into(),
                target: vec!["production".into()],
            }],
        })
    }

    async fn sync_env(&self, params: SyncEnvParams) -> AdapterResult<SyncEnvData> {
        check_token(&params.token)?;
        check_project(&params.project_id)?;
        let (ok, failed): (Vec<_>, Vec<_>) = params
            .env_vars
            .into_iter()
            .map(|var| var.key)
            .partition(|key| valid_env_key(key));
        Ok(SyncEnvData {
            synced: u32::try_from(ok.len()).unwrap_or(u32::MAX),
            failed,
        })
    }

    async fn deploy_preview(
        &self,
        params: DeployPreviewParams,
    ) -> AdapterResult<DeployPreviewData> {
        check_token(&params.token)?;
        check_project(&params.project_id)?;
        let branch = slug(params.branch.as_deref().unwrap_or("main"));
        Ok(DeployPreviewData {
            deployment_id: format!("dpl_{}_{branch}", params.project_id),
            url: format!(
                "https://{}-{branch}.{}.example",
                params.project_id, params.provider
            ),
            status: "READY".into(),
            build_time: Some(42),
        })
    }

    async fn dns_update(&self, params: DnsUpdateParams) -> AdapterResult<DnsUpdateData> {
        check_token(&params.token)?;
        Ok(DnsUpdateData {
            record_id: format!(
                "rec_{}",
                slug(&format!("{}.{}", params.record_name, params.domain))
            ),
            previous_value: None,
            propagation_time: params.ttl.unwrap_or(300),
        })
    }

    async fn dns_rollback(&self, params: DnsRollbackParams) -> AdapterResult<DnsRollbackData> {
        check_token(&params.token)?;
        Ok(DnsRollbackData {
            restored: true,
            current_value: params.rollback_to,
        })
    }
}
