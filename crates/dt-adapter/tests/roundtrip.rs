//! End-to-end tests driving the reference adapter binaries through the
//! controller-side engine.

#![cfg(unix)]

use std::os::unix::fs::symlink;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use test_case::test_case;

use dt_bridge::{BridgeClient, BridgeConfig, CallError, Engine, Launcher};
use dt_proto::{
    DeployPreviewParams, DnsUpdateParams, ErrorCode, FetchConfigParams, Provider, Response, Verb,
};

const ECHO: &str = env!("CARGO_BIN_EXE_dt-echo-adapter");
const STATIC: &str = env!("CARGO_BIN_EXE_dt-static-adapter");

/// Adapters root where every listed provider points at `binary`.
fn adapters_root(binary: &str, providers: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for provider in providers {
        let provider_dir = dir.path().join(provider);
        std::fs::create_dir_all(&provider_dir).unwrap();
        symlink(binary, provider_dir.join("adapter")).unwrap();
    }
    dir
}

fn config(root: &TempDir) -> BridgeConfig {
    BridgeConfig::new(root.path())
        .with_entry_point("adapter")
        .with_launcher(Launcher::Direct)
        .with_timeout(Duration::from_secs(10))
}

fn sample_params(verb: Verb) -> Option<Value> {
    let params = match verb {
        Verb::Capabilities => return None,
        Verb::AuthStart => json!({"provider": "vercel", "callback_url": "http://localhost:7777/cb"}),
        Verb::AuthRefresh => json!({"provider": "vercel", "refresh_token": "rt_abc"}),
        Verb::FetchConfig => json!({"provider": "vercel", "token": "tok", "project_id": "prj_1"}),
        Verb::SyncEnv => json!({
            "provider": "vercel",
            "token": "tok",
            "project_id": "prj_1",
            "env_vars": [{"key": "API_URL", "value": "https://api.example.com", "target": ["preview"]}]
        }),
        Verb::DeployPreview => json!({
            "provider": "vercel",
            "token": "tok",
            "project_id": "prj_1",
            "branch": "feature/x",
            "env": {"DEBUG": "1"}
        }),
        Verb::DnsUpdate => json!({
            "provider": "vercel",
            "token": "tok",
            "domain": "example.com",
            "record_type": "A",
            "record_name": "@",
            "record_value": "76.76.21.21",
            "ttl": 60
        }),
        Verb::DnsRollback => json!({
            "provider": "vercel",
            "token": "tok",
            "record_id": "rec_1",
            "rollback_to": "1.1.1.1"
        }),
    };
    Some(params)
}

// ============================================================================
// Echo round trip
// ============================================================================

#[test_case(Verb::Capabilities ; "capabilities")]
#[test_case(Verb::AuthStart ; "auth start")]
#[test_case(Verb::AuthRefresh ; "auth refresh")]
#[test_case(Verb::FetchConfig ; "fetch config")]
#[test_case(Verb::SyncEnv ; "sync env")]
#[test_case(Verb::DeployPreview ; "deploy preview")]
#[test_case(Verb::DnsUpdate ; "dns update")]
#[test_case(Verb::DnsRollback ; "dns rollback")]
#[tokio::test]
async fn echo_reproduces_verb_and_params(verb: Verb) {
    let root = adapters_root(ECHO, &["vercel"]);
    let engine = Engine::new(config(&root)).unwrap();
    let params = sample_params(verb);

    let response = engine
        .execute(&Provider::Vercel, verb, params.clone())
        .await
        .unwrap();

    assert_eq!(response.adapter_version, env!("CARGO_PKG_VERSION"));
    let data = response.data.unwrap();
    assert_eq!(data["verb"], verb.as_str());
    assert_eq!(data["params"], params.unwrap_or(Value::Null));
}

#[tokio::test]
async fn echo_rejects_params_that_do_not_decode() {
    let root = adapters_root(ECHO, &["vercel"]);
    let engine = Engine::new(config(&root)).unwrap();

    let err = engine
        .execute(
            &Provider::Vercel,
            Verb::DnsUpdate,
            Some(json!({"provider": "vercel", "token": "tok"})),
        )
        .await
        .unwrap_err();

    let bridge_err = err.bridge_error().unwrap();
    assert_eq!(bridge_err.code, ErrorCode::InvalidParams);
    assert!(bridge_err.message.contains("dns:update"));
}

// ============================================================================
// Static adapter through the typed façade
// ============================================================================

#[tokio::test]
async fn static_capabilities_are_idempotent() {
    let root = adapters_root(STATIC, &["netlify"]);
    let client = BridgeClient::from_config(config(&root)).unwrap();

    let first = client.capabilities(&Provider::Netlify).await.unwrap();
    let second = client.capabilities(&Provider::Netlify).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.adapter_name, "static");
    assert!(Verb::ALL.iter().all(|verb| first.supports(*verb)));
}

#[tokio::test]
async fn static_typed_verbs_decode() {
    let root = adapters_root(STATIC, &["cloudflare"]);
    let client = BridgeClient::from_config(config(&root)).unwrap();

    let config = client
        .fetch_config(&FetchConfigParams {
            provider: Provider::Cloudflare,
            token: "tok".into(),
            project_id: Some("blog".into()),
        })
        .await
        .unwrap();
    assert_eq!(config.project.domain, "blog.cloudflare.example");
    assert_eq!(config.build.output_dir, ".next");

    let preview = client
        .deploy_preview(&DeployPreviewParams {
            provider: Provider::Cloudflare,
            token: "tok".into(),
            project_id: "blog".into(),
            branch: Some("feature/Dark-Mode".into()),
            env: None,
        })
        .await
        .unwrap();
    assert_eq!(preview.deployment_id, "dpl_blog_feature-dark-mode");
    assert_eq!(preview.status, "READY");

    let record = client
        .dns_update(&DnsUpdateParams {
            provider: Provider::Cloudflare,
            token: "tok".into(),
            domain: "example.com".into(),
            record_type: "CNAME".into(),
            record_name: "www".into(),
            record_value: "blog.pages.dev".into(),
            ttl: None,
        })
        .await
        .unwrap();
    assert_eq!(record.record_id, "rec_www-example-com");
    assert_eq!(record.propagation_time, 300);
}

#[tokio::test]
async fn static_rejected_token_is_auth_failed() {
    let root = adapters_root(STATIC, &["vercel"]);
    let client = BridgeClient::from_config(config(&root)).unwrap();

    let err = client
        .fetch_config(&FetchConfigParams {
            provider: Provider::Vercel,
            token: "invalid".into(),
            project_id: Some("prj".into()),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CallError::Failed(ref e) if e.code == ErrorCode::AuthFailed));
}

// ============================================================================
// Binary contract
// ============================================================================

#[test]
fn unknown_verb_answers_invalid_params_with_exit_zero() {
    let output = Command::new(STATIC)
        .arg("tunnel:create")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("INVALID_PARAMS"))
        .get_output()
        .stdout
        .clone();

    let response: Response = serde_json::from_slice(&output).unwrap();
    assert!(!response.ok);
    response.validate().unwrap();
}

#[test]
fn missing_verb_argument_answers_invalid_params() {
    Command::new(ECHO)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""ok":false"#))
        .stdout(predicate::str::contains("INVALID_PARAMS"));
}

#[test]
fn logs_stay_off_stdout() {
    let assert = Command::new(STATIC)
        .arg("capabilities")
        .env("RUST_LOG", "debug")
        .write_stdin("")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let response: Response = serde_json::from_str(&stdout).unwrap();
    assert!(response.ok);
}
