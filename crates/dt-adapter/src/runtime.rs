//! Process entry point for adapters.
//!
//! `argv[1]` is the verb, stdin carries the params, stdout receives exactly
//! one envelope line. Logs go to stderr so stdout stays parseable. The exit
//! code is 0 whenever an envelope was written, including `ok: false`.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use serde_json::Value;
use tracing::{debug, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dt_proto::{BridgeError, CapabilitiesData, Request, Response, Verb, VerbParams};

use crate::handler::Handler;

/// Default log directive when `RUST_LOG` is unset.
const DEFAULT_LOG_DIRECTIVE: &str = "dt_adapter=info";

/// Answer one request.
///
/// Never fails: every problem becomes an `ok: false` envelope, and every
/// envelope carries the handler's `adapter_version`.
///
/// - unknown verb name: `INVALID_PARAMS`
/// - verb not in `supported_verbs`: `UNSUPPORTED`
/// - stdin that does not decode into the verb's record: `INVALID_PARAMS`
pub async fn dispatch<H: Handler>(handler: &H, verb: &str, stdin: &[u8]) -> Response {
    let capabilities = handler.capabilities();
    let version = capabilities.adapter_version.clone();

    let result = respond(handler, &capabilities, verb, stdin).await;

    match result {
        Ok(data) => Response::success(version, data),
        Err(err) => {
            debug!(verb, code = %err.code, message = %err.message, "verb failed");
            Response::failure(version, err)
        }
    }
}

async fn respond<H: Handler>(
    handler: &H,
    capabilities: &CapabilitiesData,
    verb: &str,
    stdin: &[u8],
) -> Result<Value, BridgeError> {
    let parsed: Verb = verb.parse().map_err(|_| BridgeError::unknown_verb(verb))?;
    if !capabilities.supports(parsed) {
        return Err(BridgeError::unsupported(parsed));
    }
    let request = Request::from_process_input(verb, stdin)
        .map_err(|e| BridgeError::invalid_params(parsed, e))?;
    let params = VerbParams::decode(parsed, request.params)
        .map_err(|e| BridgeError::invalid_params(parsed, e))?;
    handler.handle(params).await
}

/// Write `response` as one newline-terminated JSON line.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_response<W: Write>(response: &Response, mut out: W) -> io::Result<()> {
    let line = serde_json::to_string(response).map_err(io::Error::other)?;
    writeln!(out, "{line}")?;
    out.flush()
}

/// Run `handler` against the real process arguments and stdio.
///
/// Call this from an adapter's `main`. Returns failure only when no envelope
/// could be written.
pub fn run<H: Handler>(handler: H) -> ExitCode {
    init_tracing();

    let verb = std::env::args().nth(1).unwrap_or_default();
    let mut stdin = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut stdin) {
        warn!(error = %e, "failed to read stdin, continuing without params");
        stdin.clear();
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let response = runtime.block_on(dispatch(&handler, &verb, &stdin));
    match write_response(&response, io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "failed to write response");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterResult, ProviderAdapter, Typed};
    use dt_proto::{
        AuthType, BuildConfig, ErrorCode, Features, FetchConfigData, FetchConfigParams, Project,
    };
    use serde_json::json;

    struct Fixture;

    impl ProviderAdapter for Fixture {
        fn capabilities(&self) -> CapabilitiesData {
            CapabilitiesData {
                adapter_name: "fixture".into(),
                adapter_version: "9.9.9".into(),
                supported_verbs: vec![Verb::Capabilities, Verb::FetchConfig],
                auth_type: AuthType::ApiKey,
                features: Features::default(),
            }
        }

        async fn fetch_config(&self, params: FetchConfigParams) -> AdapterResult<FetchConfigData> {
            Ok(FetchConfigData {
                project: Project {
                    id: params.project_id.unwrap_or_else(|| "default".into()),
                    name: "site".into(),
                    domain: "site.example".into(),
                    framework: None,
                },
                build: BuildConfig {
                    command: "make".into(),
                    output_dir: "out".into(),
                    install_command: None,
                },
                env: vec![],
            })
        }
    }

    fn error_code(response: &Response) -> ErrorCode {
        response.error.as_ref().map(|e| e.code).unwrap()
    }

    #[tokio::test]
    async fn unknown_verb_is_invalid_params() {
        let response = dispatch(&Typed(Fixture), "tunnel:create", b"").await;
        assert!(!response.ok);
        assert_eq!(error_code(&response), ErrorCode::InvalidParams);
        assert_eq!(response.adapter_version, "9.9.9");
        response.validate().unwrap();
    }

    #[tokio::test]
    async fn unlisted_verb_is_unsupported() {
        let response = dispatch(&Typed(Fixture), "dns:update", b"{}").await;
        assert_eq!(error_code(&response), ErrorCode::Unsupported);
        assert!(!response.error.unwrap().recoverable);
    }

    #[tokio::test]
    async fn undecodable_params_are_invalid_params() {
        let response = dispatch(&Typed(Fixture), "fetch:config", br#"{"provider":"vercel"}"#).await;
        assert_eq!(error_code(&response), ErrorCode::InvalidParams);

        let response = dispatch(&Typed(Fixture), "fetch:config", b"{not json").await;
        assert_eq!(error_code(&response), ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn empty_stdin_means_no_params() {
        let response = dispatch(&Typed(Fixture), "capabilities", b"  \n").await;
        assert!(response.ok);
        assert_eq!(response.data.unwrap()["adapter_name"], "fixture");
    }

    #[tokio::test]
    async fn supported_verb_succeeds() {
        let stdin = json!({"provider": "vercel", "token": "t", "project_id": "prj_7"}).to_string();
        let response = dispatch(&Typed(Fixture), "fetch:config", stdin.as_bytes()).await;
        assert!(response.ok, "{response:?}");
        assert_eq!(response.data.unwrap()["project"]["id"], "prj_7");
    }

    #[test]
    fn response_is_a_single_line() {
        let mut out = Vec::new();
        write_response(&Response::success("1", json!({"a": {"b": 1}})), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
    }
}
