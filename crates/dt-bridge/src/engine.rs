//! Adapter process execution.
//!
//! One call is one child process: resolve the entry point, spawn it with the
//! verb as an argument, pipe the params to stdin, collect stdout and stderr
//! until the adapter exits or the deadline passes, parse exactly one response
//! envelope. Nothing is pooled or retried here.
//!
//! On Unix the adapter leads its own process group. Whatever is left in that
//! group when the call ends (timeout, cancellation or a background process
//! the adapter started) is killed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use dt_proto::{BridgeError, ErrorCode, Provider, Request, Response, Verb};

use crate::config::{BridgeConfig, Launcher};
use crate::error::{CallError, CallResult, ConfigError};

/// Upper bound on raw output quoted in a malformed-response error.
pub const MAX_OUTPUT_PREVIEW: usize = 512;

/// Upper bound on crash stderr shown in an error message. The full stderr
/// stays in [`CallError::Crashed`].
pub const MAX_STDERR_DISPLAY: usize = 1024;

/// How long to keep reading once the adapter has exited, for output still
/// held open by a process it left behind.
pub const EXIT_DRAIN: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 8192;

/// Spawns adapters and turns their output into envelopes.
///
/// Cheap to clone and safe to share between tasks: every call owns its own
/// child process and buffers, the configuration is read-only.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<BridgeConfig>,
}

impl Engine {
    /// Build an engine from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Resolve the entry point for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::AdapterNotFound`] if no file exists at the path.
    /// Returns [`CallError::OutsideRoot`] if the path would leave the
    /// adapters root.
    pub fn resolve(&self, provider: &Provider) -> CallResult<PathBuf> {
        let path = self.config.adapter_path(provider);
        if !self.config.is_inside_root(&path) {
            return Err(CallError::OutsideRoot {
                provider: provider.clone(),
                path,
            });
        }
        if path.is_file() {
            Ok(path)
        } else {
            Err(CallError::AdapterNotFound {
                provider: provider.clone(),
                path,
            })
        }
    }

    /// Run a verb given by name, returning the parsed verb with the envelope.
    /// Unknown names fail before anything is spawned.
    ///
    /// # Errors
    ///
    /// See [`Engine::execute`]; additionally [`CallError::UnknownVerb`].
    pub async fn execute_named(
        &self,
        provider: &Provider,
        verb: &str,
        params: Option<Value>,
    ) -> CallResult<(Verb, Response)> {
        let verb: Verb = verb
            .parse()
            .map_err(|_| CallError::UnknownVerb(verb.to_string()))?;
        let response = self.execute(provider, verb, params).await?;
        Ok((verb, response))
    }

    /// Run one verb against `provider`'s adapter.
    ///
    /// Returns the envelope when the adapter answered `ok: true`.
    ///
    /// # Errors
    ///
    /// - [`CallError::AdapterNotFound`] or [`CallError::OutsideRoot`] before spawning
    /// - [`CallError::Spawn`] if the process cannot start
    /// - [`CallError::Timeout`] if the deadline elapses (process group killed,
    ///   child reaped)
    /// - [`CallError::Crashed`] on unsuccessful exit without an envelope
    /// - [`CallError::MalformedResponse`] if stdout is not a valid envelope
    /// - [`CallError::Failed`] carrying the adapter's error on `ok: false`
    pub async fn execute(
        &self,
        provider: &Provider,
        verb: Verb,
        params: Option<Value>,
    ) -> CallResult<Response> {
        let entry = self.resolve(provider)?;
        let stdin_bytes = Request::new(verb, params)
            .stdin_payload()
            .map_err(CallError::Encode)?;

        let mut command = self.command(&entry, verb);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let deadline = started + self.config.timeout;

        let mut child = command.spawn().map_err(|source| CallError::Spawn {
            provider: provider.clone(),
            source,
        })?;
        let mut group = ProcessGroup::new(child.id());
        debug!(
            provider = %provider,
            verb = %verb,
            pid = ?child.id(),
            entry = %entry.display(),
            "spawned adapter"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        // stdin is written from its own task so an adapter that never reads
        // cannot stall the deadline; dropping the handle closes the pipe.
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                if !stdin_bytes.is_empty() {
                    if let Err(e) = stdin.write_all(&stdin_bytes).await {
                        trace!(error = %e, "adapter closed stdin early");
                    }
                }
                let _ = stdin.shutdown().await;
            }
        });
        let mut capture = Capture::new(stdout, stderr);

        let exited = tokio::time::timeout_at(deadline, wait_for_exit(&mut child, &mut capture)).await;
        writer.abort();
        let status = match exited {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    provider = %provider,
                    verb = %verb,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "adapter deadline elapsed, killing"
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill adapter");
                }
                return Err(CallError::Timeout {
                    provider: provider.clone(),
                    verb,
                    timeout: self.config.timeout,
                });
            }
        };

        // The adapter is gone; a descendant may still hold the pipes open.
        capture.drain().await;
        group.kill();

        debug!(
            provider = %provider,
            verb = %verb,
            status = %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = capture.out.len(),
            "adapter exited"
        );
        if !capture.err.is_empty() {
            trace!(stderr = %String::from_utf8_lossy(&capture.err), "adapter stderr");
        }

        interpret(provider, verb, status, &capture.out, &capture.err)
    }

    fn command(&self, entry: &Path, verb: Verb) -> Command {
        let mut command = match &self.config.launcher {
            Launcher::Direct => Command::new(entry),
            Launcher::Runtime { program, args } => {
                let mut command = Command::new(program);
                command.args(args).arg(entry);
                command
            }
        };
        command.arg(verb.as_str());
        command
    }
}

fn missing_pipe(name: &str) -> CallError {
    CallError::Io(io::Error::other(format!("missing child {name} pipe")))
}

/// The adapter's process group. Killed at most once, and on drop if the call
/// is abandoned.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => trace!(pgid, "killed adapter process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "failed to kill adapter process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// stdout and stderr read so far, plus the pipes still open.
struct Capture {
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    out: Vec<u8>,
    err: Vec<u8>,
}

impl Capture {
    fn new(stdout: ChildStdout, stderr: ChildStderr) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: Some(stderr),
            out: Vec::new(),
            err: Vec::new(),
        }
    }

    fn is_closed(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    /// Complete one read on whichever open pipe is ready first.
    async fn pump(&mut self) {
        let mut out_chunk = [0u8; READ_CHUNK];
        let mut err_chunk = [0u8; READ_CHUNK];
        tokio::select! {
            read = read_some(&mut self.stdout, &mut out_chunk) => {
                absorb("stdout", read, &out_chunk, &mut self.out, &mut self.stdout);
            }
            read = read_some(&mut self.stderr, &mut err_chunk) => {
                absorb("stderr", read, &err_chunk, &mut self.err, &mut self.stderr);
            }
        }
    }

    /// Read what is left after the adapter exited, for at most [`EXIT_DRAIN`].
    async fn drain(&mut self) {
        let drained = tokio::time::timeout(EXIT_DRAIN, async {
            while !self.is_closed() {
                self.pump().await;
            }
        })
        .await;
        if drained.is_err() {
            debug!("adapter output still open after exit, a child process holds it");
        }
    }
}

/// Read output until the adapter process exits. Does not wait for EOF.
async fn wait_for_exit(child: &mut Child, capture: &mut Capture) -> io::Result<ExitStatus> {
    loop {
        if capture.is_closed() {
            return child.wait().await;
        }
        tokio::select! {
            status = child.wait() => return status,
            () = capture.pump() => {}
        }
    }
}

/// One read from `pipe`; never completes for a closed pipe.
async fn read_some<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

fn absorb<R>(
    name: &str,
    read: io::Result<usize>,
    chunk: &[u8],
    buf: &mut Vec<u8>,
    pipe: &mut Option<R>,
) {
    match read {
        Ok(0) => *pipe = None,
        Ok(n) => buf.extend_from_slice(&chunk[..n]),
        Err(e) => {
            warn!(pipe = name, error = %e, "failed to read adapter output");
            *pipe = None;
        }
    }
}

/// Turn a finished process into an envelope or an error.
fn interpret(
    provider: &Provider,
    verb: Verb,
    status: ExitStatus,
    stdout: &[u8],
    stderr: &[u8],
) -> CallResult<Response> {
    let response = match parse_envelope(stdout) {
        Ok(response) => response,
        Err(reason) if !status.success() => {
            warn!(provider = %provider, verb = %verb, status = %status, %reason, "adapter crashed");
            return Err(CallError::Crashed {
                provider: provider.clone(),
                verb,
                exit_code: status.code(),
                stderr: String::from_utf8_lossy(stderr).into_owned(),
            });
        }
        Err(reason) => {
            return Err(CallError::MalformedResponse {
                provider: provider.clone(),
                verb,
                reason,
                output: preview(stdout, MAX_OUTPUT_PREVIEW),
            });
        }
    };

    if !status.success() {
        debug!(status = %status, "adapter exited unsuccessfully after writing an envelope");
    }

    if response.ok {
        return Ok(response);
    }
    let err = response.error.unwrap_or_else(|| {
        BridgeError::new(ErrorCode::Unknown, "adapter reported failure without an error")
    });
    debug!(provider = %provider, verb = %verb, code = %err.code, "adapter reported failure");
    Err(CallError::Failed(err))
}

/// Parse stdout as exactly one valid response envelope.
fn parse_envelope(stdout: &[u8]) -> Result<Response, String> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err("adapter produced no output".to_string());
    }
    let response: Response =
        serde_json::from_slice(stdout).map_err(|e| format!("invalid envelope: {e}"))?;
    response.validate().map_err(|e| e.to_string())?;
    Ok(response)
}

/// Lossy UTF-8 prefix of at most `limit` bytes, cut on a character boundary.
pub(crate) fn preview(bytes: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], bytes.len())
}
