//! Generation runs: one CLI process per request, reported as an ordered
//! stream of progress events.
//!
//! A run ends in exactly one of three ways:
//! - the process could not be started: a single `error` event
//! - the process exited: `complete` as the last event
//! - the receiving side went away: the process is killed and the stream ends

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use events::{progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
use futures::Stream;
use tischiron_core::GenerationRequest;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::{MarkerClassifier, ProgressClassifier};
use crate::command::{CliCommand, CliConfig};
use crate::error::{OrchestratorError, Result};

/// How long output is still read after the CLI has exited. Descendants that
/// inherited the pipes can hold them open far longer.
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Tolerance between the wall clock and file timestamps when deciding
/// whether the artifact was written by this run.
const ARTIFACT_CLOCK_SLACK: Duration = Duration::from_secs(1);

/// Captured result of a one-shot CLI call such as `init` or `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Launches CLI processes and owns their lifetime.
///
/// Cheap to clone. Every run gets its own channel and a child of the
/// orchestrator's shutdown token.
#[derive(Clone)]
pub struct Orchestrator {
    cli: Arc<CliConfig>,
    classifier: Arc<dyn ProgressClassifier>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("cli", &self.cli)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(cli: CliConfig) -> Self {
        Self::with_classifier(cli, Arc::new(MarkerClassifier::new()))
    }

    pub fn with_classifier(cli: CliConfig, classifier: Arc<dyn ProgressClassifier>) -> Self {
        Self {
            cli: Arc::new(cli),
            classifier,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn cli(&self) -> &CliConfig {
        &self.cli
    }

    /// Kill every running generation. Streams end without a terminal event.
    pub fn shutdown(&self) {
        info!("Cancelling all generation runs");
        self.shutdown.cancel();
    }

    /// Start `tischiron gen` for `request` in the background.
    ///
    /// Must be called from within a tokio runtime. The request is expected
    /// to be validated already.
    pub fn start(&self, request: GenerationRequest) -> GenerationStream {
        let id = Uuid::new_v4();
        let token = self.shutdown.child_token();
        let (tx, rx) = progress_channel();

        let run = GenerationRun {
            cli: Arc::clone(&self.cli),
            classifier: Arc::clone(&self.classifier),
            request,
            tx,
            token: token.clone(),
        };

        let span = info_span!("generation", generation_id = %id);
        tokio::spawn(run.drive().instrument(span));

        GenerationStream {
            id,
            events: rx,
            cancel: token.clone(),
            _guard: token.drop_guard(),
        }
    }

    /// Run a short CLI command to completion and capture its output.
    pub async fn run_once(&self, command: &CliCommand) -> Result<CliOutput> {
        info!(command = command.name(), "Running CLI");

        let output = self
            .cli
            .command(command)
            .output()
            .await
            .map_err(|e| OrchestratorError::spawn(&self.cli.program, e))?;

        let exit_code = output.status.code();
        debug!(command = command.name(), exit_code = ?exit_code, "CLI finished");

        Ok(CliOutput {
            success: output.status.success(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Receiving side of one generation run.
///
/// Dropping it cancels the run and kills the process if still alive.
pub struct GenerationStream {
    id: Uuid,
    events: ProgressReceiver,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl GenerationStream {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Stop the run. Does nothing once the run has finished.
    pub fn cancel(&mut self) {
        self.events.close();
        self.cancel.cancel();
    }
}

impl Stream for GenerationStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

struct GenerationRun {
    cli: Arc<CliConfig>,
    classifier: Arc<dyn ProgressClassifier>,
    request: GenerationRequest,
    tx: ProgressSender,
    token: CancellationToken,
}

impl GenerationRun {
    async fn drive(self) {
        let artifact = self.cli.locate(self.request.artifact_path());
        let command = CliCommand::Gen(self.request.clone());
        let started = SystemTime::now();

        let (child, stdout, stderr) = match self.spawn(&command) {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!(error = %e, "Generation could not start");
                self.tx.send(ProgressEvent::error(e.to_string())).await;
                return;
            }
        };

        info!(
            pid = ?child.id(),
            project = %self.request.project_id,
            function = %self.request.target_function,
            "Generation started"
        );

        self.follow(child, stdout, stderr, artifact, started).await;
    }

    fn spawn(&self, command: &CliCommand) -> Result<(Child, ChildStdout, ChildStderr)> {
        let mut child = self
            .cli
            .command(command)
            .spawn()
            .map_err(|e| OrchestratorError::spawn(&self.cli.program, e))?;

        // kill_on_drop reaps the child if a pipe is missing
        let stdout = child
            .stdout
            .take()
            .ok_or(OrchestratorError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(OrchestratorError::MissingPipe("stderr"))?;

        Ok((child, stdout, stderr))
    }

    async fn follow(
        &self,
        mut child: Child,
        stdout: ChildStdout,
        stderr: ChildStderr,
        artifact: PathBuf,
        started: SystemTime,
    ) {
        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut exited = false;
        let mut exit_code = None;

        // Armed once the process has exited
        let drain = tokio::time::sleep(PIPE_DRAIN_TIMEOUT);
        tokio::pin!(drain);

        while !exited || stdout_open || stderr_open {
            let event = tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.abort(child, "cancelled").await,
                _ = self.tx.closed() => return self.abort(child, "receiver closed").await,
                segment = stdout.next_segment(), if stdout_open => match decode(segment) {
                    Some(line) => self.classifier.classify(&line),
                    None => {
                        stdout_open = false;
                        None
                    }
                },
                // stderr bypasses the classifier, blank lines included
                segment = stderr.next_segment(), if stderr_open => match decode(segment) {
                    Some(line) => Some(ProgressEvent::stderr(line)),
                    None => {
                        stderr_open = false;
                        None
                    }
                },
                status = child.wait(), if !exited => {
                    exited = true;
                    exit_code = match status {
                        Ok(status) => status.code(),
                        Err(e) => {
                            warn!("Failed to wait for CLI process: {}", e);
                            None
                        }
                    };
                    drain
                        .as_mut()
                        .reset(tokio::time::Instant::now() + PIPE_DRAIN_TIMEOUT);
                    None
                },
                _ = &mut drain, if exited => {
                    debug!("CLI exited but its output is still held open, not waiting further");
                    break;
                },
            };

            if let Some(event) = event {
                if !self.emit(event).await {
                    return self.abort(child, "receiver closed").await;
                }
            }
        }

        let artifact_text = read_artifact(&artifact, started).await;
        info!(
            exit_code = ?exit_code,
            artifact_bytes = artifact_text.len(),
            events = self.tx.event_count(),
            "Generation finished"
        );

        self.emit(ProgressEvent::complete(exit_code, artifact_text))
            .await;
    }

    /// Deliver an event unless the run has been cancelled meanwhile.
    async fn emit(&self, event: ProgressEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            delivered = self.tx.send(event) => delivered,
        }
    }

    async fn abort(&self, mut child: Child, reason: &str) {
        info!(reason, pid = ?child.id(), "Stopping generation");
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        if let Err(e) = child.kill().await {
            warn!("Failed to kill CLI process: {}", e);
        }
    }
}

/// One output line without its terminator, or `None` at end of stream.
fn decode(segment: std::io::Result<Option<Vec<u8>>>) -> Option<String> {
    match segment {
        Ok(Some(bytes)) => {
            let text = String::from_utf8_lossy(&bytes);
            Some(text.trim_end_matches('\r').to_string())
        }
        Ok(None) => None,
        Err(e) => {
            debug!("CLI output stream failed: {}", e);
            None
        }
    }
}

/// Contents of the artifact if this run wrote it, otherwise empty.
///
/// A file left over from an earlier run, or one the CLI never touched, is
/// not reported.
async fn read_artifact(path: &Path, started: SystemTime) -> String {
    let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            debug!(path = %path.display(), "No artifact: {}", e);
            return String::new();
        }
    };

    if modified + ARTIFACT_CLOCK_SLACK < started {
        warn!(path = %path.display(), "Ignoring artifact not written by this run");
        return String::new();
    }

    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %path.display(), "No artifact: {}", e);
            String::new()
        }
    }
}
