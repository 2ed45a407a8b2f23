use sqlgate_core::{GateError, SourceConfig};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Substring the proxy prints once it is safe to connect to.
pub const READY_MARKER: &str = "is ready for new connections!";

/// Substring treated as a fatal startup failure. Matched case-sensitively
/// anywhere in a line, as the proxy's own log format does not tag severity
/// in a structured way.
pub const ERROR_MARKER: &str = "error";

const REAP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    pub binary: PathBuf,
    pub socket_dir: PathBuf,
    pub ready_timeout: Duration,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/opt/resource/cloud-sql-proxy"),
            socket_dir: PathBuf::from("/cloudsql"),
            ready_timeout: Duration::from_secs(5),
        }
    }
}

enum StreamEvent {
    Line(String),
    Failed(std::io::Error),
}

/// Owner of the supervised proxy process. The handle is the only way to
/// signal the child; [`ProxyHandle::shutdown`] must run on every exit path
/// so the socket directory does not leak a bound proxy across invocations.
#[derive(Debug)]
pub struct ProxyHandle {
    child: Child,
    output: Option<mpsc::Receiver<StreamEvent>>,
    ready_timeout: Duration,
    signaled: bool,
}

/// Starts the proxy bound to the option's socket directory, passing the
/// credential payload inline. Does not wait for process exit; stdout and
/// stderr are piped so the readiness loop can scan them.
pub fn launch(source: &SourceConfig, options: &ProxyOptions) -> Result<ProxyHandle, GateError> {
    let mut command = Command::new(&options.binary);
    command
        .arg(&source.host)
        .arg("--unix-socket")
        .arg(&options.socket_dir)
        .arg("--json-credentials")
        .arg(&source.private_key);
    info!(
        "starting proxy {} for instance {}",
        options.binary.display(),
        source.host
    );
    ProxyHandle::spawn(command, options.ready_timeout)
}

fn spawn_reader<R>(stream: R, tx: mpsc::Sender<StreamEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(StreamEvent::Line(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = tx.send(StreamEvent::Failed(err)).await;
                    break;
                }
            }
        }
    });
}

impl ProxyHandle {
    /// Spawns an arbitrary command under supervision. `launch` builds the
    /// real proxy invocation; tests substitute shell stand-ins.
    pub fn spawn(mut command: Command, ready_timeout: Duration) -> Result<Self, GateError> {
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| GateError::Launch(err.to_string()))?;

        // One reader task per stream; both report into a single channel so
        // the readiness loop sees combined output and a clean end-of-stream
        // when both sides close.
        let (tx, rx) = mpsc::channel(64);
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx);
        }

        Ok(Self {
            child,
            output: Some(rx),
            ready_timeout,
            signaled: false,
        })
    }

    /// Scans the proxy's output for the ready marker, racing the scan
    /// against the readiness deadline. Whichever terminal condition occurs
    /// first wins: marker found, error marker found, end of stream, or
    /// deadline. On every failure outcome the child has been signaled
    /// before this returns.
    pub async fn await_ready(&mut self) -> Result<(), GateError> {
        let mut output = self
            .output
            .take()
            .ok_or_else(|| GateError::Launch("readiness loop already ran".into()))?;
        let mut transcript = String::new();

        let deadline = tokio::time::sleep(self.ready_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    // Lines the readers delivered but the loop has not yet
                    // received still belong in the timeout diagnostics.
                    while let Ok(event) = output.try_recv() {
                        if let StreamEvent::Line(line) = event {
                            debug!(target: "proxy", "{line}");
                            transcript.push_str(&line);
                            transcript.push('\n');
                        }
                    }
                    warn!("timed out waiting for the proxy to become ready");
                    self.shutdown().await;
                    return Err(GateError::ReadyTimeout { transcript });
                }
                event = output.recv() => match event {
                    Some(StreamEvent::Line(line)) => {
                        debug!(target: "proxy", "{line}");
                        transcript.push_str(&line);
                        transcript.push('\n');
                        if line.contains(READY_MARKER) {
                            info!("proxy is ready for new connections");
                            self.drain_in_background(output);
                            return Ok(());
                        }
                        if line.contains(ERROR_MARKER) {
                            self.shutdown().await;
                            return Err(GateError::Readiness { line, transcript });
                        }
                    }
                    Some(StreamEvent::Failed(err)) => {
                        self.shutdown().await;
                        return Err(GateError::Readiness {
                            line: format!("failed reading proxy output: {err}"),
                            transcript,
                        });
                    }
                    None => {
                        warn!("proxy output closed before the ready marker");
                        self.shutdown().await;
                        return Err(GateError::OutputClosed { transcript });
                    }
                }
            }
        }
    }

    // Keeps consuming proxy output after readiness so a chatty proxy never
    // stalls on a full pipe while statements execute.
    fn drain_in_background(&self, mut output: mpsc::Receiver<StreamEvent>) {
        tokio::spawn(async move {
            while let Some(event) = output.recv().await {
                if let StreamEvent::Line(line) = event {
                    debug!(target: "proxy", "{line}");
                }
            }
        });
    }

    /// Sends SIGINT to the proxy and reaps it, escalating to SIGKILL if it
    /// ignores the signal. Idempotent: the signal is delivered at most once
    /// per invocation, and calling this again is a no-op.
    pub async fn shutdown(&mut self) {
        if self.signaled {
            return;
        }
        self.signaled = true;

        if let Ok(Some(status)) = self.child.try_wait() {
            debug!("proxy already exited with {status}");
            return;
        }
        let Some(pid) = self.child.id() else {
            return;
        };

        info!("sending SIGINT to proxy (pid {pid})");
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        if rc != 0 {
            warn!(
                "SIGINT delivery failed: {}",
                std::io::Error::last_os_error()
            );
            let _ = self.child.start_kill();
        }

        match tokio::time::timeout(REAP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!("proxy exited with {status}"),
            Ok(Err(err)) => warn!("failed to reap proxy: {err}"),
            Err(_) => {
                warn!("proxy ignored SIGINT, killing it");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
    }
}

impl Drop for ProxyHandle {
    fn drop(&mut self) {
        // Last-resort signal for exit paths that never reached shutdown.
        if self.signaled {
            return;
        }
        if let Some(pid) = self.child.id() {
            let _ = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        }
    }
}
