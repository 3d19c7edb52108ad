use super::config::BroadcastConfig;
use super::sink::BroadcastSink;
use super::status::{SessionStatus, StartOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// A launched encoder and the pipe feeding it
struct RunningEncoder {
    generation: u64,
    session_id: String,
    child: Child,
    stdin: ChildStdin,
}

/// Identity of the current (or most recent) session, kept for status reporting
#[derive(Clone)]
struct SessionInfo {
    session_id: String,
    started_at: DateTime<Utc>,
}

/// Owns the external encoder process for one live broadcast at a time
///
/// `active` holds the generation of the running encoder, or 0 when idle. It
/// is readable without locking so callers (and `write`'s fast path) can poll
/// it; the process handles live behind a mutex. While `active` is non-zero the
/// mutex holds the encoder of that generation. `active` is cleared before any
/// teardown begins so that writes racing a shutdown are dropped, and a stop
/// only tears down the generation it cleared.
pub struct BroadcastSession {
    config: BroadcastConfig,
    active: AtomicU64,
    generation: AtomicU64,
    encoder: Mutex<Option<RunningEncoder>>,
    info: Mutex<Option<SessionInfo>>,
    chunks_written: AtomicU64,
    bytes_written: AtomicU64,
}

impl BroadcastSession {
    /// Create the session manager, making sure the output directory exists
    pub fn new(config: BroadcastConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

        info!("Broadcast output: {}", config.output_dir.display());
        info!("Encoder path: {}", config.encoder_path.display());

        Ok(Self {
            config,
            active: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            encoder: Mutex::new(None),
            info: Mutex::new(None),
            chunks_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    /// Launch the encoder if no session is running.
    ///
    /// Never fails outward: a missing binary or spawn error is logged and the
    /// session stays inactive, so a later call may retry.
    pub async fn start(&self) -> StartOutcome {
        let mut slot = self.encoder.lock().await;

        if self.is_active() {
            debug!("Broadcast already active");
            return StartOutcome::AlreadyActive;
        }

        // A stop that cleared `active` may not have taken the handles yet
        if let Some(stale) = slot.take() {
            self.teardown(stale).await;
        }

        if !self.config.encoder_path.is_file() {
            error!(
                "Encoder not found at {}",
                self.config.encoder_path.display()
            );
            return StartOutcome::EncoderMissing;
        }

        clear_output_dir(&self.config.output_dir).await;

        let session_id = format!("broadcast-{}", uuid::Uuid::new_v4());
        let args = self.config.encoder.args(&self.config.output_dir);

        info!("Starting encoder for {}", session_id);
        debug!("Encoder args: {:?}", args);

        let mut child = match Command::new(&self.config.encoder_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to launch encoder: {}", e);
                return StartOutcome::LaunchFailed;
            }
        };

        let Some(stdin) = child.stdin.take() else {
            error!("Encoder launched without a stdin pipe");
            if let Err(e) = child.start_kill() {
                error!("Failed to kill encoder: {}", e);
            }
            return StartOutcome::LaunchFailed;
        };

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, "stdout", session_id.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, "stderr", session_id.clone());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = Some(RunningEncoder {
            generation,
            session_id: session_id.clone(),
            child,
            stdin,
        });

        self.chunks_written.store(0, Ordering::SeqCst);
        self.bytes_written.store(0, Ordering::SeqCst);
        *self.info.lock().await = Some(SessionInfo {
            session_id: session_id.clone(),
            started_at: Utc::now(),
        });

        self.active.store(generation, Ordering::SeqCst);
        info!("Encoder started successfully ({})", session_id);

        StartOutcome::Started
    }

    /// Forward one chunk to the encoder.
    ///
    /// Dropped silently when no session is running. An encoder that exited
    /// on its own or a failed pipe write ends the session.
    pub async fn write(&self, chunk: &[u8]) {
        if chunk.is_empty() || !self.is_active() {
            return;
        }

        let mut slot = self.encoder.lock().await;
        if !self.is_active() {
            return;
        }
        let Some(running) = slot.as_mut() else {
            return;
        };

        let healthy = match running.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!(
                    "Encoder for {} exited unexpectedly ({})",
                    running.session_id, status
                );
                false
            }
            Err(e) => {
                error!("Failed to poll encoder status: {}", e);
                false
            }
        };

        let delivered = healthy && {
            let result = async {
                running.stdin.write_all(chunk).await?;
                running.stdin.flush().await
            }
            .await;

            match result {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to write audio to encoder: {}", e);
                    false
                }
            }
        };

        if delivered {
            self.chunks_written.fetch_add(1, Ordering::SeqCst);
            self.bytes_written
                .fetch_add(chunk.len() as u64, Ordering::SeqCst);
            return;
        }

        self.active.store(0, Ordering::SeqCst);
        if let Some(running) = slot.take() {
            self.teardown(running).await;
        }
    }

    /// End the current session: close the encoder's stdin, wait for it to
    /// flush and exit, kill it if it does not exit in time.
    pub async fn stop(&self) {
        let generation = self.active.swap(0, Ordering::SeqCst);
        if generation == 0 {
            return;
        }

        info!("Stopping broadcast");

        let running = {
            let mut slot = self.encoder.lock().await;
            match slot.as_ref() {
                Some(running) if running.generation == generation => slot.take(),
                // A start got the lock first: it already tore down our encoder
                // and the one now in the slot belongs to the new session
                _ => None,
            }
        };
        if let Some(running) = running {
            self.teardown(running).await;
        }
    }

    /// Current session status
    pub async fn status(&self) -> SessionStatus {
        let info = self.info.lock().await.clone();

        SessionStatus {
            active: self.is_active(),
            session_id: info.as_ref().map(|i| i.session_id.clone()),
            started_at: info.map(|i| i.started_at),
            chunks_written: self.chunks_written.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
            playlist: self.config.encoder.playlist_path(&self.config.output_dir),
        }
    }

    async fn teardown(&self, running: RunningEncoder) {
        let RunningEncoder {
            session_id,
            mut child,
            stdin,
            ..
        } = running;

        // EOF lets the encoder finalize the last segment and playlist
        drop(stdin);

        match tokio::time::timeout(self.config.stop_timeout, child.wait()).await {
            Ok(Ok(status)) => info!("Encoder for {} exited ({})", session_id, status),
            Ok(Err(e)) => error!("Failed to wait for encoder: {}", e),
            Err(_) => {
                warn!(
                    "Encoder for {} still running after {:?}, killing it",
                    session_id, self.config.stop_timeout
                );
                if let Err(e) = child.kill().await {
                    error!("Failed to kill encoder: {}", e);
                }
            }
        }

        info!("Broadcast {} stopped", session_id);
    }
}

impl Drop for BroadcastSession {
    fn drop(&mut self) {
        self.active.store(0, Ordering::SeqCst);

        if let Some(running) = self.encoder.get_mut().take() {
            let RunningEncoder {
                session_id,
                mut child,
                stdin,
                ..
            } = running;
            drop(stdin);

            if !matches!(child.try_wait(), Ok(Some(_))) {
                warn!(
                    "Broadcast session dropped while {} was running, killing encoder",
                    session_id
                );
                if let Err(e) = child.start_kill() {
                    error!("Failed to kill encoder: {}", e);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl BroadcastSink for BroadcastSession {
    async fn start(&self) -> StartOutcome {
        BroadcastSession::start(self).await
    }

    async fn write(&self, chunk: &[u8]) {
        BroadcastSession::write(self, chunk).await
    }

    async fn stop(&self) {
        BroadcastSession::stop(self).await
    }

    fn is_active(&self) -> bool {
        BroadcastSession::is_active(self)
    }
}

/// Remove every file left in the output directory by a previous session.
///
/// Best effort: a file still held by a finishing encoder is skipped.
async fn clear_output_dir(dir: &Path) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                warn!("Failed to recreate output directory: {}", e);
            }
            return;
        }
        Err(e) => {
            warn!("Failed to clear output directory: {}", e);
            return;
        }
    };

    let mut removed = 0usize;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to clear output directory: {}", e);
                break;
            }
        };

        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => debug!("Could not remove {}: {}", entry.path().display(), e),
        }
    }

    debug!("Cleared {} files from {}", removed, dir.display());
}

/// Forward each non-empty line the encoder prints to the log.
///
/// Runs until the pipe closes, which happens when the encoder exits.
fn forward_lines<R>(reader: R, stream: &'static str, session_id: String)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    if stream == "stderr" {
                        warn!(target: "encoder", stream, session = %session_id, "{}", line);
                    } else {
                        info!(target: "encoder", stream, session = %session_id, "{}", line);
                    }
                }
                Err(e) => {
                    debug!("Encoder {} reader closed: {}", stream, e);
                    break;
                }
            }
        }
    });
}
