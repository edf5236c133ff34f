//! External tool invocation with a hard deadline.

use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{ReportCardError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to keep reading a killed tool's pipes.
const KILL_GRACE: Duration = Duration::from_millis(200);

/// Program and fixed arguments for an analysis tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed before any per-run arguments.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a spec from a program and its leading arguments.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    /// Run the tool inside `dir`, killing it once `timeout` elapses.
    ///
    /// The deadline covers both the process and its output pipes, so a
    /// background helper holding a pipe open cannot stall the caller. Output
    /// captured before the deadline is kept and `timed_out` is set.
    pub fn run(&self, dir: &Path, extra_args: &[String], timeout: Duration) -> Result<CommandOutput> {
        debug!(
            "running {} {:?} {:?} in {}",
            self.program,
            self.args,
            extra_args,
            dir.display()
        );
        let deadline = Instant::now() + timeout;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(extra_args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => ReportCardError::ToolNotFound(self.program.clone()),
                _ => ReportCardError::Io(err),
            })?;

        // Pipes are drained on their own threads so a chatty tool cannot block on a full buffer.
        let stdout = PipeReader::spawn(child.stdout.take());
        let stderr = PipeReader::spawn(child.stderr.take());

        let (status, timed_out) = match wait_until(&mut child, deadline)? {
            Some(status) => {
                let closed = stdout.wait_until(deadline) && stderr.wait_until(deadline);
                (status, !closed)
            }
            None => {
                let _ = child.kill();
                let status = child.wait()?;
                let grace = Instant::now() + KILL_GRACE;
                stdout.wait_until(grace);
                stderr.wait_until(grace);
                (status, true)
            }
        };
        if timed_out {
            warn!("{} timed out after {}s", self.program, timeout.as_secs());
        }

        Ok(CommandOutput {
            status,
            stdout: stdout.contents(),
            stderr: stderr.contents(),
            timed_out,
        })
    }
}

/// Captured result of a tool run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// The deadline passed before the process and its pipes finished.
    pub timed_out: bool,
}

impl CommandOutput {
    /// Exit code, if the process was not terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Trimmed stdout and stderr joined by a newline.
    pub fn merged_output(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Collects one pipe on a detached thread.
///
/// Bytes land in a shared buffer as they arrive, so whatever was read is
/// available even if the pipe never closes.
struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Receiver<()>,
}

impl PipeReader {
    fn spawn<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (sender, closed) = mpsc::channel();
        if let Some(mut pipe) = pipe {
            let sink = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(read) => lock(&sink).extend_from_slice(&chunk[..read]),
                        Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
                let _ = sender.send(());
            });
        }
        Self { buffer, closed }
    }

    /// Whether the pipe reached end of file before `deadline`.
    fn wait_until(&self, deadline: Instant) -> bool {
        let remaining = deadline.saturating_duration_since(Instant::now());
        !matches!(
            self.closed.recv_timeout(remaining),
            Err(RecvTimeoutError::Timeout)
        )
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
