use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt as _;

/// How long output drains may keep reading once the child is gone.
///
/// A descendant that inherited the pipes can keep them open after the child
/// exits; whatever it has written by then is kept and the rest is dropped.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Whether the process was killed after exceeding its time limit.
    pub timed_out: bool,
}

impl ExecResult {
    /// Standard output followed by standard error, as one string.
    ///
    /// Package managers split their diagnostics across both streams, so
    /// output classification always looks at the combination.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() || self.stdout.ends_with('\n') {
            format!("{}{}", self.stdout, self.stderr)
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
            timed_out: false,
        }
    }
}

/// Abstraction over subprocess execution so callers can be tested without
/// spawning real package managers.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with an optional time limit, allowing failure.
    ///
    /// When the limit elapses the child and everything it started are killed,
    /// and the returned result has `timed_out` set and `success` cleared.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned or waited on.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;

        Ok(ExecResult::from(output))
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecResult> {
        let Some(limit) = timeout else {
            return self.run_unchecked(program, args);
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            // Own process group, so a timeout can take down brew's helpers too.
            cmd.process_group(0);
        }
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = child
            .wait_timeout(limit)
            .with_context(|| format!("failed to wait for: {program}"))?;
        let timed_out = status.is_none();
        let status = match status {
            Some(status) => status,
            None => kill_and_reap(&mut child, program)?,
        };

        let deadline = Instant::now() + DRAIN_GRACE;
        let mut result = ExecResult {
            stdout: collect(stdout, deadline),
            stderr: collect(stderr, deadline),
            success: status.success() && !timed_out,
            code: if timed_out { None } else { status.code() },
            timed_out,
        };
        if timed_out {
            if !result.stderr.is_empty() && !result.stderr.ends_with('\n') {
                result.stderr.push('\n');
            }
            result
                .stderr
                .push_str(&format!("{program} timed out after {}s\n", limit.as_secs()));
        }
        Ok(result)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Output read so far from one pipe, plus a signal sent at end of stream.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Drain> {
    pipe.map(|mut pipe| {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let (tx, done) = mpsc::channel();
        std::thread::spawn(move || {
            let mut chunk = [0_u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
            tx.send(()).ok();
        });
        Drain { buf, done }
    })
}

/// Wait for `drain` to reach end of stream, but no later than `deadline`.
fn collect(drain: Option<Drain>, deadline: Instant) -> String {
    let Some(drain) = drain else {
        return String::new();
    };
    drain
        .done
        .recv_timeout(deadline.saturating_duration_since(Instant::now()))
        .ok();
    drain
        .buf
        .lock()
        .map(|buf| String::from_utf8_lossy(&buf).to_string())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child, program: &str) -> Result<std::process::ExitStatus> {
    kill_group(child);
    // The child may have exited between the timeout and the kill.
    child.kill().ok();
    child
        .wait()
        .with_context(|| format!("failed to reap timed out process: {program}"))
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        killpg(Pid::from_raw(pid), Signal::SIGKILL).ok();
    }
}

#[cfg(not(unix))]
const fn kill_group(_child: &Child) {}
