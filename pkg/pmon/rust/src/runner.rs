// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Duration, timeout};
use uuid::Uuid;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Called for every chunk read from the child. Runs on the reader task, so it
/// must return quickly. Panics are caught and logged.
pub type OutputCallback = Arc<dyn Fn(OutputStream, &str) + Send + Sync>;

/// Per-call knobs for [`CommandRunner::run`].
///
/// The default waits for the child without a time limit, captures both
/// streams and reports no progress.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Kill the child's process group and fail with [`Error::Timeout`] after this long.
    pub timeout: Option<Duration>,
    /// Fire and forget: no capture, not awaited, resolves with exit code 0.
    pub detached: bool,
    pub on_output: Option<OutputCallback>,
}

impl RunOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("timeout", &self.timeout)
            .field("detached", &self.detached)
            .field("on_output", &self.on_output.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Process exit code; -1 when the child was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the command façade and the operating system.
///
/// There is no cancel handle: the only way to abort a running command is the
/// timeout in [`RunOptions`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, executable: &Path, args: &[String], options: RunOptions)
    -> Result<RunOutput>;
}

/// Runs each command as a fresh child process, one per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        executable: &Path,
        args: &[String],
        options: RunOptions,
    ) -> Result<RunOutput> {
        check_executable(executable)?;

        let run_id = Uuid::new_v4();
        info!(
            "[{run_id}] running {} {}",
            executable.display(),
            args.join(" ")
        );

        let mut cmd = Command::new(executable);
        cmd.args(args);
        // Own process group, so a timeout can take down everything the child started.
        #[cfg(unix)]
        cmd.process_group(0);

        if options.detached {
            return spawn_detached(cmd, executable, run_id);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| Error::SpawnFailed {
            path: executable.to_path_buf(),
            source,
        })?;
        // Taken now: once the child is reaped its pid is gone, but the group
        // may still have members.
        let pgid = child.id();
        debug!("[{run_id}] spawned (pid={})", pgid.unwrap_or(0));

        let stdout_task = child.stdout.take().map(|pipe| {
            tokio::spawn(capture(
                pipe,
                OutputStream::Stdout,
                options.on_output.clone(),
                run_id,
            ))
        });
        let stderr_task = child.stderr.take().map(|pipe| {
            tokio::spawn(capture(
                pipe,
                OutputStream::Stderr,
                options.on_output.clone(),
                run_id,
            ))
        });

        let readers: Vec<AbortHandle> = [&stdout_task, &stderr_task]
            .into_iter()
            .flatten()
            .map(JoinHandle::abort_handle)
            .collect();
        // A grandchild can hold the pipes open after the child exits; the limit
        // covers draining them too.
        let finish = async {
            let status = child.wait().await?;
            Ok::<_, Error>(RunOutput {
                exit_code: status.code().unwrap_or(-1),
                stdout: collect(stdout_task, run_id).await,
                stderr: collect(stderr_task, run_id).await,
            })
        };

        let output = match options.timeout {
            Some(limit) => match timeout(limit, finish).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!(
                        "[{run_id}] not finished after {}ms, killing process group",
                        limit.as_millis()
                    );
                    kill_group(&mut child, pgid, run_id).await;
                    for reader in readers {
                        reader.abort();
                    }
                    return Err(Error::Timeout {
                        path: executable.to_path_buf(),
                        after: limit,
                    });
                }
            },
            None => finish.await?,
        };
        info!("[{run_id}] exited with code {}", output.exit_code);
        Ok(output)
    }
}

fn check_executable(executable: &Path) -> Result<()> {
    if executable.as_os_str().is_empty() || !executable.exists() {
        return Err(Error::NotFound {
            path: executable.to_path_buf(),
        });
    }
    Ok(())
}

fn spawn_detached(mut cmd: Command, executable: &Path, run_id: Uuid) -> Result<RunOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let child = cmd.spawn().map_err(|source| Error::SpawnFailed {
        path: executable.to_path_buf(),
        source,
    })?;
    info!("[{run_id}] detached (pid={})", child.id().unwrap_or(0));
    // Dropping the handle leaves the child running; tokio reaps it once it exits.
    drop(child);
    Ok(RunOutput::default())
}

async fn capture<R>(
    mut pipe: R,
    stream: OutputStream,
    on_output: Option<OutputCallback>,
    run_id: Uuid,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("[{run_id}] failed reading {stream}: {e}");
                break;
            }
        };
        let chunk = buf.get(..n).unwrap_or_default();
        captured.extend_from_slice(chunk);

        let text = String::from_utf8_lossy(chunk);
        debug!("[{run_id}] {stream}: {}", text.trim_end());
        if let Some(ref callback) = on_output
            && catch_unwind(AssertUnwindSafe(|| callback(stream, &text))).is_err()
        {
            warn!("[{run_id}] output callback panicked, ignoring");
        }
    }
    String::from_utf8_lossy(&captured).into_owned()
}

async fn collect(task: Option<JoinHandle<String>>, run_id: Uuid) -> String {
    match task {
        Some(task) => task.await.unwrap_or_else(|e| {
            warn!("[{run_id}] output reader failed: {e}");
            String::new()
        }),
        None => String::new(),
    }
}

async fn kill_group(child: &mut Child, pgid: Option<u32>, run_id: Uuid) {
    #[cfg(unix)]
    if let Some(pid) = pgid.and_then(|pid| i32::try_from(pid).ok()) {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("[{run_id}] failed to kill process group {pid}: {e}"),
        }
    }
    if let Err(e) = child.kill().await {
        debug!("[{run_id}] kill after group kill: {e}");
    }
}
