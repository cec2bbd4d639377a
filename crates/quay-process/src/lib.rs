//! Bounded subprocess execution for git.
//!
//! `git log --numstat` across a large repository can emit arbitrary amounts
//! of output; buffering it all (the `Command::output()` default) risks OOM
//! when dozens of projects are queried at once. This crate caps captured
//! stdout, keeps a short stderr tail for diagnostics, and enforces a hard
//! wall-clock timeout, killing the child on either breach.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 5 * 1024 * 1024;

/// Stderr is only kept for error messages; a short tail is enough.
const STDERR_CAP_BYTES: usize = 4096;
/// How much stderr ends up in the error itself.
const STDERR_ERROR_SLICE: usize = 500;

/// Options controlling a bounded command invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working directory for the child process.
    pub cwd: PathBuf,
    /// Kill the child if it has not exited after this duration.
    pub timeout: Duration,
    /// Maximum bytes of stdout to accept before killing the child.
    pub max_output_bytes: usize,
}

impl RunOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}` in {cwd}: {source}")]
    Spawn {
        program: String,
        cwd: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` timed out after {timeout:?}")]
    TimedOut {
        program: String,
        args: String,
        timeout: Duration,
    },

    #[error("`{program} {args}` exceeded the {max_bytes}-byte output cap")]
    OutputOverflow {
        program: String,
        args: String,
        max_bytes: usize,
    },

    #[error("`{program} {args}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        args: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("i/o error while capturing `{program}` output: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `git` with the given arguments and return its stdout.
///
/// No shell is involved. Errors on non-zero exit, timeout, or output
/// overflow; in the last two cases the child is killed.
pub async fn run_git(args: &[&str], options: &RunOptions) -> Result<String, CommandError> {
    run_command("git", args, options).await
}

/// Generic bounded runner backing [`run_git`].
pub async fn run_command(
    program: &str,
    args: &[&str],
    options: &RunOptions,
) -> Result<String, CommandError> {
    let rendered_args = args.join(" ");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(&options.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            cwd: options.cwd.clone(),
            source,
        })?;

    let io_err = |source| CommandError::Io {
        program: program.to_string(),
        source,
    };

    let mut stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    // Stderr drains on its own task so a chatty child cannot deadlock on a
    // full pipe while we read stdout.
    let stderr_task = tokio::spawn(read_capped(stderr, STDERR_CAP_BYTES));

    let max_bytes = options.max_output_bytes;
    let work = async {
        let mut collected: Vec<u8> = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        loop {
            let n = stdout.read(&mut buf).await.map_err(io_err)?;
            if n == 0 {
                break;
            }
            if collected.len() + n > max_bytes {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(CommandError::OutputOverflow {
                    program: program.to_string(),
                    args: rendered_args.clone(),
                    max_bytes,
                });
            }
            collected.extend_from_slice(&buf[..n]);
        }

        let status = child.wait().await.map_err(io_err)?;
        Ok((collected, status))
    };

    let (collected, status) = match tokio::time::timeout(options.timeout, work).await {
        Ok(result) => result?,
        Err(_) => {
            // Returning drops the child handle; kill_on_drop reaps it.
            stderr_task.abort();
            debug!(program, args = %rendered_args, "killed after timeout");
            return Err(CommandError::TimedOut {
                program: program.to_string(),
                args: rendered_args,
                timeout: options.timeout,
            });
        }
    };

    if !status.success() {
        let stderr_text = stderr_task.await.unwrap_or_default();
        let tail: String = stderr_text.chars().take(STDERR_ERROR_SLICE).collect();
        return Err(CommandError::Failed {
            program: program.to_string(),
            args: rendered_args,
            status,
            stderr: tail,
        });
    }

    Ok(String::from_utf8_lossy(&collected).into_owned())
}

async fn read_capped(mut reader: impl AsyncRead + Unpin, cap: usize) -> String {
    let mut collected: Vec<u8> = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if collected.len() < cap {
                    let take = (cap - collected.len()).min(n);
                    collected.extend_from_slice(&buf[..take]);
                }
                // Past the cap we keep draining so the child never blocks
                // on a full stderr pipe.
            }
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}

/// Parse one `git log --numstat` line into added/removed line counts.
///
/// Binary files show `-` in either column; those count as zero. Returns
/// `None` for lines that are not numstat records.
pub fn parse_numstat_line(line: &str) -> Option<(u64, u64)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(\d+|-)\t(\d+|-)\t").expect("valid regex"));

    let caps = re.captures(line)?;
    let parse = |m: &str| if m == "-" { 0 } else { m.parse().unwrap_or(0) };
    Some((parse(&caps[1]), parse(&caps[2])))
}
