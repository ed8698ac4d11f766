//! Child process spawning and output capture
//!
//! Every child gets its own deadline. A child that outlives it is killed;
//! siblings are untouched.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Errors that prevent a child from producing an exit status
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    #[error("failed to read process output: {0}")]
    Capture(#[source] io::Error),
}

/// How a bounded child process ended
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited on its own before the deadline
    Exited {
        status: ExitStatus,
        /// Stdout and stderr as one stream, in the order they were written
        output: String,
    },

    /// The deadline fired and the process was killed
    TimedOut,
}

/// Run `argv` in `cwd` with an optional stdin payload, bounded by `limit`
///
/// Without a payload the child's stdin is the null device. The payload is
/// written from a separate task, so a child that never reads its input
/// cannot stall the wait.
///
/// Stdout and stderr share one pipe, which is read to end of file inside
/// the deadline. A background process that inherits the pipe therefore
/// keeps the run open until it exits or the deadline fires.
#[instrument(skip(stdin), fields(stdin_len = stdin.map(<[u8]>::len)))]
pub async fn run_bounded(
    argv: &[String],
    cwd: &Path,
    stdin: Option<&[u8]>,
    limit: Duration,
) -> Result<ProcessOutcome, ProcessError> {
    let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;

    let (reader, writer) = io::pipe().map_err(ProcessError::Pipe)?;
    let mut child = {
        let stderr = writer.try_clone().map_err(ProcessError::Pipe)?;
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(writer)
            .stderr(stderr)
            .kill_on_drop(true);

        // The command owns our write ends; it is dropped with this block so
        // the reader sees end of file once the child exits
        command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?
    };

    if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let data = data.to_vec();
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(&data).await {
                debug!(error = %e, "child closed stdin before reading all input");
            }
        });
    }

    let capture = async {
        let mut output = Vec::new();
        output_reader(reader)?.read_to_end(&mut output).await?;
        Ok::<_, io::Error>(output)
    };

    // Dropping the futures on timeout drops the child, which kills it
    match tokio::time::timeout(limit, async { tokio::join!(child.wait(), capture) }).await {
        Ok((Ok(status), Ok(output))) => {
            debug!(%status, "process exited");
            Ok(ProcessOutcome::Exited {
                status,
                output: String::from_utf8_lossy(&output).into_owned(),
            })
        }
        Ok((Err(e), _)) => Err(ProcessError::Wait(e)),
        Ok((_, Err(e))) => Err(ProcessError::Capture(e)),
        Err(_) => {
            debug!(?limit, "process deadline exceeded");
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

#[cfg(unix)]
fn output_reader(reader: io::PipeReader) -> io::Result<impl AsyncRead + Unpin> {
    use std::os::fd::OwnedFd;

    tokio::net::unix::pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
}

#[cfg(windows)]
fn output_reader(reader: io::PipeReader) -> io::Result<impl AsyncRead + Unpin> {
    use std::os::windows::io::OwnedHandle;

    let file = std::fs::File::from(OwnedHandle::from(reader));
    Ok(tokio::fs::File::from_std(file))
}

/// Short description of a non-successful exit (e.g. "exit status 1")
pub fn describe_status(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit status {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal: {signal}");
        }
    }
    status.to_string()
}

/// Output of a failed process followed by the reason it failed, trimmed
pub fn failure_text(output: &str, reason: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        reason.trim().to_owned()
    } else {
        format!("{output}\n{reason}").trim().to_owned()
    }
}
