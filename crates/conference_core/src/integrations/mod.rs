//! Boundaries to external collaborators.
//!
//! # Responsibility
//! - Define the contracts the core consumes from ranking, feed, badge and
//!   mail collaborators.
//! - Keep process invocation and fallback policy out of the grid engine.
//!
//! # Invariants
//! - Ranking and feed failures degrade to an empty result at the boundary;
//!   they never propagate into callers building a report.

pub mod badge;
pub mod feed;
pub mod mail;
pub mod ranking;

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Instant;

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Failure talking to an external collaborator.
#[derive(Debug)]
pub enum CollaboratorError {
    /// Process could not be started.
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// Local I/O while preparing or collecting a collaborator call.
    Io(std::io::Error),
    /// Process ran but exited unsuccessfully.
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Input could not be serialized for the collaborator.
    Serialize(serde_json::Error),
    /// Collaborator reported a failure of its own.
    Unavailable(String),
}

impl Display for CollaboratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "failed to start `{program}`: {source}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::ExitStatus {
                program,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "`{program}` exited with {code}: {stderr}"),
                None => write!(f, "`{program}` terminated by signal: {stderr}"),
            },
            Self::Serialize(err) => write!(f, "failed to serialize collaborator input: {err}"),
            Self::Unavailable(message) => write!(f, "collaborator unavailable: {message}"),
        }
    }
}

impl Error for CollaboratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::ExitStatus { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Runs `program` with `args`, feeding `input` on stdin.
///
/// Returns the captured output whatever the exit status; callers decide how
/// lenient to be.
pub(crate) fn run_with_stdin(
    program: &Path,
    args: &[String],
    input: Vec<u8>,
) -> CollaboratorResult<Output> {
    let started_at = Instant::now();
    let display = program.display().to_string();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CollaboratorError::Spawn {
            program: display.clone(),
            source,
        })?;

    // Why: a child that writes before draining stdin would deadlock against
    // a blocking write on this thread once its stdout pipe fills.
    let writer = child.stdin.take().map(|mut stdin| {
        std::thread::spawn(move || stdin.write_all(&input))
    });
    let output = child.wait_with_output()?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(())) => {}
            // Child exited without draining stdin; its exit status tells the story.
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                return Err(CollaboratorError::Unavailable(format!(
                    "stdin writer for `{display}` panicked"
                )))
            }
        }
    }

    info!(
        "event=collaborator_run module=integrations status={} program={} duration_ms={}",
        if output.status.success() { "ok" } else { "error" },
        display,
        started_at.elapsed().as_millis()
    );
    Ok(output)
}

/// Turns an unsuccessful exit into `CollaboratorError::ExitStatus`.
pub(crate) fn require_success(program: &Path, output: &Output) -> CollaboratorResult<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(CollaboratorError::ExitStatus {
        program: program.display().to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
