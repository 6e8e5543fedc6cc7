//! Badge rendering through an external program.
//!
//! # Responsibility
//! - Hand each ticket group to the badge program as JSON on stdin.
//! - Collect one artifact file per group.
//!
//! # Invariants
//! - Program failures are logged, not raised; the (possibly empty) artifact
//!   is still returned so the group count matches the output count.

use crate::integrations::{require_success, run_with_stdin, CollaboratorResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;

/// Tickets rendered by one program run, with run-specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketGroup {
    pub args: Vec<String>,
    pub tickets: serde_json::Value,
}

/// Renders every group with `program`, one `.tar` artifact per group.
///
/// The program is called as `program -o <artifact> <extra_args..> <group.args..>`.
///
/// # Errors
/// - Returns an error when an artifact file cannot be created or the tickets
///   cannot be serialized. Program failures are only logged.
pub fn render_badges(
    program: &Path,
    groups: &[TicketGroup],
    extra_args: &[String],
) -> CollaboratorResult<Vec<NamedTempFile>> {
    let mut files = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let artifact = tempfile::Builder::new().suffix(".tar").tempfile()?;
        let input = serde_json::to_vec(&group.tickets)?;

        let mut args = vec!["-o".to_string(), artifact.path().display().to_string()];
        args.extend(extra_args.iter().cloned());
        args.extend(group.args.iter().cloned());

        let outcome = run_with_stdin(program, &args, input)
            .and_then(|output| require_success(program, &output));
        if let Err(err) = outcome {
            warn!(
                "event=badge_render module=integrations status=error group={} error={}",
                index, err
            );
        }
        files.push(artifact);
    }
    Ok(files)
}
