//! Running the target program inside the pivoted root.

use std::process::{Command, Stdio};

use nix::unistd::Pid;
use tinybox_common::error::{Result, TinyboxError};
use tinybox_common::types::{ExitOutcome, LaunchRequest};

use crate::interrupt;
use crate::process::outcome_of;

/// Runs the request's target program and waits for it.
///
/// The program is resolved against the current root, starts in `/`, and
/// sees only the policy environment. Standard streams are inherited.
/// Interrupts received while it runs are forwarded to it.
///
/// # Errors
///
/// Returns [`TinyboxError::Target`] if the program cannot be started or
/// waited on. A program that runs and exits non-zero is reported through
/// the returned [`ExitOutcome`], not as an error.
pub fn run_target(request: &LaunchRequest) -> Result<ExitOutcome> {
    let target = request.target();
    tracing::info!(
        target = %target.display(),
        args = ?request.target_args(),
        "launching target program"
    );

    let target_error = |source: std::io::Error| TinyboxError::Target {
        program: target.to_path_buf(),
        source,
    };
    let mut child = Command::new(target)
        .args(request.target_args())
        .env_clear()
        .envs(request.policy().env.iter().map(|(k, v)| (k, v)))
        .current_dir("/")
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(target_error)?;

    if let Ok(raw) = i32::try_from(child.id()) {
        interrupt::forward_to(Pid::from_raw(raw));
    }
    let status = child.wait();
    interrupt::stop_forwarding();
    let status = status.map_err(target_error)?;

    let outcome = outcome_of(status);
    tracing::info!(%outcome, "target program finished");
    Ok(outcome)
}
