//! Spawning the initializer inside new namespaces and collecting exit
//! outcomes.

use std::ffi::OsString;
use std::process::ExitStatus;

use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use tinybox_common::constants::SELF_EXE;
use tinybox_common::error::{Result, TinyboxError};
use tinybox_common::types::{ExitOutcome, LaunchRequest, Role};
use tinybox_core::namespace::user::IdMappings;
use tinybox_core::namespace::{IsolatedCommand, NamespaceSet};

/// Command-line arguments that make a re-executed binary play the
/// initializer role for `request`.
pub fn initializer_args(request: &LaunchRequest) -> Vec<OsString> {
    let mut args = vec![
        flag("--root=", request.root().as_os_str()),
        flag("--shell=", request.target().as_os_str()),
        OsString::from(format!("--x-action={}", Role::LaunchInitializer.action())),
        OsString::from(format!("--hostname={}", request.policy().hostname)),
    ];
    args.extend(
        request
            .policy()
            .env_entries()
            .into_iter()
            .map(|entry| OsString::from(format!("--env={entry}"))),
    );
    if !request.target_args().is_empty() {
        args.push(OsString::from("--"));
        args.extend(request.target_args().iter().map(OsString::from));
    }
    args
}

fn flag(prefix: &str, value: &std::ffi::OsStr) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(value);
    arg
}

/// Re-executes this binary as the initializer, as the first process of
/// `namespaces`, with the standard streams inherited.
///
/// # Errors
///
/// Returns [`TinyboxError::Privilege`] if the kernel refuses the
/// namespaces or the identity mapping, or the binary cannot be executed.
pub fn spawn_isolated(
    request: &LaunchRequest,
    namespaces: NamespaceSet,
    mappings: &IdMappings,
) -> Result<Pid> {
    let pid = IsolatedCommand::new(SELF_EXE, initializer_args(request), namespaces, mappings)
        .and_then(|command| command.spawn())
        .map_err(|e| TinyboxError::Privilege {
            operation: "spawn into new namespaces",
            source: e,
        })?;
    tracing::info!(%pid, "initializer spawned");
    Ok(pid)
}

/// Blocks until the child `pid` exits.
///
/// # Errors
///
/// Returns [`TinyboxError::Privilege`] if `waitpid(2)` fails.
pub fn wait_for(pid: Pid) -> Result<ExitOutcome> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitOutcome::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ExitOutcome::Signaled(signal as i32));
            }
            Ok(_) | Err(Errno::EINTR) => {}
            Err(e) => {
                return Err(TinyboxError::Privilege {
                    operation: "wait for container",
                    source: e.into(),
                });
            }
        }
    }
}

/// Converts a process status into an [`ExitOutcome`].
pub fn outcome_of(status: ExitStatus) -> ExitOutcome {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => ExitOutcome::Exited(code),
        (None, Some(signal)) => ExitOutcome::Signaled(signal),
        (None, None) => ExitOutcome::Exited(1),
    }
}
