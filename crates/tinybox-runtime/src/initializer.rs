//! The in-namespace half of the launch protocol.
//!
//! Runs as the re-executed child, PID 1 of its namespaces, after the kernel
//! has already placed it there with its identity mapping.

use tinybox_common::error::Result;
use tinybox_common::types::{ExitOutcome, LaunchRequest};
use tinybox_core::filesystem::pivot_root::{KernelPivot, PivotOps, RootPivot};
use tinybox_core::namespace::uts;

use crate::exec;

/// Sets the hostname, pivots into the request's root, then runs the target
/// program and returns its outcome.
///
/// # Errors
///
/// Returns [`TinyboxError::Pivot`](tinybox_common::error::TinyboxError::Pivot)
/// if the root cannot be swapped, in which case the target never runs, or
/// [`TinyboxError::Target`](tinybox_common::error::TinyboxError::Target) if
/// the target cannot be started.
pub fn initialize(request: &LaunchRequest) -> Result<ExitOutcome> {
    initialize_with(request, KernelPivot, uts::set_hostname)
}

/// [`initialize`] with the pivot operations and hostname setter supplied
/// by the caller.
///
/// # Errors
///
/// Same as [`initialize`].
pub fn initialize_with<O, H>(request: &LaunchRequest, ops: O, set_hostname: H) -> Result<ExitOutcome>
where
    O: PivotOps,
    H: FnOnce(&str) -> Result<()>,
{
    tracing::info!(
        root = %request.root().display(),
        target = %request.target().display(),
        "initializing container"
    );

    let hostname = &request.policy().hostname;
    if let Err(e) = set_hostname(hostname) {
        tracing::warn!(hostname = %hostname, error = %e, "could not set container hostname");
    }

    RootPivot::new(ops, request.root()).run()?;

    exec::run_target(request)
}
