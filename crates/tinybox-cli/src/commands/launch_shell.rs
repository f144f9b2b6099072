//! `--x-action=launch-shell`: the in-namespace initializer role.
//!
//! Not meant to be invoked by hand; the launcher re-executes the binary
//! with this action once the namespaces exist.

use tinybox_common::types::{ExitOutcome, LaunchRequest};
use tinybox_runtime::{initializer, interrupt};

/// Pivots into the container root and runs the target program.
///
/// # Errors
///
/// Returns an error if the pivot fails or the target cannot be started.
pub fn execute(request: &LaunchRequest) -> anyhow::Result<ExitOutcome> {
    interrupt::install("target program");
    Ok(initializer::initialize(request)?)
}
