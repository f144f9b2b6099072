//! `--x-action=create`: the launcher role.

use tinybox_common::types::{ExitOutcome, LaunchRequest};
use tinybox_runtime::{interrupt, launcher};

/// Creates the container and waits for it to exit.
///
/// # Errors
///
/// Returns an error if the container cannot be spawned or waited on.
pub fn execute(request: &LaunchRequest) -> anyhow::Result<ExitOutcome> {
    interrupt::install("container");
    Ok(launcher::launch(request)?)
}
