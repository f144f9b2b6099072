//! The host-side half of the launch protocol.

use tinybox_common::error::Result;
use tinybox_common::types::{ExitOutcome, LaunchRequest};
use tinybox_core::namespace::NamespaceSet;
use tinybox_core::namespace::user::IdMappings;

use crate::{interrupt, process};

/// Starts the container for `request` and blocks until it exits.
///
/// The initializer is spawned in a fresh mount, UTS, IPC, PID, network,
/// and user namespace set, with the invoking user mapped to root. No host
/// filesystem state is touched here. Interrupts received while waiting are
/// forwarded to the initializer.
///
/// # Errors
///
/// Returns [`TinyboxError::Privilege`](tinybox_common::error::TinyboxError::Privilege)
/// if the kernel refuses the namespaces or the mapping. The spawn is not
/// retried.
pub fn launch(request: &LaunchRequest) -> Result<ExitOutcome> {
    let namespaces = NamespaceSet::default();
    let mappings = IdMappings::for_current_user();
    tracing::info!(
        root = %request.root().display(),
        target = %request.target().display(),
        host_uid = mappings.uid.host_id,
        host_gid = mappings.gid.host_id,
        "creating container"
    );

    let pid = process::spawn_isolated(&request.for_initializer(), namespaces, &mappings)?;
    interrupt::forward_to(pid);
    let outcome = process::wait_for(pid);
    interrupt::stop_forwarding();
    let outcome = outcome?;

    tracing::info!(%outcome, "container exited");
    Ok(outcome)
}
