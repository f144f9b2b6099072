//! UTS namespace isolation.
//!
//! Allows the container to have its own hostname.

use tinybox_common::error::{Result, TinyboxError};

/// Sets the hostname inside the caller's UTS namespace.
///
/// # Errors
///
/// Returns [`TinyboxError::Privilege`] if `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname).map_err(|e| TinyboxError::Privilege {
        operation: "sethostname",
        source: e.into(),
    })?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(TinyboxError::Privilege {
        operation: "sethostname",
        source: std::io::ErrorKind::Unsupported.into(),
    })
}
