//! Mount utilities used while swapping the container root.

use std::io;
use std::path::Path;

/// Remounts `/` and everything below it with private propagation, so mount
/// events in this namespace never reach the host and vice versa.
///
/// # Errors
///
/// Returns the OS error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_private_recursive() -> io::Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )?;
    tracing::debug!("mount propagation set to private");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: mount propagation requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_private_recursive() -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}

/// Recursively bind-mounts `path` onto itself, turning it into a mount
/// point of its own.
///
/// # Errors
///
/// Returns the OS error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn bind_mount_self(path: &Path) -> io::Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        Some(path),
        path,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )?;
    tracing::debug!(path = %path.display(), "bind-mounted onto itself");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: bind mounts require Linux.
#[cfg(not(target_os = "linux"))]
pub fn bind_mount_self(_path: &Path) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}

/// Lazily detaches the filesystem mounted at `target` (`MNT_DETACH`).
///
/// # Errors
///
/// Returns the OS error if the `umount2(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn detach(target: &Path) -> io::Result<()> {
    nix::mount::umount2(target, nix::mount::MntFlags::MNT_DETACH)?;
    tracing::debug!(target = %target.display(), "mount detached");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: unmounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn detach(_target: &Path) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}
