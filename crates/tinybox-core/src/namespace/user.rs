//! User namespace identity mapping.
//!
//! Maps container UID/GID 0 onto the invoking user's real IDs, so the
//! initializer is root inside the namespace while holding no privilege on
//! the host.

use std::io;
use std::path::Path;

const SETGROUPS_PATH: &str = "/proc/self/setgroups";
const UID_MAP_PATH: &str = "/proc/self/uid_map";
const GID_MAP_PATH: &str = "/proc/self/gid_map";

/// A single-entry ID map: `container_id .. container_id + size` inside the
/// namespace corresponds to `host_id .. host_id + size` on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMapping {
    /// First ID as seen inside the namespace.
    pub container_id: u32,
    /// First ID as seen on the host.
    pub host_id: u32,
    /// Number of consecutive IDs mapped.
    pub size: u32,
}

impl IdentityMapping {
    /// Maps exactly one host ID to container ID 0.
    pub const fn root_to(host_id: u32) -> Self {
        Self {
            container_id: 0,
            host_id,
            size: 1,
        }
    }

    /// Line in the format expected by `/proc/<pid>/{uid,gid}_map`.
    pub fn map_line(&self) -> String {
        format!("{} {} {}\n", self.container_id, self.host_id, self.size)
    }
}

/// UID and GID mappings installed together for one user namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdMappings {
    /// Mapping written to `uid_map`.
    pub uid: IdentityMapping,
    /// Mapping written to `gid_map`.
    pub gid: IdentityMapping,
}

impl IdMappings {
    /// Maps the calling process's real UID and GID to container root.
    pub fn for_current_user() -> Self {
        use nix::unistd::{getgid, getuid};

        Self {
            uid: IdentityMapping::root_to(getuid().as_raw()),
            gid: IdentityMapping::root_to(getgid().as_raw()),
        }
    }

    /// Renders both maps ahead of time so they can be written after
    /// `clone(2)` without allocating.
    pub fn rendered(&self) -> RenderedMappings {
        RenderedMappings {
            uid_line: self.uid.map_line(),
            gid_line: self.gid.map_line(),
        }
    }
}

/// Pre-formatted map lines, ready to be written by a freshly cloned child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMappings {
    uid_line: String,
    gid_line: String,
}

impl RenderedMappings {
    /// Writes the maps for the calling process, which must have just
    /// entered a new user namespace.
    ///
    /// `setgroups` is denied first where the kernel exposes it, since an
    /// unprivileged writer may not install a GID map otherwise.
    ///
    /// Runs between `clone` and `exec`: it only opens fixed paths and writes
    /// pre-rendered bytes.
    ///
    /// # Errors
    ///
    /// Returns the OS error of the first write that fails.
    pub fn write_for_self(&self) -> io::Result<()> {
        if Path::new(SETGROUPS_PATH).exists() {
            std::fs::write(SETGROUPS_PATH, b"deny")?;
        }
        std::fs::write(UID_MAP_PATH, self.uid_line.as_bytes())?;
        std::fs::write(GID_MAP_PATH, self.gid_line.as_bytes())?;
        Ok(())
    }
}
