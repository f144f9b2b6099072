//! Filesystem management for container isolation.
//!
//! Provides the mount helpers and the `pivot_root` sequence that swaps the
//! container's root filesystem.

pub mod mount;
pub mod pivot_root;
