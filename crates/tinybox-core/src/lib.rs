//! # tinybox-core
//!
//! Low-level Linux isolation primitives for tinybox.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: one-shot creation of mount, UTS, IPC, PID, network,
//!   and user namespaces with UID/GID mapping, and hostname setting.
//! - **Filesystem**: recursive self bind mounts, lazy detaches, and the
//!   ordered `pivot_root` sequence.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
pub mod namespace;
