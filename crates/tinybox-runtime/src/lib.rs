//! Launch protocol for tinybox containers.
//!
//! One binary plays two roles. The [`launcher`] re-executes it inside new
//! namespaces; the re-executed copy runs the [`initializer`], which pivots
//! into the container root and runs the target program.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod exec;
pub mod initializer;
pub mod interrupt;
pub mod launcher;
pub mod process;
