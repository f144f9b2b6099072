//! # tinybox-common
//!
//! Shared types, error definitions, policy configuration, and constants
//! used across the tinybox workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and performs no namespace or mount operations.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
