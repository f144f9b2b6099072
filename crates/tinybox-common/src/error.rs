//! Unified error type for the tinybox workspace.
//!
//! The taxonomy is closed: every failure is a usage problem, a rejected
//! privileged kernel operation, a failed pivot step, or a target program
//! that could not be started. A target that starts and exits non-zero is
//! not an error; its status is propagated instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::PivotStep;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TinyboxError {
    /// Required arguments are missing or invalid.
    #[error("usage: {message}")]
    Usage {
        /// Description of the invalid input.
        message: String,
    },

    /// The kernel rejected a namespace, identity-mapping, or spawn request.
    #[error("{operation} failed: {source}")]
    Privilege {
        /// The operation that was refused.
        operation: &'static str,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A step of the root pivot sequence failed.
    #[error("pivot sequence failed at {step}: {source}")]
    Pivot {
        /// The step that failed.
        step: PivotStep,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The target program could not be started inside the container.
    #[error("failed to run target program {}: {source}", program.display())]
    Target {
        /// Path of the target program, relative to the new root.
        program: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },
}

impl TinyboxError {
    /// Builds a [`TinyboxError::Usage`] from any message.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Process exit code reported for this error.
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TinyboxError>;
