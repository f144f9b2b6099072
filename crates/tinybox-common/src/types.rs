//! Domain types shared by the launcher and the initializer.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ContainerPolicy;
use crate::constants::{ACTION_CREATE, ACTION_LAUNCH_SHELL, SIGNAL_EXIT_BASE};
use crate::error::{Result, TinyboxError};

/// Which half of the launch protocol this process performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Spawn the container and wait for it.
    Create,
    /// Already inside the new namespaces: pivot and run the target.
    LaunchInitializer,
}

impl Role {
    /// The `--x-action` value that selects this role.
    pub const fn action(self) -> &'static str {
        match self {
            Self::Create => ACTION_CREATE,
            Self::LaunchInitializer => ACTION_LAUNCH_SHELL,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// A validated, immutable description of one container launch.
///
/// Built once at process entry and passed by reference to every
/// component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    root: PathBuf,
    target: PathBuf,
    target_args: Vec<String>,
    role: Role,
    policy: ContainerPolicy,
}

impl LaunchRequest {
    /// Validates the inputs and builds a request.
    ///
    /// For [`Role::Create`] the root is resolved to an absolute, canonical
    /// path and must be an existing directory. For
    /// [`Role::LaunchInitializer`] it must already be absolute, since the
    /// launcher resolved it.
    ///
    /// # Errors
    ///
    /// Returns [`TinyboxError::Usage`] if either path is empty or the root
    /// does not satisfy the checks above.
    pub fn new(
        root: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        target_args: Vec<String>,
        role: Role,
        policy: ContainerPolicy,
    ) -> Result<Self> {
        let root = root.into();
        let target = target.into();
        if root.as_os_str().is_empty() {
            return Err(TinyboxError::usage("--root is required"));
        }
        if target.as_os_str().is_empty() {
            return Err(TinyboxError::usage("--shell is required"));
        }

        let root = match role {
            Role::Create => resolve_root(&root)?,
            Role::LaunchInitializer if root.is_absolute() => root,
            Role::LaunchInitializer => {
                return Err(TinyboxError::usage(format!(
                    "initializer root must be absolute: {}",
                    root.display()
                )));
            }
        };

        Ok(Self {
            root,
            target,
            target_args,
            role,
            policy,
        })
    }

    /// Directory that becomes the container's `/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target program, interpreted inside the new root.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Arguments passed to the target program.
    pub fn target_args(&self) -> &[String] {
        &self.target_args
    }

    /// Role this process plays.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Hostname and environment policy.
    pub const fn policy(&self) -> &ContainerPolicy {
        &self.policy
    }

    /// Same request, handed over to the initializer role.
    #[must_use]
    pub fn for_initializer(&self) -> Self {
        Self {
            role: Role::LaunchInitializer,
            ..self.clone()
        }
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let resolved = std::fs::canonicalize(root).map_err(|e| {
        TinyboxError::usage(format!("cannot resolve --root {}: {e}", root.display()))
    })?;
    if !resolved.is_dir() {
        return Err(TinyboxError::usage(format!(
            "--root is not a directory: {}",
            resolved.display()
        )));
    }
    if resolved == Path::new("/") {
        return Err(TinyboxError::usage("--root must not be the host root"));
    }
    Ok(resolved)
}

/// One step of the root pivot sequence, named for error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PivotStep {
    /// Mark the inherited mount tree private.
    MakePrivate,
    /// Bind-mount the new root onto itself.
    BindRoot,
    /// Create the staging directory for the old root.
    CreateStaging,
    /// Swap the roots.
    PivotRoot,
    /// Move the working directory to the new `/`.
    ChdirRoot,
    /// Lazily detach the old root.
    DetachOldRoot,
    /// Remove the empty staging directory.
    RemoveStaging,
}

impl fmt::Display for PivotStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MakePrivate => "make mounts private",
            Self::BindRoot => "bind-mount new root",
            Self::CreateStaging => "create staging directory",
            Self::PivotRoot => "pivot_root",
            Self::ChdirRoot => "chdir to new root",
            Self::DetachOldRoot => "detach old root",
            Self::RemoveStaging => "remove staging directory",
        };
        f.write_str(name)
    }
}

/// Where the root binding stands during the pivot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PivotStage {
    /// Nothing mounted yet.
    Unbound,
    /// New root bind-mounted onto itself.
    SelfBound,
    /// `pivot_root(2)` done: the old root is mounted on the staging
    /// directory inside the new root.
    PivotStaged,
    /// Working directory moved onto the swapped root.
    Pivoted,
    /// Old root unmounted and staging directory removed.
    OldRootDetached,
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with a status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl ExitOutcome {
    /// Exit code this process should report for the outcome.
    pub const fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => SIGNAL_EXIT_BASE + signal,
        }
    }

    /// Whether the child exited with status zero.
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}
