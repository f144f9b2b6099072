//! Root filesystem switching via `pivot_root(2)`.
//!
//! The sequence is strictly ordered and stops at the first failure. There
//! is no rollback: the kernel offers no safe undo for a pivot, so a failed
//! sequence must end with the whole namespace being discarded.

use std::io;
use std::path::{Path, PathBuf};

use tinybox_common::constants::{PIVOT_STAGING_DIR, PIVOT_STAGING_MODE};
use tinybox_common::error::{Result, TinyboxError};
use tinybox_common::types::{PivotStage, PivotStep};

use super::mount;

/// Kernel operations the pivot sequence is built from.
pub trait PivotOps {
    /// Marks the inherited mount tree private.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn make_private(&mut self) -> io::Result<()>;

    /// Bind-mounts `new_root` onto itself, recursively.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn bind_self(&mut self, new_root: &Path) -> io::Result<()>;

    /// Creates the staging directory; an existing directory is fine.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn create_staging(&mut self, staging: &Path) -> io::Result<()>;

    /// Swaps the root, moving the old one to `put_old`.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn pivot(&mut self, new_root: &Path, put_old: &Path) -> io::Result<()>;

    /// Changes the working directory to the new `/`.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn chdir_root(&mut self) -> io::Result<()>;

    /// Lazily unmounts the old root.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn detach(&mut self, old_root: &Path) -> io::Result<()>;

    /// Removes the now-empty staging directory.
    ///
    /// # Errors
    ///
    /// Returns the OS error on failure.
    fn remove_staging(&mut self, staging: &Path) -> io::Result<()>;
}

/// [`PivotOps`] backed by real syscalls.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelPivot;

impl PivotOps for KernelPivot {
    fn make_private(&mut self) -> io::Result<()> {
        mount::make_private_recursive()
    }

    fn bind_self(&mut self, new_root: &Path) -> io::Result<()> {
        mount::bind_mount_self(new_root)
    }

    fn create_staging(&mut self, staging: &Path) -> io::Result<()> {
        create_staging_dir(staging)
    }

    #[cfg(target_os = "linux")]
    fn pivot(&mut self, new_root: &Path, put_old: &Path) -> io::Result<()> {
        Ok(nix::unistd::pivot_root(new_root, put_old)?)
    }

    #[cfg(not(target_os = "linux"))]
    fn pivot(&mut self, _new_root: &Path, _put_old: &Path) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn chdir_root(&mut self) -> io::Result<()> {
        std::env::set_current_dir("/")
    }

    fn detach(&mut self, old_root: &Path) -> io::Result<()> {
        mount::detach(old_root)
    }

    fn remove_staging(&mut self, staging: &Path) -> io::Result<()> {
        // Non-recursive: if the detach somehow left the old root attached,
        // this fails instead of walking into host files.
        std::fs::remove_dir(staging)
    }
}

/// Creates `staging` with owner-only permissions. Succeeds if it already
/// exists as a directory, e.g. left over from an aborted run.
///
/// # Errors
///
/// Returns the OS error if the directory cannot be created.
pub fn create_staging_dir(staging: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(PIVOT_STAGING_MODE)
        .create(staging)
}

/// Drives a [`PivotOps`] implementation through the pivot sequence.
#[derive(Debug)]
pub struct RootPivot<O> {
    ops: O,
    new_root: PathBuf,
    stage: PivotStage,
}

impl<O: PivotOps> RootPivot<O> {
    /// Prepares a pivot into `new_root`. Nothing is touched yet.
    pub fn new(ops: O, new_root: impl Into<PathBuf>) -> Self {
        Self {
            ops,
            new_root: new_root.into(),
            stage: PivotStage::Unbound,
        }
    }

    /// Stage reached so far.
    pub const fn stage(&self) -> PivotStage {
        self.stage
    }

    /// Staging directory as seen before the pivot.
    pub fn staging_dir(&self) -> PathBuf {
        self.new_root.join(PIVOT_STAGING_DIR)
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns [`TinyboxError::Pivot`] naming the first step that failed.
    /// The remaining steps are not attempted.
    pub fn run(&mut self) -> Result<()> {
        let staging = self.staging_dir();
        let old_root = Path::new("/").join(PIVOT_STAGING_DIR);
        tracing::info!(new_root = %self.new_root.display(), "performing pivot_root");

        step(PivotStep::MakePrivate, self.ops.make_private())?;
        step(PivotStep::BindRoot, self.ops.bind_self(&self.new_root))?;
        self.stage = PivotStage::SelfBound;

        step(PivotStep::CreateStaging, self.ops.create_staging(&staging))?;
        step(PivotStep::PivotRoot, self.ops.pivot(&self.new_root, &staging))?;
        self.stage = PivotStage::PivotStaged;

        step(PivotStep::ChdirRoot, self.ops.chdir_root())?;
        self.stage = PivotStage::Pivoted;

        step(PivotStep::DetachOldRoot, self.ops.detach(&old_root))?;
        step(PivotStep::RemoveStaging, self.ops.remove_staging(&old_root))?;
        self.stage = PivotStage::OldRootDetached;

        tracing::info!("root pivoted, old root detached");
        Ok(())
    }

    /// Consumes the sequencer, returning the operations backend.
    pub fn into_ops(self) -> O {
        self.ops
    }
}

fn step(step: PivotStep, outcome: io::Result<()>) -> Result<()> {
    outcome.map_err(|source| {
        tracing::error!(%step, error = %source, "pivot step failed");
        TinyboxError::Pivot { step, source }
    })?;
    tracing::debug!(%step, "pivot step done");
    Ok(())
}
