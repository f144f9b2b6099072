//! Linux namespace management for container isolation.
//!
//! The container's first process is created with `clone(2)` carrying every
//! namespace flag, so it is PID 1 of its PID namespace. Before it executes
//! its program it installs its own identity mapping; a failure there is
//! reported to the parent instead of running anything.

pub mod user;
pub mod uts;

use std::ffi::{CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;

use self::user::{IdMappings, RenderedMappings};

/// Stack given to the cloned child until it executes its program.
#[cfg(target_os = "linux")]
const CHILD_STACK_SIZE: usize = 64 * 1024;

/// Which namespaces a container gets.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceSet {
    /// Isolate the mount table.
    pub mount: bool,
    /// Isolate hostname and domain name.
    pub uts: bool,
    /// Isolate System V IPC and POSIX message queues.
    pub ipc: bool,
    /// Isolate process IDs.
    pub pid: bool,
    /// Isolate the network stack.
    pub network: bool,
    /// Isolate user and group IDs.
    pub user: bool,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            mount: true,
            uts: true,
            ipc: true,
            pid: true,
            network: true,
            user: true,
        }
    }
}

#[cfg(target_os = "linux")]
impl NamespaceSet {
    /// The set as `clone(2)`/`unshare(2)` flags.
    pub fn clone_flags(&self) -> nix::sched::CloneFlags {
        use nix::sched::CloneFlags;

        [
            (self.mount, CloneFlags::CLONE_NEWNS),
            (self.uts, CloneFlags::CLONE_NEWUTS),
            (self.ipc, CloneFlags::CLONE_NEWIPC),
            (self.pid, CloneFlags::CLONE_NEWPID),
            (self.network, CloneFlags::CLONE_NEWNET),
            (self.user, CloneFlags::CLONE_NEWUSER),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(CloneFlags::empty(), |acc, (_, flag)| acc | flag)
    }
}

/// A program to execute as the first process of a new namespace set.
///
/// Every buffer the cloned child touches is built by [`IsolatedCommand::new`],
/// so the child itself never allocates.
#[derive(Debug)]
pub struct IsolatedCommand {
    program: CString,
    argv: Vec<CString>,
    namespaces: NamespaceSet,
    mappings: Option<RenderedMappings>,
}

impl IsolatedCommand {
    /// Prepares `program` with `args` (not including `argv[0]`, which is
    /// `program` itself). `mappings` is only installed when `namespaces`
    /// includes a user namespace.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] if the program or an argument
    /// contains a NUL byte.
    pub fn new<I, S>(
        program: impl AsRef<OsStr>,
        args: I,
        namespaces: NamespaceSet,
        mappings: &IdMappings,
    ) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = c_string(program.as_ref())?;
        let mut argv = vec![program.clone()];
        for arg in args {
            argv.push(c_string(arg.as_ref())?);
        }
        Ok(Self {
            program,
            argv,
            namespaces,
            mappings: namespaces.user.then(|| mappings.rendered()),
        })
    }

    /// Clones a child into the namespaces and executes the program there,
    /// with the standard streams inherited.
    ///
    /// The child receives `SIGKILL` if the calling thread exits first, so a
    /// container never outlives the process that created it. Returns once
    /// the program is executing.
    ///
    /// # Errors
    ///
    /// Returns the OS error of `clone(2)`, of writing the identity maps, or
    /// of `execv(2)`, whichever failed first. On error no program runs and
    /// the child has been reaped.
    #[cfg(target_os = "linux")]
    #[allow(unsafe_code)]
    pub fn spawn(&self) -> io::Result<nix::unistd::Pid> {
        use std::fs::File;
        use std::io::Read;
        use std::os::fd::OwnedFd;

        use nix::fcntl::OFlag;
        use nix::sys::signal::Signal;

        let flags = self.namespaces.clone_flags();
        tracing::debug!(?flags, program = ?self.program, "cloning into new namespaces");

        let argv: Vec<*const libc::c_char> = self
            .argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();
        let (read_end, write_end) = nix::unistd::pipe2(OFlag::O_CLOEXEC)?;
        let mut stack = vec![0_u8; CHILD_STACK_SIZE];

        let report = |fd: &OwnedFd, err: &io::Error| -> isize {
            let errno = err.raw_os_error().unwrap_or(libc::EINVAL);
            let _ = nix::unistd::write(fd, &errno.to_ne_bytes());
            127
        };
        let child = Box::new(|| {
            if let Err(e) = nix::sys::prctl::set_pdeathsig(Signal::SIGKILL) {
                return report(&write_end, &e.into());
            }
            if let Some(rendered) = &self.mappings {
                if let Err(e) = rendered.write_for_self() {
                    return report(&write_end, &e);
                }
            }
            // SAFETY: `program` and every `argv` entry are NUL-terminated
            // strings owned by `self`, and `argv` ends with a null pointer.
            let _ = unsafe { libc::execv(self.program.as_ptr(), argv.as_ptr()) };
            report(&write_end, &io::Error::last_os_error())
        });

        // SAFETY: the child runs on its own stack with a copy of this
        // address space. It only issues prctl(2), writes pre-rendered bytes
        // to fixed /proc paths, and execs; nothing it touches is allocated
        // or locked after the clone.
        let pid = unsafe {
            nix::sched::clone(child, &mut stack, flags, Some(Signal::SIGCHLD as libc::c_int))
        }?;
        drop(write_end);

        let mut errno = [0_u8; 4];
        let mut pipe = File::from(read_end);
        let read = loop {
            match pipe.read(&mut errno) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                other => break other?,
            }
        };
        if read == 0 {
            tracing::debug!(%pid, "container process started");
            return Ok(pid);
        }

        let _ = nix::sys::wait::waitpid(pid, None);
        if read == errno.len() {
            Err(io::Error::from_raw_os_error(i32::from_ne_bytes(errno)))
        } else {
            Err(io::Error::other("container process failed before exec"))
        }
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error: namespaces require Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn spawn(&self) -> io::Result<nix::unistd::Pid> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

fn c_string(value: &OsStr) -> io::Result<CString> {
    CString::new(value.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
