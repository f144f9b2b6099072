//! System-wide constants and default policy values.

/// Name of the staging directory that receives the old root during the pivot.
pub const PIVOT_STAGING_DIR: &str = ".pivot_root";

/// Permission bits of the staging directory.
pub const PIVOT_STAGING_MODE: u32 = 0o700;

/// Hostname given to the container when none is configured.
pub const DEFAULT_HOSTNAME: &str = "tinybox";

/// `PATH` handed to the target program when no environment is configured.
pub const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Marker variable set for the target program when no environment is configured.
pub const CONTAINER_MARKER_VAR: &str = "TINYBOX";

/// Path the launcher re-executes to start the initializer role.
pub const SELF_EXE: &str = "/proc/self/exe";

/// `--x-action` value selecting the launcher role.
pub const ACTION_CREATE: &str = "create";

/// `--x-action` value selecting the initializer role.
pub const ACTION_LAUNCH_SHELL: &str = "launch-shell";

/// Offset added to a signal number when a process is killed by that signal.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Binary name of the launcher.
pub const BIN_NAME: &str = "tinybox";
