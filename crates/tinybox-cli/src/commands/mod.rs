//! CLI definition and role dispatch.

pub mod create;
pub mod launch_shell;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, ValueEnum};
use tinybox_common::config::ContainerPolicy;
use tinybox_common::constants::DEFAULT_HOSTNAME;
use tinybox_common::error::TinyboxError;
use tinybox_common::types::{ExitOutcome, LaunchRequest, Role};

const EXAMPLE: &str = "\
Example:
  $ tinybox --root=/srv/rootfs --shell=/bin/tinysh
  $ tinybox --root=/srv/rootfs --shell=/bin/sh -- -c 'echo hello'";

/// Run a program in new namespaces with a swapped root.
#[derive(Parser, Debug)]
#[command(name = "tinybox", version, about, long_about = None, after_help = EXAMPLE)]
pub struct Cli {
    /// Full path of the directory to mount as root in the container. Required.
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Program to run, interpreted inside the new root. Required.
    #[arg(long, value_name = "PATH")]
    pub shell: Option<PathBuf>,

    /// Hostname inside the container.
    #[arg(long, env = "TINYBOX_HOSTNAME", default_value = DEFAULT_HOSTNAME)]
    pub hostname: String,

    /// Environment of the program (repeatable). Replaces the default environment.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Used internally. Please ignore.
    #[arg(long = "x-action", value_enum, default_value_t = Action::Create, hide = true)]
    pub action: Action,

    /// Arguments passed to the program.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Role selected by `--x-action`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the container and wait for it.
    Create,
    /// Run inside an already created container.
    #[value(name = "launch-shell")]
    LaunchShell,
}

impl From<Action> for Role {
    fn from(action: Action) -> Self {
        match action {
            Action::Create => Self::Create,
            Action::LaunchShell => Self::LaunchInitializer,
        }
    }
}

impl Cli {
    /// Validates the arguments into a launch request.
    ///
    /// # Errors
    ///
    /// Returns [`TinyboxError::Usage`] if `--root` or `--shell` is missing or
    /// the root or policy values are invalid.
    pub fn into_request(self) -> Result<LaunchRequest, TinyboxError> {
        let (Some(root), Some(shell)) = (self.root, self.shell) else {
            return Err(TinyboxError::usage("--root and --shell are required"));
        };
        let policy = ContainerPolicy::new(self.hostname, &self.env)?;
        LaunchRequest::new(root, shell, self.args, self.action.into(), policy)
    }
}

/// Validates the arguments and runs the selected role.
///
/// Usage errors print the help text and return before any namespace or
/// mount operation.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the selected role fails.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let request = match cli.into_request() {
        Ok(request) => request,
        Err(err) => {
            let help = Cli::command().render_help();
            let _ = writeln!(std::io::stderr(), "{help}");
            return Err(err.into());
        }
    };

    let outcome = match request.role() {
        Role::Create => create::execute(&request)?,
        Role::LaunchInitializer => launch_shell::execute(&request)?,
    };
    Ok(ExitCode::from(exit_code(outcome)))
}

fn exit_code(outcome: ExitOutcome) -> u8 {
    u8::try_from(outcome.code()).unwrap_or(1)
}
