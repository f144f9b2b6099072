//! # tinybox
//!
//! Runs one program inside fresh Linux namespaces with a swapped root
//! filesystem, using nothing but kernel primitives.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use tinybox_common::constants::BIN_NAME;
use tinybox_common::error::TinyboxError;

use crate::commands::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::execute(cli) {
        Ok(code) => code,
        Err(err) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{BIN_NAME}: {err:#}");
            }
            let code = err
                .downcast_ref::<TinyboxError>()
                .map_or(1, TinyboxError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
