//! # tinysh
//!
//! Minimal line-oriented shell for use inside a container root that has
//! no other programs. Supports `cat`, `cd`, `env`, `hostname`, `ls`,
//! `pwd`, and `quit`/`exit`.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod command;
mod repl;

use std::io;

fn main() -> anyhow::Result<()> {
    let start = std::env::current_dir()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = repl::Shell::new(start);
    shell.run(stdin.lock(), stdout.lock())?;
    Ok(())
}
