//! The read-eval-print loop.

use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};

use crate::command::Command;

const PROMPT: &str = "ts: ";

/// Shell state: the working-directory notion and where `cd` returns to.
///
/// The working directory is the shell's own; the process directory is
/// never changed.
#[derive(Debug)]
pub struct Shell {
    pwd: PathBuf,
    home: PathBuf,
}

impl Shell {
    /// Starts a shell whose working and home directory are `start`.
    pub fn new(start: PathBuf) -> Self {
        Self {
            home: start.clone(),
            pwd: start,
        }
    }

    /// Reads commands from `input` until `quit`, `exit`, or end of input.
    ///
    /// Command failures are reported on `output` and do not stop the loop.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading `input` or writing `output` fails.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        writeln!(output, "tinysh started")?;
        writeln!(
            output,
            "Valid commands: cat, cd [dir], env, hostname, ls, pwd, quit"
        )?;

        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }
            match Command::parse(&line) {
                Command::Quit => break,
                command => self.dispatch(command, &mut output)?,
            }
        }

        writeln!(output, "tinysh ended")
    }

    fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<()> {
        match command {
            Command::Cat(file) => self.cat(&file, out),
            Command::Cd(dir) => {
                self.pwd = match dir {
                    Some(dir) => resolve(&self.pwd, &dir),
                    None => self.home.clone(),
                };
                Ok(())
            }
            Command::Env => {
                for (key, value) in std::env::vars_os() {
                    writeln!(out, "{}={}", key.to_string_lossy(), value.to_string_lossy())?;
                }
                Ok(())
            }
            Command::Hostname => match nix::unistd::gethostname() {
                Ok(name) => writeln!(out, "Hostname: {}", name.to_string_lossy()),
                Err(e) => writeln!(out, "Error: {e}"),
            },
            Command::Ls(dir) => self.ls(&dir, out),
            Command::Pwd => writeln!(out, "{}", self.pwd.display()),
            Command::Empty | Command::Quit => Ok(()),
            Command::Unknown(name) => writeln!(out, "Unknown command: {name}"),
        }
    }

    fn cat<W: Write>(&self, file: &str, out: &mut W) -> io::Result<()> {
        let path = resolve(&self.pwd, file);
        match std::fs::read(&path) {
            Ok(bytes) => out.write_all(&bytes),
            Err(e) => writeln!(out, "Error reading {}: {e}", path.display()),
        }
    }

    fn ls<W: Write>(&self, dir: &str, out: &mut W) -> io::Result<()> {
        let path = resolve(&self.pwd, dir);
        writeln!(out, "Files in: {}", path.display())?;
        let entries = match std::fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) => return writeln!(out, "Error: {e}"),
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        for name in names {
            writeln!(out, "\t{name}")?;
        }
        Ok(())
    }
}

/// Joins `arg` onto `pwd` (or takes it as is when absolute) and folds `.`
/// and `..` lexically.
fn resolve(pwd: &Path, arg: &str) -> PathBuf {
    let mut resolved = PathBuf::from("/");
    for component in pwd.join(arg).components() {
        match component {
            Component::ParentDir => {
                let _ = resolved.pop();
            }
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session(shell: &mut Shell, input: &str) -> String {
        let mut output = Vec::new();
        shell.run(Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn resolve_handles_relative_absolute_and_parent() {
        let pwd = Path::new("/home/user");
        assert_eq!(resolve(pwd, "docs"), PathBuf::from("/home/user/docs"));
        assert_eq!(resolve(pwd, "/etc"), PathBuf::from("/etc"));
        assert_eq!(resolve(pwd, "../other/./x"), PathBuf::from("/home/other/x"));
        assert_eq!(resolve(pwd, "../../.."), PathBuf::from("/"));
        assert_eq!(resolve(pwd, ""), PathBuf::from("/home/user"));
    }

    #[test]
    fn cd_moves_and_bare_cd_returns_home() {
        let mut shell = Shell::new(PathBuf::from("/start"));
        let out = session(&mut shell, "cd /etc\npwd\ncd\npwd\nquit\n");
        assert!(out.contains("ts: /etc\n"));
        assert!(out.contains("ts: /start\n"));
        assert_eq!(shell.pwd, Path::new("/start"));
    }

    #[test]
    fn ls_lists_sorted_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        let mut shell = Shell::new(dir.path().to_path_buf());
        let out = session(&mut shell, "ls\nexit\n");
        assert!(out.contains(&format!("Files in: {}\n\ta.txt\n\tb.txt\n", dir.path().display())));
    }

    #[test]
    fn cat_prints_file_relative_to_pwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/hello.txt"), b"hello\n").unwrap();
        let mut shell = Shell::new(dir.path().to_path_buf());
        let out = session(&mut shell, "cd sub\ncat hello.txt\nquit\n");
        assert!(out.contains("ts: hello\n"));
    }

    #[test]
    fn errors_are_reported_and_the_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = Shell::new(dir.path().to_path_buf());
        let out = session(&mut shell, "cat missing\nls missing\nfrobnicate\npwd\nquit\n");
        assert!(out.contains("Error reading"));
        assert!(out.contains("Error: "));
        assert!(out.contains("Unknown command: frobnicate\n"));
        assert!(out.contains(&format!("ts: {}\n", dir.path().display())));
    }

    #[test]
    fn end_of_input_ends_the_session() {
        let mut shell = Shell::new(PathBuf::from("/"));
        let out = session(&mut shell, "pwd\n");
        assert!(out.ends_with("tinysh ended\n"));
    }

    #[test]
    fn env_prints_one_line_per_variable() {
        let mut shell = Shell::new(PathBuf::from("/"));
        let out = session(&mut shell, "env\nquit\n");
        let body_lines = out.lines().filter(|l| l.contains('=')).count();
        assert!(body_lines >= std::env::vars_os().count());
    }

    #[test]
    fn hostname_is_printed() {
        let mut shell = Shell::new(PathBuf::from("/"));
        let out = session(&mut shell, "hostname\nquit\n");
        assert!(out.contains("Hostname: ") || out.contains("Error: "));
    }
}
