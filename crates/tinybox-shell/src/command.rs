//! Parsing of shell input lines.

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a file.
    Cat(String),
    /// Change directory; `None` returns to the start directory.
    Cd(Option<String>),
    /// Print the environment.
    Env,
    /// Print the hostname.
    Hostname,
    /// List a directory; empty means the working directory.
    Ls(String),
    /// Print the working directory.
    Pwd,
    /// Leave the shell.
    Quit,
    /// Blank line.
    Empty,
    /// Anything else.
    Unknown(String),
}

impl Command {
    /// Parses a line. The first word is the command; a second word is its
    /// argument only when the line has exactly two words.
    pub fn parse(line: &str) -> Self {
        let words: Vec<&str> = line.split_whitespace().collect();
        let arg = match words.as_slice() {
            [_, arg] => Some((*arg).to_string()),
            _ => None,
        };
        match words.first().copied() {
            None => Self::Empty,
            Some("cat") => Self::Cat(arg.unwrap_or_default()),
            Some("cd") => Self::Cd(arg),
            Some("env") => Self::Env,
            Some("hostname") => Self::Hostname,
            Some("ls") => Self::Ls(arg.unwrap_or_default()),
            Some("pwd") => Self::Pwd,
            Some("quit" | "exit") => Self::Quit,
            Some(other) => Self::Unknown(other.to_string()),
        }
    }
}
