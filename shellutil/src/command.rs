//! Argument-vector command lines.
//!
//! Sort and tar invocations are built as a program plus a vector of
//! arguments and spawned without a shell, so paths containing quotes or
//! spaces need no escaping. [`CommandLine`] renders itself in shell-quoted
//! form for logging and for the CLI's dry-run output.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A program and its arguments, plus an optional working directory.
///
/// Arguments are kept as `OsString`, so paths reach the child byte for byte
/// even when they are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    workdir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(&mut self, path: &Path) -> &mut Self {
        self.arg(path.as_os_str())
    }

    /// Append `flag` immediately followed by `path`, as in `-T/tmp`.
    pub fn flag_path_arg(&mut self, flag: &str, path: &Path) -> &mut Self {
        let mut arg = OsString::from(flag);
        arg.push(path);
        self.arg(arg)
    }

    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Convert into a `std::process::Command` ready for spawning.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Shell-quoted rendering for logs. Non-UTF-8 bytes show as U+FFFD.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_escape(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Quote `input` for a POSIX shell, leaving plain words untouched.
pub fn shell_escape(input: &str) -> String {
    if !input.is_empty()
        && input.chars().all(|ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | ',' | '=')
        })
    {
        return input.to_string();
    }
    let mut escaped = String::from("'");
    for ch in input.chars() {
        if ch == '\'' {
            escaped.push_str("'\"'\"'");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}
