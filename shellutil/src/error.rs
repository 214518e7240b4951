//! Error taxonomy shared by the shell, sort, and tar wrappers.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while building, running, or post-processing a command.
#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    /// The child process could not be spawned or waited on.
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The command exited non-zero or wrote to stderr.
    #[error("{stderr}")]
    Subprocess { stderr: String },

    /// The command outlived its configured timeout and was killed.
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Output bytes were valid in neither the primary nor the fallback encoding.
    #[error("output is not valid {primary} or {fallback}")]
    Decode {
        primary: &'static str,
        fallback: &'static str,
    },

    /// An option value was rejected at assignment time.
    #[error("invalid value: {0}")]
    Validation(String),

    /// Filesystem failure while moving archives or extracted entries.
    #[error("I/O error while accessing {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stderr text carried by a subprocess failure, if this is one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Subprocess { stderr } => Some(stderr),
            _ => None,
        }
    }
}

/// Result alias for the library.
pub type Result<T> = std::result::Result<T, ShellError>;
