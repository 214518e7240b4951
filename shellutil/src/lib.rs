//! Thin wrappers for running shell commands, `sort`, and `tar`.
//!
//! Each operation builds a command line, runs it as a blocking subprocess,
//! decodes stdout/stderr to text and reports failure when the command exits
//! non-zero or writes to stderr.
//!
//! - **[`shell`]**: [`ShellCaller`] runs shell strings or argument vectors and
//!   applies an [`ErrorPolicy`] to the decoded output.
//! - **[`sort`]**: [`Sorter`] builds `sort` invocations from validated
//!   [`SortOptions`].
//! - **[`tar`]**: [`Tar`] compresses and extracts gzip tarballs.
//!
//! Lower layers ([`process`], [`decode`], [`command`]) are public for callers
//! that need raw output or custom command lines.

pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod process;
pub mod shell;
pub mod sort;
pub mod tar;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Result, ShellError};
pub use shell::{ErrorPolicy, ParsedOutput, ShellCaller};
pub use sort::{SortOptions, Sorter};
pub use tar::Tar;
