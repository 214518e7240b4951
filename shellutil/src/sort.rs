//! Builder and runner for external `sort` invocations.
//!
//! [`SortOptions`] validates values as they are assigned, so a `Sorter`
//! never builds a command line from an invalid delimiter or buffer size.
//! The actual sorting is done by the `sort` binary on PATH.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument};

use crate::command::CommandLine;
use crate::config::SortDefaults;
use crate::error::{Result, ShellError};
use crate::shell::{ErrorPolicy, ShellCaller};

const SORT_PROGRAM: &str = "sort";

static BUFFER_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d*[MG]$").unwrap());

/// Check a `sort -S` buffer size: digits followed by `M` or `G`.
pub fn validate_buffer_size(value: &str) -> Result<()> {
    if BUFFER_SIZE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ShellError::validation(format!(
            "buffer_size should be formatted as ...M or ...G, got '{value}'"
        )))
    }
}

/// Check a field delimiter: exactly one character.
pub fn validate_delimiter(value: &str) -> Result<()> {
    if value.chars().count() == 1 {
        Ok(())
    } else {
        Err(ShellError::validation(format!(
            "delimiter should be exactly 1 character, got '{value}'"
        )))
    }
}

/// Raw key option text and its shell-word split.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SortKey {
    raw: String,
    words: Vec<String>,
}

/// Options for one or more `sort` invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions {
    delimiter: Option<String>,
    ignore_leading_blanks: bool,
    ignore_case: bool,
    ignore_unprintable: bool,
    buffer_size: Option<String>,
    tempdir: Option<PathBuf>,
    output_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    sort_key: Option<SortKey>,
    parallel: Option<u32>,
}

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed options from config defaults, validating them.
    pub fn from_defaults(defaults: &SortDefaults) -> Result<Self> {
        let mut options = Self::new();
        options.set_ignore_leading_blanks(defaults.ignore_leading_blanks);
        options.set_ignore_case(defaults.ignore_case);
        options.set_ignore_unprintable(defaults.ignore_unprintable);
        if let Some(size) = &defaults.buffer_size {
            options.set_buffer_size(size)?;
        }
        if let Some(dir) = &defaults.tempdir {
            options.set_tempdir(dir);
        }
        if let Some(parallel) = defaults.parallel {
            options.set_parallel(parallel);
        }
        Ok(options)
    }

    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    pub fn set_delimiter(&mut self, value: &str) -> Result<()> {
        validate_delimiter(value)?;
        self.delimiter = Some(value.to_string());
        Ok(())
    }

    pub fn ignore_leading_blanks(&self) -> bool {
        self.ignore_leading_blanks
    }

    pub fn set_ignore_leading_blanks(&mut self, value: bool) {
        self.ignore_leading_blanks = value;
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn set_ignore_case(&mut self, value: bool) {
        self.ignore_case = value;
    }

    pub fn ignore_unprintable(&self) -> bool {
        self.ignore_unprintable
    }

    pub fn set_ignore_unprintable(&mut self, value: bool) {
        self.ignore_unprintable = value;
    }

    pub fn buffer_size(&self) -> Option<&str> {
        self.buffer_size.as_deref()
    }

    pub fn set_buffer_size(&mut self, value: &str) -> Result<()> {
        validate_buffer_size(value)?;
        self.buffer_size = Some(value.to_string());
        Ok(())
    }

    pub fn tempdir(&self) -> Option<&Path> {
        self.tempdir.as_deref()
    }

    pub fn set_tempdir(&mut self, value: impl Into<PathBuf>) {
        self.tempdir = Some(value.into());
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    pub fn set_output_file(&mut self, value: impl Into<PathBuf>) {
        self.output_file = Some(value.into());
    }

    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    pub fn set_input_file(&mut self, value: impl Into<PathBuf>) {
        self.input_file = Some(value.into());
    }

    pub fn sort_key_option(&self) -> Option<&str> {
        self.sort_key.as_ref().map(|key| key.raw.as_str())
    }

    /// Set free-form key options such as `-k4,4 -k1,3`.
    ///
    /// The text is split with POSIX shell word rules; unbalanced quotes are
    /// rejected here rather than at sort time.
    pub fn set_sort_key_option(&mut self, value: &str) -> Result<()> {
        let words = shlex::split(value).ok_or_else(|| {
            ShellError::validation(format!("sort key option has unbalanced quotes: '{value}'"))
        })?;
        self.sort_key = Some(SortKey {
            raw: value.to_string(),
            words,
        });
        Ok(())
    }

    pub fn parallel(&self) -> Option<u32> {
        self.parallel
    }

    pub fn set_parallel(&mut self, value: u32) {
        self.parallel = Some(value);
    }

    /// Build the `sort` command line from the current options.
    pub fn command_line(&self) -> CommandLine {
        let mut cmd = CommandLine::new(SORT_PROGRAM);
        if self.ignore_leading_blanks {
            cmd.arg("-b");
        }
        if self.ignore_case {
            cmd.arg("-f");
        }
        if self.ignore_unprintable {
            cmd.arg("-i");
        }
        if let Some(size) = &self.buffer_size {
            cmd.arg(format!("-S{size}"));
        }
        if let Some(delimiter) = &self.delimiter {
            cmd.arg(format!("-t{delimiter}"));
        }
        if let Some(parallel) = self.parallel.filter(|&n| n > 0) {
            cmd.arg(format!("--parallel={parallel}"));
        }
        if let Some(key) = &self.sort_key {
            cmd.args(key.words.iter().cloned());
        }
        if let Some(dir) = non_empty(&self.tempdir) {
            cmd.flag_path_arg("-T", dir);
        }
        if let Some(output) = non_empty(&self.output_file) {
            cmd.flag_path_arg("-o", output);
        }
        if let Some(input) = non_empty(&self.input_file) {
            cmd.path_arg(input);
        }
        cmd
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Runs `sort` with a persistent option set.
#[derive(Debug, Clone, Default)]
pub struct Sorter {
    options: SortOptions,
    shell: ShellCaller,
}

impl Sorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SortOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Use `shell` for decoding and timeouts. Its error policy is always
    /// overridden to [`ErrorPolicy::Raise`].
    pub fn with_shell(mut self, shell: ShellCaller) -> Self {
        self.shell = shell.with_policy(ErrorPolicy::Raise);
        self
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SortOptions {
        &mut self.options
    }

    /// Sort `input` into `output`.
    ///
    /// Each provided argument overwrites the stored option before the command
    /// is built; omitted ones keep their previous value, so repeated calls on
    /// the same `Sorter` reuse earlier settings.
    #[instrument(skip_all)]
    pub fn sort(
        &mut self,
        input: Option<&Path>,
        output: Option<&Path>,
        sort_key: Option<&str>,
        delimiter: Option<&str>,
    ) -> Result<String> {
        if let Some(input) = input.filter(|p| !p.as_os_str().is_empty()) {
            self.options.set_input_file(input);
        }
        if let Some(output) = output.filter(|p| !p.as_os_str().is_empty()) {
            self.options.set_output_file(output);
        }
        if let Some(key) = sort_key.filter(|k| !k.is_empty()) {
            self.options.set_sort_key_option(key)?;
        }
        if let Some(delimiter) = delimiter.filter(|d| !d.is_empty()) {
            self.options.set_delimiter(delimiter)?;
        }

        let command = self.options.command_line();
        info!("{command}");

        self.shell.run_and_parse(&command)
    }
}
