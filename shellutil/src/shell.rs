//! Shell command runner with output decoding and failure reporting.

use std::process::Command;
use std::time::Duration;

use tracing::{error, info, instrument};

use crate::command::CommandLine;
use crate::config::ShellConfig;
use crate::decode::Decoder;
use crate::error::{Result, ShellError};
use crate::process::{CommandOutput, run_command};

const NEWLINE: &str = "\n";

/// What to do when a command exits non-zero or writes to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return `ShellError::Subprocess` carrying the decoded stderr.
    #[default]
    Raise,
    /// Fold the stderr text into the returned string.
    Embed,
}

/// Decoded command output, before any error policy is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Stderr segment (on failure) followed by the stdout segment, each
    /// prefixed by a newline.
    pub text: String,
    /// Decoded stderr when the command failed.
    pub error: Option<String>,
}

impl ParsedOutput {
    /// `Err` when the command failed with non-empty stderr, otherwise the text.
    pub fn into_result(self) -> Result<String> {
        match self.error {
            Some(stderr) if !stderr.is_empty() => Err(ShellError::Subprocess { stderr }),
            _ => Ok(self.text),
        }
    }
}

/// Runs commands synchronously and turns their output into text.
#[derive(Debug, Clone, Default)]
pub struct ShellCaller {
    decoder: Decoder,
    policy: ErrorPolicy,
    timeout: Option<Duration>,
}

impl ShellCaller {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ShellConfig) -> Result<Self> {
        let decoder = Decoder::from_labels(&config.primary_encoding, &config.fallback_encoding)?;
        let policy = if config.raise_on_error {
            ErrorPolicy::Raise
        } else {
            ErrorPolicy::Embed
        };
        Ok(Self {
            decoder,
            policy,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Kill commands that run longer than `timeout`. Unset by default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Run `command` through `sh -c` and capture its raw output.
    ///
    /// The shell interprets quoting and globbing; callers are responsible for
    /// escaping anything they interpolate.
    pub fn call_subprocess(&self, command: &str) -> Result<CommandOutput> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        self.spawn(cmd, command)
    }

    /// Run an argument-vector command line without a shell.
    pub fn run(&self, command: &CommandLine) -> Result<CommandOutput> {
        self.spawn(command.to_command(), &command.to_string())
    }

    fn spawn(&self, cmd: Command, label: &str) -> Result<CommandOutput> {
        let output = run_command(cmd, label, self.timeout)?;
        if output.timed_out {
            return Err(ShellError::Timeout {
                command: label.to_string(),
                timeout: self.timeout.unwrap_or_default(),
            });
        }
        Ok(output)
    }

    /// Decode `output` and apply this caller's error policy.
    pub fn parse_result(&self, output: &CommandOutput) -> Result<String> {
        let parsed = self.decode_output(output)?;
        match self.policy {
            ErrorPolicy::Raise => parsed.into_result(),
            ErrorPolicy::Embed => Ok(parsed.text),
        }
    }

    /// Decode stderr (when the command failed) and stdout, logging each.
    pub fn decode_output(&self, output: &CommandOutput) -> Result<ParsedOutput> {
        let mut parsed = ParsedOutput::default();

        if output.failed() {
            let stderr = self.decoder.decode(&output.stderr)?;
            parsed.text.push_str(NEWLINE);
            parsed.text.push_str(&stderr);
            error!(exit_code = ?output.code, "{NEWLINE}{stderr}");
            parsed.error = Some(stderr);
        }
        if !output.stdout.is_empty() {
            let stdout = self.decoder.decode(&output.stdout)?;
            parsed.text.push_str(NEWLINE);
            parsed.text.push_str(&stdout);
            info!("{NEWLINE}{stdout}");
        }

        Ok(parsed)
    }

    /// Run a shell command string, then parse its result.
    #[instrument(skip(self))]
    pub fn call_and_parse(&self, command: &str) -> Result<String> {
        let output = self.call_subprocess(command)?;
        self.parse_result(&output)
    }

    /// Run an argument-vector command line, then parse its result.
    #[instrument(skip_all, fields(command = %command))]
    pub fn run_and_parse(&self, command: &CommandLine) -> Result<String> {
        let output = self.run(command)?;
        self.parse_result(&output)
    }

    /// Decode one byte string with the primary/fallback encodings.
    pub fn decode_return(&self, bytes: &[u8]) -> Result<String> {
        self.decoder.decode(bytes)
    }

    /// Decode each byte string independently, joining with leading newlines.
    pub fn decode_lines<B: AsRef<[u8]>>(&self, lines: &[B]) -> Result<String> {
        self.decoder.decode_lines(lines)
    }
}
