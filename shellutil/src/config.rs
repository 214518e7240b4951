//! Configuration stored in `shellutil.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::decode::Decoder;
use crate::sort::validate_buffer_size;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "shellutil.toml";

/// Shell caller and sort defaults (TOML).
///
/// Missing fields take the same values as the library defaults, so an empty
/// file behaves exactly like no file at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Return an error on non-zero exit or stderr output instead of embedding
    /// the stderr text in the result.
    pub raise_on_error: bool,

    /// Encoding tried first when decoding command output.
    pub primary_encoding: String,

    /// Encoding tried when the primary one fails.
    pub fallback_encoding: String,

    /// Kill commands after this many seconds. Unset means wait forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    pub sort: SortDefaults,
}

/// Option defaults applied to every `sort` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SortDefaults {
    pub ignore_leading_blanks: bool,
    pub ignore_case: bool,
    pub ignore_unprintable: bool,
    /// Main-memory buffer, e.g. `"40M"` or `"2G"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempdir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<u32>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            raise_on_error: true,
            primary_encoding: "utf-8".to_string(),
            fallback_encoding: "shift_jis".to_string(),
            timeout_secs: None,
            sort: SortDefaults::default(),
        }
    }
}

impl ShellConfig {
    pub fn validate(&self) -> Result<()> {
        Decoder::from_labels(&self.primary_encoding, &self.fallback_encoding)?;
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if let Some(size) = &self.sort.buffer_size {
            validate_buffer_size(size).context("sort.buffer_size")?;
        }
        if self.sort.parallel == Some(0) {
            return Err(anyhow!("sort.parallel must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ShellConfig::default()`.
pub fn load_config(path: &Path) -> Result<ShellConfig> {
    if !path.exists() {
        let cfg = ShellConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ShellConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ShellConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
