//! Gzip tarball wrapper around the external `tar` binary.
//!
//! Every operation runs `tar` in an explicit working directory instead of
//! changing the process-wide current directory, so `Tar` values are safe to
//! use from several threads at once. Relative paths (files to archive, the
//! output archive, extraction targets) are interpreted against that
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::command::CommandLine;
use crate::error::{Result, ShellError};
use crate::shell::{ErrorPolicy, ShellCaller};

const TAR_PROGRAM: &str = "tar";
const COMPRESS_FLAGS: &str = "cfvz";
const EXTRACT_FLAGS: &str = "zxvf";

/// Runs `tar cfvz` / `tar zxvf`.
#[derive(Debug, Clone, Default)]
pub struct Tar {
    workdir: Option<PathBuf>,
    shell: ShellCaller,
}

impl Tar {
    /// Operate in the process's current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Operate in `dir` instead of the process's current directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Use `shell` for decoding and timeouts. Its error policy is always
    /// overridden to [`ErrorPolicy::Raise`].
    pub fn with_shell(mut self, shell: ShellCaller) -> Self {
        self.shell = shell.with_policy(ErrorPolicy::Raise);
        self
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Archive `files` into `output`.
    ///
    /// `tar` writes the archive under the base name of `output` inside the
    /// working directory (`chdir`, else this `Tar`'s directory). When `output`
    /// has a directory component, that directory is created if needed and the
    /// archive is moved there afterwards.
    #[instrument(skip_all, fields(output = %output.display()))]
    pub fn compress<P: AsRef<Path>>(
        &self,
        files: &[P],
        output: &Path,
        chdir: Option<&Path>,
    ) -> Result<String> {
        let workdir = chdir.or(self.workdir.as_deref());
        let name = output.file_name().ok_or_else(|| {
            ShellError::validation(format!(
                "archive path has no file name: {}",
                output.display()
            ))
        })?;

        let mut command = compress_command(Path::new(name), files);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }
        info!("{command}");

        let result = self.shell.run_and_parse(&command)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            let parent = resolve(workdir, parent);
            if !parent.exists() {
                fs::create_dir_all(&parent).map_err(|e| ShellError::io(&parent, e))?;
            }
            let from = resolve(workdir, Path::new(name));
            let to = resolve(workdir, output);
            debug!(from = %from.display(), to = %to.display(), "moving archive");
            fs::rename(&from, &to).map_err(|e| ShellError::io(&from, e))?;
        }

        Ok(result)
    }

    /// Extract every entry of `archive`, into `output_dir` when given.
    #[instrument(skip_all, fields(archive = %archive.display()))]
    pub fn extract_all(&self, archive: &Path, output_dir: Option<&Path>) -> Result<String> {
        let mut command = extract_all_command(archive, output_dir);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        info!("{command}");

        self.shell.run_and_parse(&command)
    }

    /// Extract the single entry `target` from `archive`.
    ///
    /// The entry lands at `target` under the working directory; with
    /// `output_dir` it is then moved to `output_dir/target`.
    #[instrument(skip_all, fields(archive = %archive.display(), target = %target.display()))]
    pub fn extract(
        &self,
        archive: &Path,
        target: &Path,
        output_dir: Option<&Path>,
    ) -> Result<String> {
        let workdir = self.workdir.as_deref();
        let mut command = extract_command(archive, target);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }
        info!("{command}");

        let result = self.shell.run_and_parse(&command)?;

        if let Some(output_dir) = output_dir {
            let to = resolve(workdir, &output_dir.join(target));
            if let Some(parent) = to.parent().filter(|p| !p.exists()) {
                fs::create_dir_all(parent).map_err(|e| ShellError::io(parent, e))?;
            }
            let from = resolve(workdir, target);
            debug!(from = %from.display(), to = %to.display(), "moving extracted entry");
            fs::rename(&from, &to).map_err(|e| ShellError::io(&from, e))?;
        }

        Ok(result)
    }
}

/// `tar cfvz <archive> <file>...`
pub fn compress_command<P: AsRef<Path>>(archive: &Path, files: &[P]) -> CommandLine {
    let mut cmd = CommandLine::new(TAR_PROGRAM);
    cmd.arg(COMPRESS_FLAGS).path_arg(archive);
    for file in files {
        cmd.path_arg(file.as_ref());
    }
    cmd
}

/// `tar zxvf <archive> [-C <output_dir>]`
pub fn extract_all_command(archive: &Path, output_dir: Option<&Path>) -> CommandLine {
    let mut cmd = CommandLine::new(TAR_PROGRAM);
    cmd.arg(EXTRACT_FLAGS).path_arg(archive);
    if let Some(dir) = output_dir {
        cmd.arg("-C").path_arg(dir);
    }
    cmd
}

/// `tar zxvf <archive> <target>`
pub fn extract_command(archive: &Path, target: &Path) -> CommandLine {
    let mut cmd = CommandLine::new(TAR_PROGRAM);
    cmd.arg(EXTRACT_FLAGS).path_arg(archive).path_arg(target);
    cmd
}

fn resolve(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(base) => base.join(path),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_command_lists_files_after_archive() {
        let cmd = compress_command(
            Path::new("comp.gz"),
            &["file1.txt", "test2/file2.txt", "with space.txt"],
        );
        assert_eq!(
            cmd.get_args(),
            ["cfvz", "comp.gz", "file1.txt", "test2/file2.txt", "with space.txt"]
        );
        assert_eq!(
            cmd.to_string(),
            "tar cfvz comp.gz file1.txt test2/file2.txt 'with space.txt'"
        );
    }

    #[test]
    fn extract_all_command_adds_directory_flag() {
        let plain = extract_all_command(Path::new("a.gz"), None);
        assert_eq!(plain.get_args(), ["zxvf", "a.gz"]);

        let into = extract_all_command(Path::new("a.gz"), Some(Path::new("out")));
        assert_eq!(into.get_args(), ["zxvf", "a.gz", "-C", "out"]);
    }

    #[test]
    fn extract_command_names_target() {
        let cmd = extract_command(Path::new("a.gz"), Path::new("test2/file2.txt"));
        assert_eq!(cmd.get_args(), ["zxvf", "a.gz", "test2/file2.txt"]);
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        assert_eq!(
            resolve(Some(Path::new("/work")), Path::new("/abs/out.gz")),
            PathBuf::from("/abs/out.gz")
        );
        assert_eq!(
            resolve(Some(Path::new("/work")), Path::new("moved/out.gz")),
            PathBuf::from("/work/moved/out.gz")
        );
        assert_eq!(resolve(None, Path::new("x")), PathBuf::from("x"));
    }

    #[test]
    fn compress_rejects_output_without_file_name() {
        let tar = Tar::new();
        let err = tar
            .compress(&["a.txt"], Path::new(".."), None)
            .expect_err("no file name");
        assert!(matches!(err, ShellError::Validation(_)));
    }
}
