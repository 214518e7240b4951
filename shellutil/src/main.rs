//! `shellutil`: run shell commands, `sort`, and `tar` with decoded output.
//!
//! Prints the decoded command output on success. Failures print the error
//! chain to stderr and exit with a code from [`shellutil::exit_codes`].

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use shellutil::config::{DEFAULT_CONFIG_FILE, ShellConfig, load_config, write_config};
use shellutil::{ErrorPolicy, ShellCaller, ShellError, SortOptions, Sorter, Tar, exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "shellutil",
    version,
    about = "Run shell commands, sort, and tar with decoded output"
)]
struct Cli {
    /// Config file; a missing file means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config file with default values.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run a shell command string through `sh -c`.
    Run {
        /// Print stderr as part of the output instead of failing.
        #[arg(long)]
        embed_errors: bool,
        /// Command words, joined with spaces.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Sort a file with the external `sort` binary.
    Sort(SortArgs),
    /// Compress or extract gzip tarballs.
    #[command(subcommand)]
    Tar(TarCommand),
}

#[derive(Args)]
struct SortArgs {
    /// Input file (positional; `-i` is ignore-unprintable, as in `sort`).
    input: Option<PathBuf>,
    /// Output file.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Key options passed through to sort, e.g. "-k4,4 -k1,3".
    #[arg(short, long, allow_hyphen_values = true)]
    keys: Option<String>,
    /// Field delimiter (one character).
    #[arg(short = 't', long)]
    delimiter: Option<String>,
    #[arg(short = 'b', long)]
    ignore_leading_blanks: bool,
    #[arg(short = 'f', long)]
    ignore_case: bool,
    /// Consider only printable characters (`sort -i`).
    #[arg(short = 'i', long)]
    ignore_unprintable: bool,
    /// Main-memory buffer, e.g. 40M or 2G.
    #[arg(short = 'S', long)]
    buffer_size: Option<String>,
    /// Directory for temporary files.
    #[arg(short = 'T', long)]
    tempdir: Option<PathBuf>,
    #[arg(long)]
    parallel: Option<u32>,
}

#[derive(Subcommand)]
enum TarCommand {
    /// Archive files into a .tar.gz.
    Compress {
        /// Archive path; its directory is created if missing.
        #[arg(short, long)]
        output: PathBuf,
        /// Directory the files are relative to.
        #[arg(short = 'C', long)]
        chdir: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract every entry.
    ExtractAll {
        archive: PathBuf,
        #[arg(short = 'C', long)]
        output_dir: Option<PathBuf>,
    },
    /// Extract a single entry.
    Extract {
        archive: PathBuf,
        target: PathBuf,
        #[arg(short = 'C', long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ShellError>() {
        Some(shell_err) => exit_codes::for_error(shell_err),
        None => exit_codes::INVALID,
    }
}

fn run(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Command::InitConfig { force } => return cmd_init_config(&cli.config, force),
        Command::Run {
            embed_errors,
            command,
        } => {
            let (_, shell) = load_shell(&cli.config)?;
            let shell = if embed_errors {
                shell.with_policy(ErrorPolicy::Embed)
            } else {
                shell
            };
            shell.call_and_parse(&command.join(" "))?
        }
        Command::Sort(args) => {
            let (config, shell) = load_shell(&cli.config)?;
            cmd_sort(&config, shell, args)?
        }
        Command::Tar(tar) => {
            let (_, shell) = load_shell(&cli.config)?;
            cmd_tar(shell, tar)?
        }
    };

    print_output(&output);
    Ok(())
}

fn load_shell(path: &Path) -> Result<(ShellConfig, ShellCaller)> {
    let config = load_config(path)?;
    let shell = ShellCaller::from_config(&config)?;
    debug!(config = %path.display(), policy = ?shell.policy(), "config loaded");
    Ok((config, shell))
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &ShellConfig::default())
}

fn cmd_sort(config: &ShellConfig, shell: ShellCaller, args: SortArgs) -> Result<String> {
    let mut options = SortOptions::from_defaults(&config.sort)?;
    if args.ignore_leading_blanks {
        options.set_ignore_leading_blanks(true);
    }
    if args.ignore_case {
        options.set_ignore_case(true);
    }
    if args.ignore_unprintable {
        options.set_ignore_unprintable(true);
    }
    if let Some(size) = &args.buffer_size {
        options.set_buffer_size(size)?;
    }
    if let Some(dir) = args.tempdir {
        options.set_tempdir(dir);
    }
    if let Some(parallel) = args.parallel {
        options.set_parallel(parallel);
    }

    let mut sorter = Sorter::with_options(options).with_shell(shell);
    let output = sorter.sort(
        args.input.as_deref(),
        args.output.as_deref(),
        args.keys.as_deref(),
        args.delimiter.as_deref(),
    )?;
    Ok(output)
}

fn cmd_tar(shell: ShellCaller, command: TarCommand) -> Result<String> {
    let tar = Tar::new().with_shell(shell);
    let output = match command {
        TarCommand::Compress {
            output,
            chdir,
            files,
        } => tar.compress(&files, &output, chdir.as_deref())?,
        TarCommand::ExtractAll {
            archive,
            output_dir,
        } => tar.extract_all(&archive, output_dir.as_deref())?,
        TarCommand::Extract {
            archive,
            target,
            output_dir,
        } => tar.extract(&archive, &target, output_dir.as_deref())?,
    };
    Ok(output)
}

/// Print decoded output without the leading segment newline.
fn print_output(output: &str) {
    let trimmed = output.trim_matches('\n');
    if !trimmed.is_empty() {
        println!("{trimmed}");
    }
}
