//! CLI tests: spawn the `shellutil` binary and check output and exit codes.

use std::process::{Command, Output};

use shellutil::exit_codes;
use shellutil::test_support::{SAMPLE_ROWS, SORTED_ROWS, Scratch};

fn shellutil(scratch: &Scratch, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shellutil"))
        .current_dir(scratch.path())
        .env("LC_ALL", "C")
        .args(args)
        .output()
        .expect("spawn shellutil")
}

#[test]
fn run_prints_decoded_stdout() {
    let scratch = Scratch::new().expect("scratch");
    let out = shellutil(&scratch, &["run", "printf", "'a\\nb\\n'"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "a\nb\n");
}

#[test]
fn run_failure_exits_with_failed_code() {
    let scratch = Scratch::new().expect("scratch");
    let out = shellutil(&scratch, &["run", "rm", "missing.txt"]);
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing.txt"));
}

#[test]
fn run_embed_errors_prints_stderr_and_succeeds() {
    let scratch = Scratch::new().expect("scratch");
    let out = shellutil(&scratch, &["run", "--embed-errors", "rm", "missing.txt"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&out.stdout).contains("cannot remove"));
}

#[test]
fn sort_writes_output_file() {
    let scratch = Scratch::new().expect("scratch");
    scratch.write("before.txt", SAMPLE_ROWS).expect("write");
    let out = shellutil(
        &scratch,
        &[
            "sort",
            "before.txt",
            "-o",
            "after.txt",
            "-k",
            "-k4,4 -k1,3",
            "-t",
            ",",
            "-bfi",
            "-S",
            "40M",
        ],
    );
    assert_eq!(out.status.code(), Some(exit_codes::OK), "{out:?}");
    assert_eq!(scratch.read("after.txt").expect("read"), SORTED_ROWS);
}

#[test]
fn sort_rejects_bad_delimiter() {
    let scratch = Scratch::new().expect("scratch");
    let out = shellutil(&scratch, &["sort", "x.txt", "-t", ",,"]);
    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn invalid_config_is_rejected() {
    let scratch = Scratch::new().expect("scratch");
    scratch
        .write("shellutil.toml", "fallback_encoding = \"klingon\"\n")
        .expect("write");
    let out = shellutil(&scratch, &["run", "true"]);
    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn init_config_refuses_to_overwrite() {
    let scratch = Scratch::new().expect("scratch");
    let first = shellutil(&scratch, &["init-config"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    assert!(scratch.join("shellutil.toml").exists());

    let second = shellutil(&scratch, &["init-config"]);
    assert_eq!(second.status.code(), Some(exit_codes::INVALID));

    let forced = shellutil(&scratch, &["init-config", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn tar_compress_and_extract() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let compress = shellutil(
        &scratch,
        &["tar", "compress", "-o", "out/all.gz", "file1.txt", "test2/file2.txt"],
    );
    assert_eq!(compress.status.code(), Some(exit_codes::OK), "{compress:?}");
    assert!(scratch.join("out/all.gz").exists());

    let extract = shellutil(
        &scratch,
        &["tar", "extract", "out/all.gz", "test2/file2.txt", "-C", "single"],
    );
    assert_eq!(extract.status.code(), Some(exit_codes::OK), "{extract:?}");
    assert_eq!(
        scratch.read("single/test2/file2.txt").expect("read"),
        SAMPLE_ROWS
    );
}
