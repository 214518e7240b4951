//! End-to-end tests that shell out to the system `tar`.

use std::path::Path;

use shellutil::test_support::{SAMPLE_ROWS, Scratch, TAR_INPUTS};
use shellutil::{ShellError, Tar};

#[test]
fn compress_writes_archive_in_chdir() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let tar = Tar::new();

    let listing = tar
        .compress(&TAR_INPUTS, Path::new("comp.gz"), Some(scratch.path()))
        .expect("compress");

    assert!(scratch.join("comp.gz").exists());
    for file in TAR_INPUTS {
        assert!(listing.contains(file), "listing missing {file}: {listing}");
    }
}

#[test]
fn compress_moves_archive_into_new_directory() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let tar = Tar::new();
    let output = scratch.join("moved").join("comp2.gz");

    tar.compress(
        &["file1.txt", "test2/file2.txt"],
        &output,
        Some(scratch.path()),
    )
    .expect("compress");

    assert!(output.exists());
    assert!(!scratch.join("comp2.gz").exists());
}

#[test]
fn relative_output_resolves_against_workdir() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let tar = Tar::in_dir(scratch.path());

    tar.compress(&["file1.txt"], Path::new("nested/deeper/one.gz"), None)
        .expect("compress");

    assert!(scratch.join("nested/deeper/one.gz").exists());
}

#[test]
fn compress_then_extract_all_round_trips() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let tar = Tar::new();
    let archive = scratch.join("comp.gz");
    tar.compress(&TAR_INPUTS, &archive, Some(scratch.path()))
        .expect("compress");

    let out = scratch.join("extract_all");
    std::fs::create_dir_all(&out).expect("mkdir");
    tar.extract_all(&archive, Some(&out)).expect("extract_all");

    for file in TAR_INPUTS {
        assert_eq!(
            std::fs::read_to_string(out.join(file)).expect("read"),
            SAMPLE_ROWS
        );
    }
}

#[test]
fn extract_all_without_output_dir_uses_workdir() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let archive = scratch.join("moved").join("comp2.gz");
    Tar::new()
        .compress(&["file1.txt", "test2/file2.txt"], &archive, Some(scratch.path()))
        .expect("compress");

    let moved = Tar::in_dir(scratch.join("moved"));
    moved.extract_all(&archive, None).expect("extract_all");

    assert_eq!(scratch.read("moved/file1.txt").expect("read"), SAMPLE_ROWS);
    assert_eq!(
        scratch.read("moved/test2/file2.txt").expect("read"),
        SAMPLE_ROWS
    );
}

#[test]
fn extract_single_entry_into_output_dir() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let archive = scratch.join("comp.gz");
    Tar::new()
        .compress(&TAR_INPUTS, &archive, Some(scratch.path()))
        .expect("compress");

    let work = scratch.join("work");
    std::fs::create_dir_all(&work).expect("mkdir");
    let out = scratch.join("extract");
    Tar::in_dir(&work)
        .extract(&archive, Path::new("test2/file2.txt"), Some(&out))
        .expect("extract");

    assert_eq!(
        std::fs::read_to_string(out.join("test2/file2.txt")).expect("read"),
        SAMPLE_ROWS
    );
    assert!(!out.join("file1.txt").exists());
    assert!(!out.join("test3").exists());
    assert!(!work.join("test2/file2.txt").exists());
}

#[test]
fn extract_without_output_dir_leaves_entry_in_workdir() {
    let scratch = Scratch::with_tar_inputs().expect("scratch");
    let archive = scratch.join("comp.gz");
    Tar::new()
        .compress(&TAR_INPUTS, &archive, Some(scratch.path()))
        .expect("compress");

    let work = scratch.join("work");
    std::fs::create_dir_all(&work).expect("mkdir");
    Tar::in_dir(&work)
        .extract(&archive, Path::new("test2/file2.txt"), None)
        .expect("extract");

    assert_eq!(
        std::fs::read_to_string(work.join("test2/file2.txt")).expect("read"),
        SAMPLE_ROWS
    );
    assert!(!work.join("file1.txt").exists());
}

#[test]
fn missing_archive_is_subprocess_error() {
    let scratch = Scratch::new().expect("scratch");
    let err = Tar::in_dir(scratch.path())
        .extract_all(Path::new("nope.gz"), None)
        .expect_err("missing archive");
    assert!(matches!(err, ShellError::Subprocess { .. }));
}
