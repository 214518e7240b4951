//! Stable exit codes for the `shellutil` binary.

use crate::error::ShellError;

/// Command succeeded.
pub const OK: i32 = 0;
/// The wrapped command failed, timed out, or its output could not be decoded.
pub const FAILED: i32 = 1;
/// Invalid option value or configuration.
pub const INVALID: i32 = 2;

/// Map a library error to its exit code.
pub fn for_error(err: &ShellError) -> i32 {
    match err {
        ShellError::Validation(_) => INVALID,
        _ => FAILED,
    }
}
