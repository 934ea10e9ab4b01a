//! CLI Exit Code Registry
//!
//! Single source of truth for `sheetmend` exit codes.
//! Scripts rely on them, so treat them as part of the shell contract.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, missing file)                     |
//! | 3    | File decoded to nothing; raw-byte diagnostic was printed |
//! | 4    | Unsupported file extension                               |
//! | 5    | Decoder failure                                          |
//! | 6    | Header row outside the decoded grid                      |
//! | 7    | Export or filesystem failure                             |

use sheetmend_io::RepairError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// The file has no rows or no columns.
pub const EXIT_EMPTY_FILE: u8 = 3;

/// Extension is not in the supported list.
pub const EXIT_UNSUPPORTED_FORMAT: u8 = 4;

/// The decoder for the file's format rejected its bytes.
pub const EXIT_DECODE: u8 = 5;

/// `--header-row` is below 1 or past the last row.
pub const EXIT_HEADER_ROW: u8 = 6;

/// Export failed, or the artifact could not be written.
pub const EXIT_EXPORT_IO: u8 = 7;

/// Map a RepairError to its exit code.
pub fn repair_exit_code(err: &RepairError) -> u8 {
    match err {
        RepairError::UnsupportedFormat { .. } => EXIT_UNSUPPORTED_FORMAT,
        RepairError::Decode { .. } => EXIT_DECODE,
        RepairError::HeaderRowOutOfRange { .. } => EXIT_HEADER_ROW,
        RepairError::Export(_) => EXIT_EXPORT_IO,
        // Only reachable through a driver bug
        RepairError::InvalidTransition { .. } => EXIT_ERROR,
    }
}
