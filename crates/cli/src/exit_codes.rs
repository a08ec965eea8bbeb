//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | load             | Workbook, sheet layout and settings      |
//! | 10-19   | verify           | Batch verification and report output     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use returnscan_recon::ExtractError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Load (3-9)
// =============================================================================

/// Workbook could not be read or opened as a spreadsheet.
pub const EXIT_LOAD: u8 = 3;

/// Header row missing or a fixed column carries the wrong header.
pub const EXIT_LAYOUT: u8 = 4;

/// Layout was valid but no shipment rows were found.
pub const EXIT_NO_RECORDS: u8 = 5;

/// Settings file unreadable, malformed, or failing validation.
pub const EXIT_CONFIG: u8 = 6;

// =============================================================================
// Verify (10-19)
// =============================================================================

/// At least one scanned tracking number matched nothing.
pub const EXIT_VERIFY_UNMATCHED: u8 = 10;

/// Report could not be written.
pub const EXIT_REPORT: u8 = 11;

/// Map an extraction failure to its exit code.
pub fn extract_exit_code(err: &ExtractError) -> u8 {
    if err.is_structural() {
        EXIT_LAYOUT
    } else {
        EXIT_NO_RECORDS
    }
}
