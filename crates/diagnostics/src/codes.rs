//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. `IHEX10xx` codes are grammar errors raised while
//! tokenizing, `IHEX11xx` are structural errors raised by the record
//! assembler, `IHEX12xx` are checksum errors, and `IHEX20xx` are warnings
//! about documents that parse cleanly.

/// A line does not begin with the `:` start code.
pub const UNEXPECTED_START: &str = "IHEX1001";
/// The byte count is not exactly two uppercase hex digits.
pub const MALFORMED_BYTE_COUNT: &str = "IHEX1002";
/// The load address is not exactly four uppercase hex digits.
pub const MALFORMED_ADDRESS: &str = "IHEX1003";
/// The record type is not one of `00`–`05`.
pub const UNKNOWN_RECORD_KIND: &str = "IHEX1004";
/// Fewer data digits than the byte count announces.
pub const TRUNCATED_DATA: &str = "IHEX1005";
/// The checksum is not exactly two uppercase hex digits.
pub const MALFORMED_CHECKSUM: &str = "IHEX1006";
/// A field arrived where a different field was required.
pub const UNEXPECTED_FIELD: &str = "IHEX1101";
/// The encoded checksum disagrees with the computed one.
pub const CHECKSUM_MISMATCH: &str = "IHEX1201";
/// A clean document without an end-of-file record.
pub const MISSING_END_OF_FILE: &str = "IHEX2001";

/// Every known diagnostic code, in numeric order.
pub const ALL: &[&str] = &[
    UNEXPECTED_START,
    MALFORMED_BYTE_COUNT,
    MALFORMED_ADDRESS,
    UNKNOWN_RECORD_KIND,
    TRUNCATED_DATA,
    MALFORMED_CHECKSUM,
    UNEXPECTED_FIELD,
    CHECKSUM_MISMATCH,
    MISSING_END_OF_FILE,
];
