//! Shared test helpers for `intelhex_core` integration tests.

#![allow(unreachable_pub)]

use intelhex_core::{Diagnostic, Record, RecordKind, line_checksum};

/// One byte of data at address 0.
#[allow(dead_code)]
pub const SINGLE_BYTE: &str = ":01000000CB34\n";

/// Two contiguous 32-byte lines, 64 bytes from address 0.
#[allow(dead_code)]
pub const TWO_LINES: &str = concat!(
    ":200000000C94AE040C94D6040C94D6040C94D6040C94D6040C94D6040C94D6040C94D60438\n",
    ":200020000C94D6040C94D6040C9474320C94FB320C94D6040C94D6040C94D6040C94D604D1\n",
);

/// Payload of [`TWO_LINES`] as one merged hex string.
#[allow(dead_code)]
pub const TWO_LINES_DATA: &str = concat!(
    "0C94AE040C94D6040C94D6040C94D6040C94D6040C94D6040C94D6040C94D604",
    "0C94D6040C94D6040C9474320C94FB320C94D6040C94D6040C94D6040C94D604",
);

/// Build one correctly checksummed line, terminated by `\n`.
#[allow(dead_code)]
pub fn line(address: u16, kind: RecordKind, data: &[u8]) -> String {
    let code = kind.code().expect("wire record kind");
    format!(
        ":{:02X}{:04X}{:02X}{}{:02X}\n",
        data.len(),
        address,
        code,
        hex::encode_upper(data),
        line_checksum(data.len(), address, code, data),
    )
}

/// Build a data line.
#[allow(dead_code)]
pub fn data_line(address: u16, data: &[u8]) -> String {
    line(address, RecordKind::Data, data)
}

/// The end-of-file line, terminated by `\n`.
#[allow(dead_code)]
pub const EOF_LINE: &str = ":00000001FF\n";

/// Collect record kinds in order.
#[allow(dead_code)]
pub fn kinds(records: &[Record]) -> Vec<RecordKind> {
    records.iter().map(|r| r.kind).collect()
}

/// Collect diagnostic codes in order.
#[allow(dead_code)]
pub fn diag_codes(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.id.to_string()).collect()
}
