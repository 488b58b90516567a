//! Intel HEX encoder — serializes logical records into chunked, checksummed
//! lines.
//!
//! A data record of any length is split into lines of at most
//! [`EmitConfig::max_bytes_per_line`] bytes, each with its own address and
//! checksum. Output digits are always uppercase and every line ends in `\n`.

use std::fmt::Write as _;

use tracing::trace;

use super::checksum::line_checksum;
use super::record::{Record, RecordKind};
use crate::error::EmitError;

/// The fixed end-of-file line, without terminator.
pub const END_OF_FILE_LINE: &str = ":00000001FF";

/// Default line width, the usual choice of Intel HEX producers.
pub const DEFAULT_BYTES_PER_LINE: u8 = 16;

// ── Configuration ───────────────────────────────────────────────────────

/// What to do with a chunk whose bytes would pass address 0xFFFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressOverflow {
    /// Fail with [`EmitError::AddressOverflow`].
    #[default]
    Reject,
    /// Write the chunk address modulo 0x10000.
    Wrap,
}

/// Configuration for the encoder.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Maximum payload bytes per output line (1–255).
    pub max_bytes_per_line: u8,
    /// Policy for chunks that run past the 16-bit address space.
    pub address_overflow: AddressOverflow,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_line: DEFAULT_BYTES_PER_LINE,
            address_overflow: AddressOverflow::default(),
        }
    }
}

impl EmitConfig {
    /// Default configuration with the given line width.
    pub fn with_width(max_bytes_per_line: u8) -> Self {
        Self {
            max_bytes_per_line,
            ..Self::default()
        }
    }
}

// ── Public API ──────────────────────────────────────────────────────────

/// Encode one record at the given line width with default settings.
pub fn encode(record: &Record, max_bytes_per_line: u8) -> Result<String, EmitError> {
    emit_record(record, &EmitConfig::with_width(max_bytes_per_line))
}

/// Encode one record into zero or more terminated lines.
///
/// `EndOfFile` always yields [`END_OF_FILE_LINE`]. A zero-length data record
/// yields no lines. Other record types return
/// [`EmitError::UnsupportedKind`].
pub fn emit_record(record: &Record, config: &EmitConfig) -> Result<String, EmitError> {
    let mut out = String::new();
    write_record(&mut out, record, config)?;
    Ok(out)
}

/// Encode a sequence of records into one document, in order.
pub fn emit_records<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    config: &EmitConfig,
) -> Result<String, EmitError> {
    let mut out = String::new();
    for record in records {
        write_record(&mut out, record, config)?;
    }
    Ok(out)
}

// ── Record emission ─────────────────────────────────────────────────────

fn write_record(out: &mut String, record: &Record, config: &EmitConfig) -> Result<(), EmitError> {
    match record.kind {
        RecordKind::EndOfFile => {
            out.push_str(END_OF_FILE_LINE);
            out.push('\n');
            Ok(())
        }
        RecordKind::Data => write_data(out, record, config),
        other => Err(EmitError::UnsupportedKind(other)),
    }
}

fn write_data(out: &mut String, record: &Record, config: &EmitConfig) -> Result<(), EmitError> {
    let width = usize::from(config.max_bytes_per_line);
    if width == 0 {
        return Err(EmitError::ZeroWidth);
    }
    if record.data.len() != record.byte_count * 2 {
        return Err(EmitError::DataLength {
            byte_count: record.byte_count,
            chars: record.data.len(),
        });
    }
    let bytes = hex::decode(&record.data)?;

    let mut offset = usize::from(record.address);
    for chunk in bytes.chunks(width) {
        let address = chunk_address(offset, chunk.len(), config.address_overflow)?;
        write_line(out, address, chunk);
        offset += chunk.len();
    }
    trace!(
        address = record.address,
        byte_count = record.byte_count,
        width,
        "encoded data record"
    );
    Ok(())
}

/// Resolve the 16-bit address of a chunk starting at the unwrapped `offset`.
fn chunk_address(offset: usize, len: usize, policy: AddressOverflow) -> Result<u16, EmitError> {
    match policy {
        AddressOverflow::Wrap => Ok((offset & 0xFFFF) as u16),
        AddressOverflow::Reject if offset + len > 0x1_0000 => {
            Err(EmitError::AddressOverflow { offset, len })
        }
        AddressOverflow::Reject => Ok(offset as u16),
    }
}

fn write_line(out: &mut String, address: u16, chunk: &[u8]) {
    let code = 0x00;
    let checksum = line_checksum(chunk.len(), address, code, chunk);
    // Writing to a String cannot fail.
    let _ = write!(out, ":{:02X}{:04X}{:02X}", chunk.len(), address, code);
    out.push_str(&hex::encode_upper(chunk));
    let _ = writeln!(out, "{checksum:02X}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_file_is_fixed() {
        let eof = Record::new(3, 0x1234, RecordKind::EndOfFile, "ignored");
        assert_eq!(encode(&eof, 16).unwrap(), ":00000001FF\n");
    }

    #[test]
    fn single_byte_record() {
        let r = Record::data(0, &[0xCB]);
        assert_eq!(encode(&r, 32).unwrap(), ":01000000CB34\n");
    }

    #[test]
    fn zero_length_data_emits_nothing() {
        let r = Record::data(0x0100, &[]);
        assert_eq!(encode(&r, 16).unwrap(), "");
    }

    #[test]
    fn lowercase_payload_is_normalized() {
        let r = Record::new(1, 0, RecordKind::Data, "cb");
        assert_eq!(encode(&r, 16).unwrap(), ":01000000CB34\n");
    }

    #[test]
    fn last_chunk_holds_the_remainder() {
        let r = Record::data(0x0010, &[0x11; 5]);
        let out = encode(&r, 2).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(":02001000"));
        assert!(lines[1].starts_with(":02001200"));
        assert!(lines[2].starts_with(":01001400"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let r = Record::data(0, &[1]);
        assert_eq!(encode(&r, 0), Err(EmitError::ZeroWidth));
    }

    #[test]
    fn address_records_are_unsupported() {
        let r = Record::new(2, 0, RecordKind::ExtendedLinearAddress, "0800");
        assert_eq!(
            encode(&r, 16),
            Err(EmitError::UnsupportedKind(RecordKind::ExtendedLinearAddress))
        );
        assert!(matches!(
            encode(&Record::parse_error("x"), 16),
            Err(EmitError::UnsupportedKind(RecordKind::ParseError))
        ));
    }

    #[test]
    fn mismatched_length_is_rejected() {
        let r = Record::new(2, 0, RecordKind::Data, "AB");
        assert_eq!(
            encode(&r, 16),
            Err(EmitError::DataLength {
                byte_count: 2,
                chars: 2
            })
        );
    }

    #[test]
    fn non_hex_payload_is_rejected() {
        let r = Record::new(1, 0, RecordKind::Data, "ZZ");
        assert!(matches!(encode(&r, 16), Err(EmitError::InvalidData(_))));
    }

    #[test]
    fn overflow_is_rejected_by_default() {
        let r = Record::data(0xFFF0, &[0; 32]);
        assert_eq!(
            encode(&r, 16),
            Err(EmitError::AddressOverflow {
                offset: 0x1_0000,
                len: 16
            })
        );
    }

    #[test]
    fn record_ending_exactly_at_top_is_accepted() {
        let r = Record::data(0xFFF0, &[0; 16]);
        assert!(encode(&r, 16).unwrap().starts_with(":10FFF000"));
    }

    #[test]
    fn overflow_can_wrap() {
        let r = Record::data(0xFFF0, &[0; 32]);
        let config = EmitConfig {
            max_bytes_per_line: 16,
            address_overflow: AddressOverflow::Wrap,
        };
        let out = emit_record(&r, &config).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with(":10FFF000"));
        assert!(lines[1].starts_with(":1000000000"));
    }

    #[test]
    fn emit_records_concatenates() {
        let records = [Record::data(0, &[0xCB]), Record::end_of_file()];
        let out = emit_records(&records, &EmitConfig::default()).unwrap();
        assert_eq!(out, ":01000000CB34\n:00000001FF\n");
    }
}
