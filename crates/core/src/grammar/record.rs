use std::fmt;

use serde::{Deserialize, Serialize};

/// Intel HEX record types.
///
/// Only `Data` and `EndOfFile` are interpreted. The four address record
/// types are recognized on input and passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// `00`: payload bytes at a 16-bit address.
    Data,
    /// `01`: end of file.
    EndOfFile,
    /// `02`: extended segment address (not interpreted).
    ExtendedSegmentAddress,
    /// `03`: start segment address (not interpreted).
    StartSegmentAddress,
    /// `04`: extended linear address (not interpreted).
    ExtendedLinearAddress,
    /// `05`: start linear address (not interpreted).
    StartLinearAddress,
    /// A failed parse; the record's `data` holds the diagnostic text.
    ParseError,
}

impl RecordKind {
    /// The wire code, or `None` for [`RecordKind::ParseError`].
    pub const fn code(self) -> Option<u8> {
        match self {
            RecordKind::Data => Some(0x00),
            RecordKind::EndOfFile => Some(0x01),
            RecordKind::ExtendedSegmentAddress => Some(0x02),
            RecordKind::StartSegmentAddress => Some(0x03),
            RecordKind::ExtendedLinearAddress => Some(0x04),
            RecordKind::StartLinearAddress => Some(0x05),
            RecordKind::ParseError => None,
        }
    }

    /// Look up a record type by wire code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(RecordKind::Data),
            0x01 => Some(RecordKind::EndOfFile),
            0x02 => Some(RecordKind::ExtendedSegmentAddress),
            0x03 => Some(RecordKind::StartSegmentAddress),
            0x04 => Some(RecordKind::ExtendedLinearAddress),
            0x05 => Some(RecordKind::StartLinearAddress),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Data => "data",
            RecordKind::EndOfFile => "end-of-file",
            RecordKind::ExtendedSegmentAddress => "extended segment address",
            RecordKind::StartSegmentAddress => "start segment address",
            RecordKind::ExtendedLinearAddress => "extended linear address",
            RecordKind::StartLinearAddress => "start linear address",
            RecordKind::ParseError => "parse error",
        };
        f.write_str(name)
    }
}

/// One logical Intel HEX record.
///
/// `data` holds the payload as hex digit pairs, two characters per byte.
/// For a merged data run `byte_count` can exceed 255. For a
/// [`RecordKind::ParseError`] record `data` is the diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Number of payload bytes.
    pub byte_count: usize,
    /// Load address of the first payload byte.
    pub address: u16,
    /// Record type.
    pub kind: RecordKind,
    /// Hex-encoded payload, or the message of a parse error.
    pub data: String,
}

impl Record {
    /// Create a record from its raw parts.
    pub fn new(byte_count: usize, address: u16, kind: RecordKind, data: impl Into<String>) -> Self {
        Self {
            byte_count,
            address,
            kind,
            data: data.into(),
        }
    }

    /// A data record holding `bytes` at `address`, hex-encoded in uppercase.
    pub fn data(address: u16, bytes: &[u8]) -> Self {
        Self::new(bytes.len(), address, RecordKind::Data, hex::encode_upper(bytes))
    }

    /// The end-of-file record.
    pub fn end_of_file() -> Self {
        Self::new(0, 0, RecordKind::EndOfFile, "")
    }

    /// A parse error carrying `message`.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(0, 0, RecordKind::ParseError, message)
    }

    /// Whether this is a data record.
    pub fn is_data(&self) -> bool {
        self.kind == RecordKind::Data
    }

    /// Whether this is a parse error.
    pub fn is_error(&self) -> bool {
        self.kind == RecordKind::ParseError
    }

    /// The diagnostic message of a parse error record.
    pub fn error_message(&self) -> Option<&str> {
        self.is_error().then_some(self.data.as_str())
    }

    /// One past the last payload address, without 16-bit wraparound.
    pub fn end_address(&self) -> usize {
        usize::from(self.address) + self.byte_count
    }

    /// Whether `next` starts exactly where this record ends.
    pub fn is_contiguous_with(&self, next: &Record) -> bool {
        self.end_address() == usize::from(next.address)
    }

    /// Extend this record with the payload of `next`, preserving order.
    pub fn append(&mut self, next: Record) {
        self.byte_count += next.byte_count;
        self.data.push_str(&next.data);
    }

    /// Decode the payload into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.data)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::Data => write!(
                f,
                "data @{:04X} ({} bytes): {}",
                self.address, self.byte_count, self.data
            ),
            RecordKind::EndOfFile => write!(f, "end-of-file"),
            RecordKind::ParseError => f.write_str(&self.data),
            other => write!(f, "{other} @{:04X}: {}", self.address, self.data),
        }
    }
}
