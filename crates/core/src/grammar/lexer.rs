use std::fmt;
use std::iter::FusedIterator;

use super::diag::{Span, codes};

/// Record type codes accepted by the grammar, in wire order.
const RECORD_KIND_CODES: [&str; 6] = ["00", "01", "02", "03", "04", "05"];

/// Classification of a tokenizer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// The `:` start code.
    StartMarker,
    /// Two hex digits giving the data length in bytes.
    ByteCount,
    /// Four hex digits giving the big-endian load address.
    Address,
    /// Two-digit record type code (`00`–`05`).
    RecordKind,
    /// `byte_count * 2` hex digits of payload.
    Data,
    /// Two hex digits of checksum.
    Checksum,
    /// A grammar violation. Always the last field of the stream.
    Error(LexError),
    /// Normal end of input. Always the last field of the stream.
    EndOfStream,
}

impl FieldKind {
    /// Short human-readable name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::StartMarker => "start code ':'",
            FieldKind::ByteCount => "byte count",
            FieldKind::Address => "address",
            FieldKind::RecordKind => "record type",
            FieldKind::Data => "data",
            FieldKind::Checksum => "checksum",
            FieldKind::Error(_) => "invalid input",
            FieldKind::EndOfStream => "end of input",
        }
    }
}

/// What the tokenizer found where a field was expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// The input ended.
    End,
    /// The offending text (one character, or the candidate record type).
    Text(String),
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::End => write!(f, "end of input"),
            Found::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// A grammar violation detected by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LexError {
    /// A line did not begin with `:`.
    #[error("expected ':' but got {found}")]
    UnexpectedStart {
        /// What was found instead.
        found: Found,
    },
    /// The byte count was not two uppercase hex digits.
    #[error("expected byte count but got {found}")]
    ByteCount {
        /// What was found instead.
        found: Found,
    },
    /// The address was not four uppercase hex digits.
    #[error("expected address but got {found}")]
    Address {
        /// What was found instead.
        found: Found,
    },
    /// The record type was not one of `00`–`05`.
    #[error("expected record type 00-05 but got {found}")]
    RecordKind {
        /// What was found instead.
        found: Found,
    },
    /// Fewer than `byte_count * 2` hex digits of data.
    #[error("expected {byte_count} bytes of data but got {found}")]
    Data {
        /// The byte count announced by the line.
        byte_count: usize,
        /// What was found instead.
        found: Found,
    },
    /// The checksum was not two uppercase hex digits.
    #[error("expected checksum but got {found}")]
    Checksum {
        /// What was found instead.
        found: Found,
    },
}

impl LexError {
    /// Diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            LexError::UnexpectedStart { .. } => codes::UNEXPECTED_START,
            LexError::ByteCount { .. } => codes::MALFORMED_BYTE_COUNT,
            LexError::Address { .. } => codes::MALFORMED_ADDRESS,
            LexError::RecordKind { .. } => codes::UNKNOWN_RECORD_KIND,
            LexError::Data { .. } => codes::TRUNCATED_DATA,
            LexError::Checksum { .. } => codes::MALFORMED_CHECKSUM,
        }
    }
}

/// A field that borrows its text directly from the source input.
///
/// `text` is always exactly `&input[start..end]`. For an `Error` field it
/// covers the partial field up to and including the offending character,
/// or the whole rejected record-type candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// The classification of this field.
    pub kind: FieldKind,
    /// Borrowed slice of the source input for this field.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl<'a> Field<'a> {
    /// A zero-width `EndOfStream` field at `offset`.
    pub fn end_of_stream(offset: usize) -> Self {
        Field {
            kind: FieldKind::EndOfStream,
            text: "",
            start: offset,
            end: offset,
        }
    }

    /// Source span of this field.
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Whether no field can follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, FieldKind::Error(_) | FieldKind::EndOfStream)
    }
}

/// Tokenize Intel HEX text into a lazy stream of borrowed fields.
///
/// The stream is single pass and ends after exactly one `Error` or
/// `EndOfStream` field. Every document must open with a start code, so an
/// empty input is an `UnexpectedStart` error at end of input.
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer {
        input,
        pos: 0,
        byte_count: 0,
        state: State::StartCode,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartCode,
    ByteCount,
    Address,
    RecordKind,
    Data,
    Checksum,
    LineEnd,
    Done,
}

/// Pull-based tokenizer over one input string. Created by [`tokenize`].
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Byte count of the line being scanned; sizes the data field.
    byte_count: usize,
    state: State,
}

impl<'a> Lexer<'a> {
    fn emit(&self, kind: FieldKind, start: usize) -> Field<'a> {
        Field {
            kind,
            text: &self.input[start..self.pos],
            start,
            end: self.pos,
        }
    }

    /// Emit a terminal error field ending after the character at `fail_at`
    /// and stop the stream.
    fn error(&mut self, start: usize, fail_at: usize, err: LexError) -> Field<'a> {
        let end = fail_at
            + self.input[fail_at..]
                .chars()
                .next()
                .map_or(0, char::len_utf8);
        self.error_through(start, end, err)
    }

    /// Emit a terminal error field covering `start..end` and stop the stream.
    fn error_through(&mut self, start: usize, end: usize, err: LexError) -> Field<'a> {
        self.state = State::Done;
        self.pos = end;
        Field {
            kind: FieldKind::Error(err),
            text: &self.input[start..end],
            start,
            end,
        }
    }

    fn found_at(&self, offset: usize) -> Found {
        self.input[offset..]
            .chars()
            .next()
            .map_or(Found::End, |c| Found::Text(c.to_string()))
    }

    /// Consume exactly `count` uppercase hex digits, or report the offset of
    /// the first byte that is not one without moving the cursor.
    fn accept_hex(&mut self, count: usize) -> Result<(), usize> {
        let bytes = self.input.as_bytes();
        for i in self.pos..self.pos + count {
            match bytes.get(i) {
                Some(b) if is_hex_digit(*b) => {}
                _ => return Err(i),
            }
        }
        self.pos += count;
        Ok(())
    }

    fn lex_start_code(&mut self) -> Field<'a> {
        let start = self.pos;
        if self.input.as_bytes().get(start) == Some(&b':') {
            self.pos += 1;
            self.state = State::ByteCount;
            return self.emit(FieldKind::StartMarker, start);
        }
        let found = self.found_at(start);
        self.error(start, start, LexError::UnexpectedStart { found })
    }

    fn lex_byte_count(&mut self) -> Field<'a> {
        let start = self.pos;
        if let Err(at) = self.accept_hex(2) {
            let found = self.found_at(at);
            return self.error(start, at, LexError::ByteCount { found });
        }
        self.byte_count = hex_value(&self.input.as_bytes()[start..self.pos]);
        self.state = State::Address;
        self.emit(FieldKind::ByteCount, start)
    }

    fn lex_address(&mut self) -> Field<'a> {
        let start = self.pos;
        if let Err(at) = self.accept_hex(4) {
            let found = self.found_at(at);
            return self.error(start, at, LexError::Address { found });
        }
        self.state = State::RecordKind;
        self.emit(FieldKind::Address, start)
    }

    fn lex_record_kind(&mut self) -> Field<'a> {
        let start = self.pos;
        let rest = &self.input[start..];
        if let Some(code) = RECORD_KIND_CODES.iter().find(|code| rest.starts_with(**code)) {
            self.pos += code.len();
            self.state = State::Data;
            return self.emit(FieldKind::RecordKind, start);
        }
        if rest.is_empty() {
            return self.error_through(start, start, LexError::RecordKind { found: Found::End });
        }
        let candidate: String = rest.chars().take(2).collect();
        let end = start + candidate.len();
        let found = Found::Text(candidate);
        self.error_through(start, end, LexError::RecordKind { found })
    }

    fn lex_data(&mut self) -> Field<'a> {
        let start = self.pos;
        if let Err(at) = self.accept_hex(self.byte_count * 2) {
            let found = self.found_at(at);
            let byte_count = self.byte_count;
            return self.error(start, at, LexError::Data { byte_count, found });
        }
        self.state = State::Checksum;
        self.emit(FieldKind::Data, start)
    }

    fn lex_checksum(&mut self) -> Field<'a> {
        let start = self.pos;
        if let Err(at) = self.accept_hex(2) {
            let found = self.found_at(at);
            return self.error(start, at, LexError::Checksum { found });
        }
        self.state = State::LineEnd;
        self.emit(FieldKind::Checksum, start)
    }

    /// Swallow any run of `\r`/`\n`, then either end the stream or start the
    /// next line.
    fn lex_line_end(&mut self) -> Field<'a> {
        let bytes = self.input.as_bytes();
        while matches!(bytes.get(self.pos), Some(b'\r' | b'\n')) {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            self.state = State::Done;
            return Field::end_of_stream(self.pos);
        }
        self.lex_start_code()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        let field = match self.state {
            State::Done => return None,
            State::StartCode => self.lex_start_code(),
            State::ByteCount => self.lex_byte_count(),
            State::Address => self.lex_address(),
            State::RecordKind => self.lex_record_kind(),
            // Zero-length records carry no data field at all.
            State::Data if self.byte_count == 0 => self.lex_checksum(),
            State::Data => self.lex_data(),
            State::Checksum => self.lex_checksum(),
            State::LineEnd => self.lex_line_end(),
        };
        Some(field)
    }
}

impl FusedIterator for Lexer<'_> {}

/// Whether `b` is an uppercase hex digit (`0-9`, `A-F`).
pub(crate) fn is_hex_digit(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'A'..=b'F')
}

/// Value of a run of digits already accepted by [`is_hex_digit`].
fn hex_value(digits: &[u8]) -> usize {
    digits.iter().fold(0, |acc, &b| {
        let nibble = if b.is_ascii_digit() { b - b'0' } else { b - b'A' + 10 };
        acc * 16 + usize::from(nibble)
    })
}
