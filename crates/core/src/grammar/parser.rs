use std::collections::{BTreeMap, VecDeque};
use std::iter::FusedIterator;

use tracing::debug;

use super::{
    checksum::Checksum,
    diag::{Diagnostic, Span, codes},
    lexer::{Field, FieldKind, LexError, Lexer, tokenize},
    record::{Record, RecordKind},
};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Result of parsing a whole Intel HEX document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ParseResult {
    /// Records in stream order. A parse error, if any, is the last one.
    pub records: Vec<Record>,
    /// One diagnostic per parse error record.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether parsing stopped on an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The successfully parsed data records.
    pub fn data_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_data())
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse a whole document eagerly.
pub fn parse_str(input: &str) -> ParseResult {
    let mut records = parse(input);
    let collected: Vec<Record> = records.by_ref().collect();
    ParseResult {
        records: collected,
        diagnostics: records.into_diagnostics(),
    }
}

/// Lazily parse `input` into records.
pub fn parse(input: &str) -> Records<Lexer<'_>> {
    parse_fields(tokenize(input))
}

/// Lazily assemble records from any field stream.
///
/// A source that runs dry without an `EndOfStream` field is treated as if
/// it had ended normally.
pub fn parse_fields<'a, I>(fields: I) -> Records<I>
where
    I: Iterator<Item = Field<'a>>,
{
    Records {
        fields,
        pending: Pending::Empty,
        ready: VecDeque::new(),
        finished: false,
        last_end: 0,
        diagnostics: Vec::new(),
    }
}

// ─── Merge State Machine ────────────────────────────────────────────────────

/// The data run accumulated so far and not yet emitted.
#[derive(Debug, Default)]
enum Pending {
    /// No data run is open.
    #[default]
    Empty,
    /// Contiguous data lines merged into one record.
    Run(Record),
}

impl Pending {
    fn take(&mut self) -> Option<Record> {
        match std::mem::take(self) {
            Pending::Empty => None,
            Pending::Run(record) => Some(record),
        }
    }
}

/// Why a line could not be assembled.
#[derive(Debug)]
struct LineError {
    code: &'static str,
    message: String,
    span: Span,
    context: Option<BTreeMap<String, String>>,
}

impl LineError {
    fn new(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            context: None,
        }
    }

    fn lex(err: LexError, span: Span) -> Self {
        Self::new(err.code(), err.to_string(), span)
    }

    fn unexpected(want: &FieldKind, field: &Field<'_>) -> Self {
        match &field.kind {
            FieldKind::Error(err) => Self::lex(err.clone(), field.span()),
            found => Self {
                context: Some(ctx!("expected" => want.describe(), "found" => found.describe())),
                ..Self::new(
                    codes::UNEXPECTED_FIELD,
                    format!("expected {} but got {}", want.describe(), found.describe()),
                    field.span(),
                )
            },
        }
    }

    fn into_diagnostic(self) -> Diagnostic {
        let diag = Diagnostic::error(self.code, self.message, Some(self.span));
        match self.context {
            Some(ctx) => diag.with_context(ctx),
            None => diag,
        }
    }
}

// ─── Record Stream ──────────────────────────────────────────────────────────

/// Pull-based record assembler. Created by [`parse`] or [`parse_fields`].
///
/// Contiguous data lines are merged into one record per run. The stream
/// ends after an end-of-file record, at end of input, or after the first
/// parse error, whichever comes first.
#[derive(Debug)]
pub struct Records<I> {
    fields: I,
    pending: Pending,
    /// Records decided but not yet handed out (at most two).
    ready: VecDeque<Record>,
    finished: bool,
    /// End offset of the last field pulled, for spans at a dry source.
    last_end: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<I> Records<I> {
    /// Diagnostics raised so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the stream and return its diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl<'a, I> Records<I>
where
    I: Iterator<Item = Field<'a>>,
{
    fn next_field(&mut self) -> Field<'a> {
        match self.fields.next() {
            Some(field) => {
                self.last_end = field.end;
                field
            }
            None => Field::end_of_stream(self.last_end),
        }
    }

    fn expect(&mut self, want: FieldKind) -> Result<Field<'a>, LineError> {
        let field = self.next_field();
        if std::mem::discriminant(&field.kind) == std::mem::discriminant(&want) {
            Ok(field)
        } else {
            Err(LineError::unexpected(&want, &field))
        }
    }

    /// Assemble one line, or `None` at end of input.
    fn parse_line(&mut self) -> Result<Option<Record>, LineError> {
        let start = self.next_field();
        match &start.kind {
            FieldKind::StartMarker => {}
            FieldKind::EndOfStream => return Ok(None),
            _ => return Err(LineError::unexpected(&FieldKind::StartMarker, &start)),
        }

        let count_field = self.expect(FieldKind::ByteCount)?;
        let byte_count = parse_hex_field::<u8>(&count_field, u8::from_str_radix)?;

        let address_field = self.expect(FieldKind::Address)?;
        let address = parse_hex_field::<u16>(&address_field, u16::from_str_radix)?;

        let kind_field = self.expect(FieldKind::RecordKind)?;
        let code = parse_hex_field::<u8>(&kind_field, u8::from_str_radix)?;
        let kind = RecordKind::from_code(code).ok_or_else(|| {
            LineError::new(
                codes::UNKNOWN_RECORD_KIND,
                format!("unknown record type {}", kind_field.text),
                kind_field.span(),
            )
        })?;

        let data = if byte_count > 0 {
            let data_field = self.expect(FieldKind::Data)?;
            if data_field.text.len() != usize::from(byte_count) * 2 {
                return Err(LineError::new(
                    codes::TRUNCATED_DATA,
                    format!(
                        "expected {byte_count} bytes of data but got {} characters",
                        data_field.text.len()
                    ),
                    data_field.span(),
                ));
            }
            Some(data_field)
        } else {
            None
        };

        let checksum_field = self.expect(FieldKind::Checksum)?;
        let found = parse_hex_field::<u8>(&checksum_field, u8::from_str_radix)?;

        let mut sum = Checksum::new();
        sum.push(byte_count);
        sum.push_address(address);
        sum.push(code);
        if let Some(data_field) = &data {
            sum.push_hex(data_field.text).map_err(|err| {
                LineError::new(
                    codes::TRUNCATED_DATA,
                    format!("data is not valid hex: {err}"),
                    data_field.span(),
                )
            })?;
        }
        let expected = sum.finish();
        if found != expected {
            return Err(LineError {
                context: Some(ctx!(
                    "expected" => format!("{expected:02X}"),
                    "found" => format!("{found:02X}"),
                )),
                ..LineError::new(
                    codes::CHECKSUM_MISMATCH,
                    format!("invalid checksum: line has {found:02X} but computed {expected:02X}"),
                    checksum_field.span(),
                )
            });
        }

        let text = data.map_or("", |f| f.text);
        Ok(Some(Record::new(
            usize::from(byte_count),
            address,
            kind,
            text,
        )))
    }

    /// Pull fields until at least one record is ready or the stream ends.
    fn step(&mut self) {
        match self.parse_line() {
            Ok(Some(record)) => self.absorb(record),
            Ok(None) => self.finish(),
            Err(err) => self.fail(err),
        }
    }

    /// Apply the merge rule to one successfully parsed line.
    fn absorb(&mut self, record: Record) {
        match (std::mem::take(&mut self.pending), record.kind) {
            (Pending::Run(mut run), RecordKind::Data) if run.is_contiguous_with(&record) => {
                run.append(record);
                self.pending = Pending::Run(run);
            }
            (Pending::Run(run), RecordKind::Data) => {
                debug!(
                    address = run.address,
                    byte_count = run.byte_count,
                    next = record.address,
                    "data run ends at gap"
                );
                self.ready.push_back(run);
                self.pending = Pending::Run(record);
            }
            (Pending::Empty, RecordKind::Data) => {
                self.pending = Pending::Run(record);
            }
            (pending, kind) => {
                if let Pending::Run(run) = pending {
                    self.ready.push_back(run);
                }
                self.ready.push_back(record);
                if kind == RecordKind::EndOfFile {
                    debug!("end-of-file record, stopping");
                    self.finished = true;
                }
            }
        }
    }

    fn flush(&mut self) {
        if let Some(run) = self.pending.take() {
            self.ready.push_back(run);
        }
    }

    fn finish(&mut self) {
        self.flush();
        self.finished = true;
    }

    fn fail(&mut self, err: LineError) {
        debug!(code = err.code, message = %err.message, "parse failed");
        self.flush();
        self.ready.push_back(Record::parse_error(err.message.clone()));
        self.diagnostics.push(err.into_diagnostic());
        self.finished = true;
    }
}

impl<'a, I> Iterator for Records<I>
where
    I: Iterator<Item = Field<'a>>,
{
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(record);
            }
            if self.finished {
                return None;
            }
            self.step();
        }
    }
}

impl<'a, I> FusedIterator for Records<I> where I: Iterator<Item = Field<'a>> {}

/// Parse the hex digits of a numeric field.
fn parse_hex_field<T>(
    field: &Field<'_>,
    from_str_radix: fn(&str, u32) -> Result<T, std::num::ParseIntError>,
) -> Result<T, LineError> {
    from_str_radix(field.text, 16).map_err(|_| {
        let code = match field.kind {
            FieldKind::ByteCount => codes::MALFORMED_BYTE_COUNT,
            FieldKind::Address => codes::MALFORMED_ADDRESS,
            FieldKind::RecordKind => codes::UNKNOWN_RECORD_KIND,
            _ => codes::MALFORMED_CHECKSUM,
        };
        LineError::new(
            code,
            format!("failed to parse {} {:?}", field.kind.describe(), field.text),
            field.span(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind, text: &str) -> Field<'_> {
        Field {
            kind,
            text,
            start: 0,
            end: text.len(),
        }
    }

    #[test]
    fn pending_take_empties() {
        let mut p = Pending::Run(Record::end_of_file());
        assert!(p.take().is_some());
        assert!(p.take().is_none());
    }

    #[test]
    fn dry_source_flushes_pending_run() {
        let fields = vec![
            field(FieldKind::StartMarker, ":"),
            field(FieldKind::ByteCount, "01"),
            field(FieldKind::Address, "0000"),
            field(FieldKind::RecordKind, "00"),
            field(FieldKind::Data, "CB"),
            field(FieldKind::Checksum, "34"),
        ];
        let records: Vec<_> = parse_fields(fields.into_iter()).collect();
        assert_eq!(records, [Record::data(0, &[0xCB])]);
    }

    #[test]
    fn out_of_order_field_is_structural_error() {
        let fields = vec![
            field(FieldKind::StartMarker, ":"),
            field(FieldKind::Address, "0000"),
        ];
        let mut records = parse_fields(fields.into_iter());
        let first = records.next().unwrap();
        assert_eq!(
            first.error_message(),
            Some("expected byte count but got address")
        );
        assert!(records.next().is_none());
        let diags = records.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].id, codes::UNEXPECTED_FIELD);
        let ctx = diags[0].context.as_ref().unwrap();
        assert_eq!(ctx["expected"], "byte count");
        assert_eq!(ctx["found"], "address");
    }

    #[test]
    fn injected_lowercase_digits_are_parsed() {
        // The tokenizer never produces these, but the assembler does not
        // depend on it for correctness.
        let fields = vec![
            field(FieldKind::StartMarker, ":"),
            field(FieldKind::ByteCount, "01"),
            field(FieldKind::Address, "00ff"),
            field(FieldKind::RecordKind, "00"),
            field(FieldKind::Data, "cb"),
            field(FieldKind::Checksum, "35"),
        ];
        let records: Vec<_> = parse_fields(fields.into_iter()).collect();
        assert_eq!(records[0].address, 0x00FF);
        assert_eq!(records[0].data, "cb");
    }

    #[test]
    fn injected_data_of_wrong_width_is_rejected() {
        let fields = vec![
            field(FieldKind::StartMarker, ":"),
            field(FieldKind::ByteCount, "02"),
            field(FieldKind::Address, "0000"),
            field(FieldKind::RecordKind, "00"),
            field(FieldKind::Data, "CB"),
            field(FieldKind::Checksum, "33"),
        ];
        let mut records = parse_fields(fields.into_iter());
        assert!(records.next().unwrap().is_error());
        assert_eq!(records.diagnostics()[0].id, codes::TRUNCATED_DATA);
    }
}
