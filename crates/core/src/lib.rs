//! Intel HEX core library.
//!
//! Provides tokenizing, record assembly, and encoding of Intel HEX text.
//! The main entry points are [`parse`] for lazily reading records,
//! [`parse_str`] for reading a whole document with diagnostics, and
//! [`emit_record`] / [`encode`] for writing.
//!
//! ```
//! use intelhex_core::{Record, encode, parse};
//!
//! let records: Vec<Record> = parse(":01000000CB34\n").collect();
//! assert_eq!(records, [Record::data(0, &[0xCB])]);
//! assert_eq!(encode(&records[0], 32).unwrap(), ":01000000CB34\n");
//! ```

#![warn(missing_docs)]

/// Typed errors for the write path.
pub mod error;
/// Intel HEX grammar: tokenizer, assembler, record model, and encoder.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Tokenizer
pub use grammar::lexer::{Field, FieldKind, LexError, Lexer, tokenize};

// Assembler
pub use grammar::parser::{ParseResult, Records, parse, parse_fields, parse_str};

// Records
pub use grammar::checksum::{Checksum, line_checksum};
pub use grammar::record::{Record, RecordKind};

// Encoder
pub use error::EmitError;
pub use grammar::emit::{
    AddressOverflow, DEFAULT_BYTES_PER_LINE, END_OF_FILE_LINE, EmitConfig, emit_record,
    emit_records, encode,
};

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, Severity, Span, codes};

// Serialization helpers
pub use grammar::dump::to_pretty_json;
