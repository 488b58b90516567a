/// Intel HEX line checksum.
pub mod checksum;
/// Re-exports from the diagnostics crate.
pub mod diag;
/// JSON serialization helpers for records.
pub mod dump;
/// Intel HEX encoder — converts records back into chunked lines.
pub mod emit;
/// Intel HEX tokenizer — scans raw text into a lazy stream of borrowed fields.
pub mod lexer;
/// Intel HEX record assembler — converts fields into merged, checksummed records.
pub mod parser;
/// Record types shared by the read and write paths.
pub mod record;
