//! Typed errors for the write path.

use crate::grammar::record::RecordKind;

/// Reasons a record cannot be encoded.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    /// `max_bytes_per_line` was zero.
    #[error("maximum bytes per line must be at least 1")]
    ZeroWidth,

    /// The record type has no output form.
    #[error("{0} records cannot be encoded")]
    UnsupportedKind(RecordKind),

    /// The payload length disagrees with the byte count.
    #[error("byte count {byte_count} needs {} data characters but the record has {chars}", .byte_count * 2)]
    DataLength {
        /// Declared byte count.
        byte_count: usize,
        /// Characters actually present in `data`.
        chars: usize,
    },

    /// The payload is not valid hex.
    #[error("data is not valid hex: {0}")]
    InvalidData(#[from] hex::FromHexError),

    /// A chunk would run past address 0xFFFF under [`AddressOverflow::Reject`].
    ///
    /// [`AddressOverflow::Reject`]: crate::grammar::emit::AddressOverflow::Reject
    #[error("{len} bytes at offset 0x{offset:X} run past the end of the 16-bit address space")]
    AddressOverflow {
        /// Unwrapped start offset of the chunk.
        offset: usize,
        /// Bytes in the chunk.
        len: usize,
    },
}
