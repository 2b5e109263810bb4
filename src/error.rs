#![doc = r#"
Errors produced while decoding a Standard MIDI File

Every decode entry point returns a [`ReaderError`](crate::reader::ReaderError),
which pairs one of these with the byte offset where decoding stopped.
"#]

use thiserror::Error;

/// A decode failure, independent of where in the buffer it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Chunk framing is broken
    #[error("Chunk: {0}")]
    Chunk(#[from] ChunkError),
    /// The header chunk is unusable
    #[error("Header: {0}")]
    Header(#[from] HeaderError),
    /// A meta event payload does not fit its kind
    #[error("Meta event: {0}")]
    Meta(#[from] MetaError),
    /// A node event payload is malformed
    #[error("Node event: {0}")]
    Node(#[from] NodeError),
    /// A variable length quantity is malformed
    #[error("Delta time: {0}")]
    Vlq(#[from] VlqError),
    /// The status byte names no known channel event kind
    #[error("Unsupported event with status {0:#04X}")]
    UnsupportedEvent(u8),
}

/// Errors in the framing of `MThd` and `MTrk` chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The four byte tag was not the one expected
    #[error("Expected tag {expected:?}, found {found:?}")]
    Tag {
        /// Tag the decoder was looking for
        expected: [u8; 4],
        /// Tag in the buffer
        found: [u8; 4],
    },
    /// The chunk declares more bytes than the buffer has left
    #[error("Declared length {declared} but only {remaining} bytes remain")]
    Length {
        /// Declared by the chunk
        declared: u32,
        /// Left in the buffer
        remaining: usize,
    },
    /// An event runs past the end of its chunk
    #[error("Event overruns the end of its chunk")]
    Overrun,
    /// Fewer track chunks than the header declared
    #[error("Header declared {declared} tracks, found {found}")]
    MissingTracks {
        /// Declared by the header
        declared: u16,
        /// Found in the buffer
        found: u16,
    },
}

/// Errors in the header chunk body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header body must be exactly six bytes long
    #[error("Header length must be 6, got {0}")]
    Length(u32),
    /// Only format 1 files are supported
    #[error("Unsupported file format {0}")]
    UnsupportedFormat(u16),
    /// The division uses SMPTE time code rather than ticks per quarter note
    #[error("SMPTE division {0:#06X} is not supported")]
    SmpteDivision(u16),
    /// Zero ticks per quarter note
    #[error("Division must be non-zero")]
    ZeroDivision,
}

/// Errors in meta event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    /// The payload length is fixed for this kind
    #[error("Meta event {kind:#04X} requires {expected} bytes, got {found}")]
    Length {
        /// Meta kind byte
        kind: u8,
        /// Required payload length
        expected: usize,
        /// Actual payload length
        found: usize,
    },
    /// A tempo of zero microseconds per quarter note
    #[error("Tempo must be non-zero")]
    ZeroTempo,
    /// A time signature denominator exponent over 7
    #[error("Invalid time signature {0:?}")]
    TimeSignature([u8; 2]),
}

/// Errors in node event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The payload ends inside a length prefixed field
    #[error("Payload truncated reading {0}")]
    Truncated(&'static str),
    /// The identifier is not `[loop uuid] ':' node uuid`
    #[error("Malformed node identifier")]
    Identifier,
    /// The trajectory text is not `{{x, y}, {dx, dy}}`
    #[error("Malformed trajectory {0:?}")]
    Trajectory(String),
    /// The generator bytes do not describe a note
    #[error("Malformed note generator")]
    Generator,
}

/// Errors decoding a variable length quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VlqError {
    /// More than four bytes had the continuation bit set
    #[error("Quantity is longer than four bytes")]
    TooLong,
    /// The input ended with the continuation bit still set
    #[error("Quantity is not terminated")]
    Unterminated,
}

/// The broad class of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Lengths, tags or payloads are inconsistent with the bytes present
    StructurallyUnsound,
    /// The header names a format or division this crate does not read
    UnsupportedFormat,
    /// A channel event kind this crate does not know
    UnsupportedEvent,
}

impl ParseError {
    /// Classifies the failure.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Header(HeaderError::UnsupportedFormat(_) | HeaderError::SmpteDivision(_)) => {
                ErrorCategory::UnsupportedFormat
            }
            Self::UnsupportedEvent(_) => ErrorCategory::UnsupportedEvent,
            _ => ErrorCategory::StructurallyUnsound,
        }
    }
}
