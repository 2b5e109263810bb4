use super::Reader;
use crate::error::{ChunkError, ErrorCategory, ParseError};
use thiserror::Error;

#[doc = r#"
A decode failure and the absolute byte offset it was detected at

Every decode entry point of this crate returns one of these. Use
[`ReaderError::category`] to tell a damaged file apart from one that is merely
outside what this crate reads.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("At byte {position}: {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// Why decoding stopped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderErrorKind {
    /// The bytes are present but wrong
    #[error("{0}")]
    ParseError(#[from] ParseError),
    /// The buffer ended inside a value
    #[error("Unexpected end of buffer")]
    OutOfBounds,
}

impl ReaderErrorKind {
    pub(crate) const fn chunk(chunk_err: ChunkError) -> Self {
        Self::ParseError(ParseError::Chunk(chunk_err))
    }
}

impl ReaderError {
    /// Create an error at `position`.
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }

    /// An error for bytes that are present but cannot be decoded
    pub fn parse_error(position: usize, error: impl Into<ParseError>) -> Self {
        Self::new(position, ReaderErrorKind::ParseError(error.into()))
    }

    /// An error for a buffer that ended too early
    pub const fn oob(position: usize) -> Self {
        Self::new(position, ReaderErrorKind::OutOfBounds)
    }

    /// True if the buffer ended before a complete value was read.
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }

    /// The offset into the decoded buffer.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Why decoding stopped.
    pub const fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }

    /// The parse error, unless the buffer simply ran out.
    pub const fn parse_error_kind(&self) -> Option<&ParseError> {
        match &self.kind {
            ReaderErrorKind::ParseError(e) => Some(e),
            ReaderErrorKind::OutOfBounds => None,
        }
    }

    /// Which broad class of failure this is.
    ///
    /// Running out of bytes is always [`ErrorCategory::StructurallyUnsound`].
    pub const fn category(&self) -> ErrorCategory {
        match &self.kind {
            ReaderErrorKind::ParseError(e) => e.category(),
            ReaderErrorKind::OutOfBounds => ErrorCategory::StructurallyUnsound,
        }
    }
}

/// The result of every decode operation
pub type ReadResult<T> = Result<T, ReaderError>;

/// A parse error at the reader's current offset
pub(crate) fn inv_data(reader: &Reader<'_>, v: impl Into<ParseError>) -> ReaderError {
    ReaderError::parse_error(reader.buffer_position(), v)
}

#[test]
fn categories() {
    use crate::error::HeaderError;

    let truncated = ReaderError::oob(3);
    assert!(truncated.is_out_of_bounds());
    assert_eq!(truncated.category(), ErrorCategory::StructurallyUnsound);

    let format = ReaderError::parse_error(8, HeaderError::UnsupportedFormat(2));
    assert_eq!(format.category(), ErrorCategory::UnsupportedFormat);
    assert_eq!(format.position(), 8);

    let event = ReaderError::parse_error(30, ParseError::UnsupportedEvent(0xF0));
    assert_eq!(event.category(), ErrorCategory::UnsupportedEvent);
}
