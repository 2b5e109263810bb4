use core::fmt;

use crate::{
    error::{ChunkError, HeaderError},
    prelude::*,
    reader::{ReadResult, Reader, ReaderError, ReaderErrorKind, inv_data},
};

#[doc = r#"
The `MThd` chunk: file format, track count and timing resolution

Always 14 bytes on disk:

```text
4D 54 68 64   "MThd"
00 00 00 06   length
00 01         format
00 01         track count
01 E0         division (ticks per quarter note)
```

Only format 1 (simultaneous tracks) with a ticks-per-quarter-note division is
read or written.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderChunk {
    track_count: u16,
    division: u16,
}

impl HeaderChunk {
    /// The chunk tag
    pub const TAG: [u8; 4] = *b"MThd";
    /// The only supported format code
    pub const FORMAT: u16 = 1;
    /// Body length in bytes
    pub const LENGTH: u32 = 6;

    /// Create a header.
    ///
    /// # Panics
    /// if `division` is zero or has its top bit set (SMPTE timing).
    pub const fn new(track_count: u16, division: u16) -> Self {
        assert!(
            division != 0 && division & 0x8000 == 0,
            "division must be a ticks per quarter note value in 1..=0x7FFF"
        );
        Self {
            track_count,
            division,
        }
    }

    /// The format code, always [`HeaderChunk::FORMAT`].
    pub const fn format(&self) -> u16 {
        Self::FORMAT
    }

    /// The number of track chunks that follow.
    pub const fn track_count(&self) -> u16 {
        self.track_count
    }

    /// Ticks per quarter note.
    pub const fn division(&self) -> u16 {
        self.division
    }

    /// Reads a header chunk from the start of `reader`.
    pub fn parse(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let start = reader.buffer_position();
        let found: [u8; 4] = reader.read_exact_size()?;
        if found != Self::TAG {
            return Err(ReaderError::new(
                start,
                ReaderErrorKind::chunk(ChunkError::Tag {
                    expected: Self::TAG,
                    found,
                }),
            ));
        }

        let length = reader.read_u32()?;
        if length != Self::LENGTH {
            return Err(inv_data(reader, HeaderError::Length(length)));
        }

        let format = reader.read_u16()?;
        if format != Self::FORMAT {
            return Err(inv_data(reader, HeaderError::UnsupportedFormat(format)));
        }
        let track_count = reader.read_u16()?;
        let division = reader.read_u16()?;
        if division & 0x8000 != 0 {
            return Err(inv_data(reader, HeaderError::SmpteDivision(division)));
        }
        if division == 0 {
            return Err(inv_data(reader, HeaderError::ZeroDivision));
        }

        let header = Self {
            track_count,
            division,
        };
        log::debug!("Read header: {header}");
        Ok(header)
    }

    /// The 14 bytes of the chunk.
    pub fn to_bytes(&self) -> [u8; 14] {
        let mut out = [0; 14];
        out[..4].copy_from_slice(&Self::TAG);
        out[4..8].copy_from_slice(&Self::LENGTH.to_be_bytes());
        out[8..10].copy_from_slice(&Self::FORMAT.to_be_bytes());
        out[10..12].copy_from_slice(&self.track_count.to_be_bytes());
        out[12..].copy_from_slice(&self.division.to_be_bytes());
        out
    }
}

impl Default for HeaderChunk {
    fn default() -> Self {
        Self::new(0, 480)
    }
}

impl fmt::Display for HeaderChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "format {}, {} tracks, division {}",
            Self::FORMAT,
            self.track_count,
            self.division
        )
    }
}
