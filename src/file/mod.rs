#![doc = r#"
Reading and writing Standard MIDI Files

A file is one [`HeaderChunk`] followed by the number of [`TrackChunk`]s it
declares. Decoding stamps every event with a [`BarBeatTime`] whose subbeat
divisor is the header's division; beats per bar and tempo come from
[`DecodeOptions`].

Tempo changes inside a file are not used to segment the timeline. Every event
is stamped with the same units, and a file carrying more than one tempo event
is logged at `warn` level.

# Example
```rust
# use midiseq::prelude::*;
let bytes = [
    0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x01, 0x01, 0xE0,
    0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x0C,
    0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
    0x83, 0x60, 0xFF, 0x2F, 0x00,
];
let file = MidiFile::parse(&bytes).unwrap();
assert_eq!(file.header().division(), 480);

let events = file.tracks()[0].events();
assert_eq!(events.tempo_events().next().map(Tempo::bpm), Some(120.));
let end = events.iter().last().unwrap().time();
assert_eq!((end.bar(), end.beat()), (0, 1));

assert_eq!(file.to_bytes(), bytes);
```
"#]

mod header;
pub use header::*;

mod track;
pub use track::*;

use crate::{
    error::ChunkError,
    prelude::*,
    reader::{ReadResult, Reader, ReaderError, ReaderErrorKind},
};

/// Decode settings not carried by the file itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeOptions {
    /// Beats per bar of the stamped times
    pub beats_per_bar: u32,
    /// Tempo of the stamped times
    pub beats_per_minute: f64,
}

impl DecodeOptions {
    /// The units for a file with the given division.
    pub fn units(&self, division: u16) -> TimeUnits {
        TimeUnits::new(self.beats_per_bar, self.beats_per_minute, division as u32)
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            beats_per_bar: TimeUnits::DEFAULT.beats_per_bar,
            beats_per_minute: TimeUnits::DEFAULT.beats_per_minute,
        }
    }
}

/// A decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    header: HeaderChunk,
    tracks: Vec<TrackChunk>,
}

impl MidiFile {
    /// Create a file from tracks. The header's track count is set from `tracks`.
    ///
    /// # Panics
    ///
    /// If there are more than `u16::MAX` tracks, which a header cannot count.
    pub fn new(division: u16, tracks: Vec<TrackChunk>) -> Self {
        let Ok(num_tracks) = u16::try_from(tracks.len()) else {
            panic!("{} tracks do not fit in a MIDI file header", tracks.len());
        };
        Self {
            header: HeaderChunk::new(num_tracks, division),
            tracks,
        }
    }

    /// Parse a complete file with the default [`DecodeOptions`].
    pub fn parse(bytes: &[u8]) -> ReadResult<Self> {
        Self::parse_with(bytes, DecodeOptions::default())
    }

    /// Parse a complete file.
    ///
    /// # Panics
    /// if `options` holds a zero beats per bar or a non-positive tempo.
    pub fn parse_with(bytes: &[u8], options: DecodeOptions) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);
        let header = HeaderChunk::parse(&mut reader)?;
        let units = options.units(header.division());

        let mut tracks = Vec::with_capacity(header.track_count() as usize);
        for found in 0..header.track_count() {
            if reader.is_empty() {
                return Err(ReaderError::new(
                    reader.buffer_position(),
                    ReaderErrorKind::chunk(ChunkError::MissingTracks {
                        declared: header.track_count(),
                        found,
                    }),
                ));
            }
            tracks.push(TrackChunk::parse(&mut reader, units)?);
        }
        if !reader.is_empty() {
            log::debug!(
                "Ignoring {} bytes after the last declared track",
                reader.remaining()
            );
        }

        let tempo_count: usize = tracks.iter().map(|t| t.events().tempo_events().count()).sum();
        if tempo_count > 1 {
            log::warn!(
                "File has {tempo_count} tempo events; every event is stamped at {} bpm",
                options.beats_per_minute
            );
        }

        Ok(Self { header, tracks })
    }

    /// The header chunk.
    pub const fn header(&self) -> &HeaderChunk {
        &self.header
    }

    /// The track chunks.
    pub fn tracks(&self) -> &[TrackChunk] {
        &self.tracks
    }

    /// Splits the file into its header and tracks.
    pub fn into_parts(self) -> (HeaderChunk, Vec<TrackChunk>) {
        (self.header, self.tracks)
    }

    /// Encodes the header and every track.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.header, &self.tracks)
    }
}

/// Decodes a complete file into its header and tracks.
pub fn decode(bytes: &[u8]) -> ReadResult<(HeaderChunk, Vec<TrackChunk>)> {
    MidiFile::parse(bytes).map(MidiFile::into_parts)
}

/// Encodes a header and tracks.
///
/// The header is written as given; keeping its track count in step with
/// `tracks` is up to the caller.
pub fn encode(header: &HeaderChunk, tracks: &[TrackChunk]) -> Vec<u8> {
    if header.track_count() as usize != tracks.len() {
        log::warn!(
            "Header declares {} tracks but {} are written",
            header.track_count(),
            tracks.len()
        );
    }
    let mut out = header.to_bytes().to_vec();
    for track in tracks {
        out.extend_from_slice(&track.to_bytes(header.division()));
    }
    log::debug!("Wrote file: {header}, {} bytes", out.len());
    out
}
