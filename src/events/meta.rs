use core::fmt;
use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{error::MetaError, prelude::*, vlq};

/// Meta event kinds with a typed payload.
///
/// The byte following `0xFF` in a track chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MetaKind {
    /// Free text
    Text = 0x01,
    /// Copyright notice
    Copyright = 0x02,
    /// Sequence or track name
    TrackName = 0x03,
    /// Instrument name
    InstrumentName = 0x04,
    /// Marker text, also used for loop boundaries
    Marker = 0x06,
    /// Node placement, see [`NodeEvent`]
    Node = 0x07,
    /// Program name
    ProgramName = 0x08,
    /// Device name
    DeviceName = 0x09,
    /// End of track, always empty
    EndOfTrack = 0x2F,
    /// Microseconds per quarter note
    Tempo = 0x51,
    /// Time signature
    TimeSignature = 0x58,
}

#[doc = r#"
A tempo, stored the way a file stores it: microseconds per quarter note

# Example
```rust
# use midiseq::prelude::*;
let tempo = Tempo::from_bpm(120.);
assert_eq!(tempo.micros_per_quarter(), 500_000);
assert_eq!(tempo.bpm(), 120.);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo {
    micros_per_quarter: u32,
}

impl Tempo {
    /// The largest value three bytes hold.
    pub const MAX_MICROS: u32 = 0x00FF_FFFF;

    /// Create a tempo from microseconds per quarter note, clamped to `1..=MAX_MICROS`.
    pub const fn new(micros_per_quarter: u32) -> Self {
        let micros_per_quarter = if micros_per_quarter == 0 {
            1
        } else if micros_per_quarter > Self::MAX_MICROS {
            Self::MAX_MICROS
        } else {
            micros_per_quarter
        };
        Self { micros_per_quarter }
    }

    /// Create a tempo from beats per minute, rounding to whole microseconds.
    pub fn from_bpm(bpm: f64) -> Self {
        Self::new((60_000_000. / bpm).round() as u32)
    }

    /// Microseconds per quarter note
    pub const fn micros_per_quarter(&self) -> u32 {
        self.micros_per_quarter
    }

    /// Beats per minute
    pub fn bpm(&self) -> f64 {
        60_000_000. / self.micros_per_quarter as f64
    }

    fn to_bytes(self) -> [u8; 3] {
        let [_, a, b, c] = self.micros_per_quarter.to_be_bytes();
        [a, b, c]
    }
}

#[doc = r#"
The payload of a text meta event, kept as the bytes the file holds

Files are not required to carry UTF-8; Latin-1 names are common. The bytes are
written back unchanged, and [`MetaText::to_string_lossy`] gives a readable form.

# Example
```rust
# use midiseq::prelude::*;
let name = MetaText::from_bytes(b"Caf\xE9".to_vec());
assert_eq!(name.as_str(), None);
assert_eq!(name.to_string_lossy(), "Caf\u{FFFD}");
assert_eq!(name.as_bytes(), b"Caf\xE9");

assert_eq!(MetaText::from("lead").as_str(), Some("lead"));
```
"#]
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct MetaText {
    bytes: Vec<u8>,
}

impl MetaText {
    /// Wraps raw payload bytes.
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The text, if the bytes are UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    /// The text, with anything that is not UTF-8 replaced by `U+FFFD`.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl From<&str> for MetaText {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for MetaText {
    fn from(value: String) -> Self {
        Self::from_bytes(value.into_bytes())
    }
}

impl fmt::Debug for MetaText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => fmt::Debug::fmt(text, f),
            None => write!(f, "{:?} (not UTF-8)", self.to_string_lossy()),
        }
    }
}

impl fmt::Display for MetaText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// The payload of a [`MetaEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetaData {
    /// `0x01`
    Text(MetaText),
    /// `0x02`
    Copyright(MetaText),
    /// `0x03`
    TrackName(MetaText),
    /// `0x04`
    InstrumentName(MetaText),
    /// `0x06`
    Marker(MetaText),
    /// `0x08`
    ProgramName(MetaText),
    /// `0x09`
    DeviceName(MetaText),
    /// `0x2F`
    EndOfTrack,
    /// `0x51`
    Tempo(Tempo),
    /// `0x58`
    TimeSignature {
        /// Numerator and denominator
        signature: TimeSignature,
        /// MIDI clocks per metronome click
        clocks_per_click: u8,
        /// Notated 32nd notes per quarter note
        thirty_seconds_per_quarter: u8,
    },
    /// Any kind without a typed payload, kept verbatim
    Other {
        /// The kind byte
        kind: u8,
        /// The payload
        data: Vec<u8>,
    },
}

impl MetaData {
    /// A time signature with the conventional 24 clocks per click and 8
    /// thirty-second notes per quarter.
    pub fn time_signature(signature: TimeSignature) -> Self {
        Self::TimeSignature {
            signature,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }

    /// The kind byte written after `0xFF`.
    pub fn kind(&self) -> u8 {
        let kind = match self {
            Self::Text(_) => MetaKind::Text,
            Self::Copyright(_) => MetaKind::Copyright,
            Self::TrackName(_) => MetaKind::TrackName,
            Self::InstrumentName(_) => MetaKind::InstrumentName,
            Self::Marker(_) => MetaKind::Marker,
            Self::ProgramName(_) => MetaKind::ProgramName,
            Self::DeviceName(_) => MetaKind::DeviceName,
            Self::EndOfTrack => MetaKind::EndOfTrack,
            Self::Tempo(_) => MetaKind::Tempo,
            Self::TimeSignature { .. } => MetaKind::TimeSignature,
            Self::Other { kind, .. } => return *kind,
        };
        kind.into()
    }

    /// The text carried by the text-like kinds, decoded lossily.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.raw_text().map(MetaText::to_string_lossy)
    }

    /// The undecoded text carried by the text-like kinds.
    pub fn raw_text(&self) -> Option<&MetaText> {
        match self {
            Self::Text(t)
            | Self::Copyright(t)
            | Self::TrackName(t)
            | Self::InstrumentName(t)
            | Self::Marker(t)
            | Self::ProgramName(t)
            | Self::DeviceName(t) => Some(t),
            _ => None,
        }
    }

    /// Payload bytes, without the kind or length.
    pub fn payload(&self) -> Vec<u8> {
        if let Some(text) = self.raw_text() {
            return text.as_bytes().to_vec();
        }
        match self {
            Self::EndOfTrack => Vec::new(),
            Self::Tempo(tempo) => tempo.to_bytes().to_vec(),
            Self::TimeSignature {
                signature,
                clocks_per_click,
                thirty_seconds_per_quarter,
            } => {
                let [numerator, exponent] = signature.to_bytes();
                vec![
                    numerator,
                    exponent,
                    *clocks_per_click,
                    *thirty_seconds_per_quarter,
                ]
            }
            Self::Other { data, .. } => data.clone(),
            _ => Vec::new(),
        }
    }

    /// Interprets a payload of the given kind.
    ///
    /// Kind `0x07` is handled by [`NodeEvent`] and lands here only as [`MetaData::Other`].
    pub fn parse(kind: u8, payload: &[u8]) -> Result<Self, MetaError> {
        let text = || MetaText::from_bytes(payload.to_vec());
        let expect = |expected: usize| {
            if payload.len() == expected {
                Ok(())
            } else {
                Err(MetaError::Length {
                    kind,
                    expected,
                    found: payload.len(),
                })
            }
        };

        let Ok(known) = MetaKind::try_from(kind) else {
            return Ok(Self::Other {
                kind,
                data: payload.to_vec(),
            });
        };
        Ok(match known {
            MetaKind::Text => Self::Text(text()),
            MetaKind::Copyright => Self::Copyright(text()),
            MetaKind::TrackName => Self::TrackName(text()),
            MetaKind::InstrumentName => Self::InstrumentName(text()),
            MetaKind::Marker => Self::Marker(text()),
            MetaKind::ProgramName => Self::ProgramName(text()),
            MetaKind::DeviceName => Self::DeviceName(text()),
            MetaKind::EndOfTrack => {
                expect(0)?;
                Self::EndOfTrack
            }
            MetaKind::Tempo => {
                expect(3)?;
                let micros = u32::from_be_bytes([0, payload[0], payload[1], payload[2]]);
                if micros == 0 {
                    return Err(MetaError::ZeroTempo);
                }
                Self::Tempo(Tempo::new(micros))
            }
            MetaKind::TimeSignature => {
                expect(4)?;
                let bytes = [payload[0], payload[1]];
                let signature =
                    TimeSignature::from_bytes(bytes).ok_or(MetaError::TimeSignature(bytes))?;
                Self::TimeSignature {
                    signature,
                    clocks_per_click: payload[2],
                    thirty_seconds_per_quarter: payload[3],
                }
            }
            MetaKind::Node => Self::Other {
                kind,
                data: payload.to_vec(),
            },
        })
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "text '{t}'"),
            Self::Copyright(t) => write!(f, "copyright '{t}'"),
            Self::TrackName(t) => write!(f, "track name '{t}'"),
            Self::InstrumentName(t) => write!(f, "instrument '{t}'"),
            Self::Marker(t) => write!(f, "marker '{t}'"),
            Self::ProgramName(t) => write!(f, "program '{t}'"),
            Self::DeviceName(t) => write!(f, "device '{t}'"),
            Self::EndOfTrack => f.write_str("end of track"),
            Self::Tempo(t) => write!(f, "tempo {} bpm", t.bpm()),
            Self::TimeSignature { signature, .. } => write!(f, "time signature {signature}"),
            Self::Other { kind, data } => write!(f, "meta {kind:#04X} ({} bytes)", data.len()),
        }
    }
}

/// A meta event and its place in a track.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEvent {
    pub(crate) time: BarBeatTime,
    pub(crate) delta: Option<u32>,
    data: MetaData,
}

impl MetaEvent {
    /// Create an event at `time`.
    pub fn new(data: MetaData, time: BarBeatTime) -> Self {
        Self {
            time,
            delta: None,
            data,
        }
    }

    /// When the event occurs.
    pub const fn time(&self) -> &BarBeatTime {
        &self.time
    }

    /// The payload.
    pub fn data(&self) -> &MetaData {
        &self.data
    }

    /// The end-of-track event that closes every track chunk.
    pub fn end_of_track(time: BarBeatTime) -> Self {
        Self::new(MetaData::EndOfTrack, time)
    }

    /// Appends `FF <kind> <length> <payload>`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let payload = self.data.payload();
        out.push(0xFF);
        out.push(self.data.kind());
        vlq::write(payload.len() as u32, out);
        out.extend_from_slice(&payload);
    }
}

impl fmt::Display for MetaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.data)
    }
}

#[test]
fn tempo_payload() {
    use pretty_assertions::assert_eq;
    let data = MetaData::parse(0x51, &[0x07, 0xA1, 0x20]).unwrap();
    assert_eq!(data, MetaData::Tempo(Tempo::from_bpm(120.)));
    assert_eq!(data.payload(), vec![0x07, 0xA1, 0x20]);
    assert_eq!(
        MetaData::parse(0x51, &[0x07, 0xA1]),
        Err(MetaError::Length {
            kind: 0x51,
            expected: 3,
            found: 2
        })
    );
    assert_eq!(MetaData::parse(0x51, &[0, 0, 0]), Err(MetaError::ZeroTempo));
}

#[test]
fn time_signature_payload() {
    use pretty_assertions::assert_eq;
    let data = MetaData::parse(0x58, &[6, 3, 24, 8]).unwrap();
    let six_eight = TimeSignature::new(6, 8).unwrap();
    assert_eq!(data, MetaData::time_signature(six_eight));
    assert_eq!(data.payload(), vec![6, 3, 24, 8]);
}

#[test]
fn unknown_kinds_are_kept() {
    let data = MetaData::parse(0x7F, &[1, 2, 3]).unwrap();
    assert_eq!(data.kind(), 0x7F);
    assert_eq!(data.payload(), vec![1, 2, 3]);
}

#[test]
fn meta_event_bytes() {
    let event = MetaEvent::new(
        MetaData::TrackName("Bass".into()),
        BarBeatTime::default(),
    );
    let mut out = Vec::new();
    event.write_to(&mut out);
    assert_eq!(out, [0xFF, 0x03, 0x04, b'B', b'a', b's', b's']);
}

#[test]
fn text_that_is_not_utf8() {
    use pretty_assertions::assert_eq;
    let data = MetaData::parse(0x03, b"Caf\xE9").unwrap();
    assert_eq!(data, MetaData::TrackName(MetaText::from_bytes(b"Caf\xE9".to_vec())));
    assert_eq!(data.text().as_deref(), Some("Caf\u{FFFD}"));
    assert_eq!(data.raw_text().and_then(MetaText::as_str), None);
    assert_eq!(data.payload(), b"Caf\xE9".to_vec());
}
