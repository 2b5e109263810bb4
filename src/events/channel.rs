use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::prelude::*;

/// The high nibble of a channel event's status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StatusKind {
    /// Release a key
    NoteOff = 0x8,
    /// Press a key
    NoteOn = 0x9,
    /// Pressure on a single held key
    PolyphonicKeyPressure = 0xA,
    /// Controller value
    ControlChange = 0xB,
    /// Select a program, one data byte
    ProgramChange = 0xC,
    /// Pressure across the channel, one data byte
    ChannelPressure = 0xD,
    /// Pitch wheel, fourteen bits split over two data bytes
    PitchBend = 0xE,
}

impl StatusKind {
    /// The number of data bytes following the status byte.
    pub const fn data_len(&self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            _ => 2,
        }
    }
}

/// A status byte: event kind and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    kind: StatusKind,
    channel: u8,
}

impl Status {
    /// Create a status. Only the low four bits of `channel` are kept.
    pub const fn new(kind: StatusKind, channel: u8) -> Self {
        Self {
            kind,
            channel: channel & 0x0F,
        }
    }

    /// Decodes a status byte, returning `None` for system and data bytes.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let kind = StatusKind::try_from(byte >> 4).ok()?;
        Some(Self::new(kind, byte))
    }

    /// The event kind
    pub const fn kind(&self) -> StatusKind {
        self.kind
    }

    /// The channel, `0..16`
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// The byte as written
    pub fn to_byte(&self) -> u8 {
        (u8::from(self.kind) << 4) | self.channel
    }
}

#[doc = r#"
A channel voice event: a status byte followed by one or two data bytes

# Example
```rust
# use midiseq::prelude::*;
let time = BarBeatTime::default();
let event = ChannelEvent::new(Status::new(StatusKind::NoteOn, 2), 60, Some(100), time);

let mut bytes = Vec::new();
event.write_to(&mut bytes);
assert_eq!(bytes, [0x92, 60, 100]);
```
"#]
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub(crate) time: BarBeatTime,
    pub(crate) delta: Option<u32>,
    status: Status,
    data1: u8,
    data2: Option<u8>,
}

impl ChannelEvent {
    /// Create an event at `time`.
    ///
    /// Data bytes are masked to seven bits. `data2` is dropped for kinds that
    /// carry one data byte and defaults to zero for kinds that carry two.
    pub fn new(status: Status, data1: u8, data2: Option<u8>, time: BarBeatTime) -> Self {
        let data2 = match status.kind.data_len() {
            1 => None,
            _ => Some(data2.unwrap_or(0) & 0x7F),
        };
        Self {
            time,
            delta: None,
            status,
            data1: data1 & 0x7F,
            data2,
        }
    }

    /// Note on for `note` at `velocity`.
    pub fn note_on(channel: u8, note: u8, velocity: u8, time: BarBeatTime) -> Self {
        Self::new(
            Status::new(StatusKind::NoteOn, channel),
            note,
            Some(velocity),
            time,
        )
    }

    /// Note off for `note`.
    pub fn note_off(channel: u8, note: u8, time: BarBeatTime) -> Self {
        Self::new(
            Status::new(StatusKind::NoteOff, channel),
            note,
            Some(0),
            time,
        )
    }

    /// When the event occurs.
    pub const fn time(&self) -> &BarBeatTime {
        &self.time
    }

    /// The status byte.
    pub const fn status(&self) -> Status {
        self.status
    }

    /// The first data byte.
    pub const fn data1(&self) -> u8 {
        self.data1
    }

    /// The second data byte, if the kind has one.
    pub const fn data2(&self) -> Option<u8> {
        self.data2
    }

    /// Appends the status and data bytes.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.status.to_byte());
        out.push(self.data1);
        if let Some(data2) = self.data2 {
            out.push(data2);
        }
    }
}

impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ch{} {}",
            self.time, self.status.kind, self.status.channel, self.data1
        )?;
        if let Some(data2) = self.data2 {
            write!(f, " {data2}")?;
        }
        Ok(())
    }
}

#[test]
fn status_bytes() {
    let status = Status::from_byte(0xC3).unwrap();
    assert_eq!(status.kind(), StatusKind::ProgramChange);
    assert_eq!(status.channel(), 3);
    assert_eq!(status.to_byte(), 0xC3);
    assert_eq!(status.kind().data_len(), 1);

    assert_eq!(Status::from_byte(0xF8), None);
    assert_eq!(Status::from_byte(0x40), None);
}

#[test]
fn one_data_byte_kinds() {
    let event = ChannelEvent::new(
        Status::new(StatusKind::ChannelPressure, 0),
        90,
        Some(12),
        BarBeatTime::default(),
    );
    assert_eq!(event.data2(), None);
    let mut out = Vec::new();
    event.write_to(&mut out);
    assert_eq!(out, [0xD0, 90]);
}
