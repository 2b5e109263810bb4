#![doc = r#"
Events stored in a track chunk

# Overview

Every [`Event`] is one of three kinds:

- [`MetaEvent`]: `FF <kind> <length> <payload>`, carrying text, tempo, time
  signature and so on
- [`ChannelEvent`]: a status byte and one or two data bytes
- [`NodeEvent`]: a meta event of kind `0x07` recording a node placement

Each event carries the musical time it occurs at and, when it was decoded from
a file, the delta time it was read with. Deltas are recomputed from times when
a track is written, so editing an event only requires moving its time.
"#]

mod channel;
pub use channel::*;

mod container;
pub use container::*;

mod meta;
pub use meta::*;

mod node;
pub use node::*;

use core::fmt;

use crate::{
    error::ParseError,
    prelude::*,
    reader::{ReadResult, Reader, ReaderError, inv_data},
};

/// Any event that may appear in a track chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A meta event
    Meta(MetaEvent),
    /// A channel event
    Channel(ChannelEvent),
    /// A node placement
    Node(NodeEvent),
}

impl Event {
    /// The time the event occurs at.
    pub const fn time(&self) -> &BarBeatTime {
        match self {
            Self::Meta(e) => &e.time,
            Self::Channel(e) => &e.time,
            Self::Node(e) => &e.time,
        }
    }

    /// Moves the event.
    pub fn set_time(&mut self, time: BarBeatTime) {
        match self {
            Self::Meta(e) => e.time = time,
            Self::Channel(e) => e.time = time,
            Self::Node(e) => e.time = time,
        }
    }

    /// Returns a copy of the event moved to `time`.
    pub fn with_time(mut self, time: BarBeatTime) -> Self {
        self.set_time(time);
        self
    }

    /// The delta the event was decoded with, if it came from a file.
    pub const fn delta(&self) -> Option<u32> {
        match self {
            Self::Meta(e) => e.delta,
            Self::Channel(e) => e.delta,
            Self::Node(e) => e.delta,
        }
    }

    pub(crate) fn set_delta(&mut self, delta: u32) {
        match self {
            Self::Meta(e) => e.delta = Some(delta),
            Self::Channel(e) => e.delta = Some(delta),
            Self::Node(e) => e.delta = Some(delta),
        }
    }

    /// The meta event, if this is one.
    pub const fn as_meta(&self) -> Option<&MetaEvent> {
        match self {
            Self::Meta(e) => Some(e),
            _ => None,
        }
    }

    /// The channel event, if this is one.
    pub const fn as_channel(&self) -> Option<&ChannelEvent> {
        match self {
            Self::Channel(e) => Some(e),
            _ => None,
        }
    }

    /// The node event, if this is one.
    pub const fn as_node(&self) -> Option<&NodeEvent> {
        match self {
            Self::Node(e) => Some(e),
            _ => None,
        }
    }

    /// Appends the event's bytes, without a delta.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Meta(e) => e.write_to(out),
            Self::Channel(e) => e.write_to(out),
            Self::Node(e) => e.write_to(out),
        }
    }

    /// The event's bytes, without a delta.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Reads one event (not its delta) from `reader`, stamping it with `time`.
    pub(crate) fn read(reader: &mut Reader<'_>, time: BarBeatTime) -> ReadResult<Self> {
        let status = reader.read_u8()?;
        if status == 0xFF {
            let kind = reader.read_u8()?;
            let len = reader.read_vlq()?;
            let payload_position = reader.buffer_position();
            let payload = reader.read_exact(len as usize)?;

            let event = if kind == u8::from(MetaKind::Node) {
                NodeEvent::parse(payload, time)
                    .map(Self::Node)
                    .map_err(|e| ReaderError::parse_error(payload_position, e))?
            } else {
                MetaData::parse(kind, payload)
                    .map(|data| Self::Meta(MetaEvent::new(data, time)))
                    .map_err(|e| ReaderError::parse_error(payload_position, e))?
            };
            return Ok(event);
        }

        let Some(status) = Status::from_byte(status) else {
            return Err(inv_data(reader, ParseError::UnsupportedEvent(status)));
        };
        let data1 = reader.read_u8()?;
        let data2 = match status.kind().data_len() {
            1 => None,
            _ => Some(reader.read_u8()?),
        };
        Ok(Self::Channel(ChannelEvent::new(status, data1, data2, time)))
    }
}

impl From<MetaEvent> for Event {
    fn from(value: MetaEvent) -> Self {
        Self::Meta(value)
    }
}

impl From<ChannelEvent> for Event {
    fn from(value: ChannelEvent) -> Self {
        Self::Channel(value)
    }
}

impl From<NodeEvent> for Event {
    fn from(value: NodeEvent) -> Self {
        Self::Node(value)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meta(e) => fmt::Display::fmt(e, f),
            Self::Channel(e) => fmt::Display::fmt(e, f),
            Self::Node(e) => fmt::Display::fmt(e, f),
        }
    }
}

#[test]
fn read_channel_and_meta() {
    use pretty_assertions::assert_eq;
    let time = BarBeatTime::default();
    let bytes = [0x90, 0x3C, 0x64, 0xC1, 0x05, 0xFF, 0x2F, 0x00];
    let mut reader = Reader::from_byte_slice(&bytes);

    assert_eq!(
        Event::read(&mut reader, time).unwrap(),
        Event::from(ChannelEvent::note_on(0, 0x3C, 0x64, time))
    );
    let program = Event::read(&mut reader, time).unwrap();
    assert_eq!(program.to_bytes(), vec![0xC1, 0x05]);
    assert_eq!(
        Event::read(&mut reader, time).unwrap(),
        Event::from(MetaEvent::end_of_track(time))
    );
    assert!(reader.is_empty());
}

#[test]
fn unknown_status_is_unsupported() {
    let mut reader = Reader::from_byte_slice(&[0xF0, 0x01]);
    let err = Event::read(&mut reader, BarBeatTime::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedEvent);
}
