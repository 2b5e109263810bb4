use std::borrow::Cow;

use crate::{
    error::ChunkError,
    prelude::*,
    reader::{ReadResult, Reader, ReaderError, ReaderErrorKind},
    vlq,
};

#[doc = r#"
An `MTrk` chunk: a run of delta-time prefixed events

Decoding accumulates deltas into an absolute tick count and stamps each event
with the [`BarBeatTime`] for that count. Encoding goes the other way, deriving
each delta from the event's time and the time of the event before it. An event
placed earlier than its predecessor is written with a delta of zero.

# Example
```rust
# use midiseq::prelude::*;
let units = TimeUnits::default();
let track = TrackChunk::from_events([
    Event::from(ChannelEvent::note_on(0, 60, 100, BarBeatTime::zero(units))),
    Event::from(ChannelEvent::note_off(0, 60, BarBeatTime::new(0, 1, 0, units))),
]);

let bytes = track.to_bytes(480);
assert_eq!(&bytes[..4], b"MTrk");
// note on, delta 480 note off, end of track
assert_eq!(
    &bytes[8..],
    &[0x00, 0x90, 60, 100, 0x83, 0x60, 0x80, 60, 0, 0x00, 0xFF, 0x2F, 0x00]
);
```
"#]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackChunk {
    events: EventContainer,
}

impl TrackChunk {
    /// The chunk tag
    pub const TAG: [u8; 4] = *b"MTrk";

    /// Create a track from its events.
    pub fn new(events: EventContainer) -> Self {
        Self { events }
    }

    /// Create a track from anything yielding events.
    pub fn from_events<E: Into<Event>>(events: impl IntoIterator<Item = E>) -> Self {
        Self::new(events.into_iter().collect())
    }

    /// The events, in file order.
    pub fn events(&self) -> &EventContainer {
        &self.events
    }

    /// Mutable access to the events.
    pub fn events_mut(&mut self) -> &mut EventContainer {
        &mut self.events
    }

    /// Takes the events out of the chunk.
    pub fn into_events(self) -> EventContainer {
        self.events
    }

    /// The first track name, if any, decoded lossily.
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.events.meta_events().find_map(|e| match e.data() {
            MetaData::TrackName(name) => Some(name.to_string_lossy()),
            _ => None,
        })
    }

    /// Reads a track chunk, stamping events in `units`.
    ///
    /// `units.subbeat_divisor` must be the file's division for the stamped
    /// times to be musically correct.
    pub fn parse(reader: &mut Reader<'_>, units: TimeUnits) -> ReadResult<Self> {
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

        let declared = reader.read_u32()?;
        if declared as usize > reader.remaining() {
            return Err(ReaderError::new(
                reader.buffer_position(),
                ReaderErrorKind::chunk(ChunkError::Length {
                    declared,
                    remaining: reader.remaining(),
                }),
            ));
        }
        let mut chunk = reader.split_off(declared as usize)?;

        let mut events = EventContainer::new();
        let mut ticks = 0i64;
        while !chunk.is_empty() {
            let overrun = |e: ReaderError| {
                if e.is_out_of_bounds() {
                    ReaderError::new(e.position(), ReaderErrorKind::chunk(ChunkError::Overrun))
                } else {
                    e
                }
            };
            let delta = chunk.read_vlq().map_err(overrun)?;
            ticks += delta as i64;
            let mut event =
                Event::read(&mut chunk, BarBeatTime::from_ticks(ticks, units)).map_err(overrun)?;
            event.set_delta(delta);
            events.push(event);
        }

        log::debug!(
            "Read track chunk at {start}: {declared} bytes, {} events",
            events.len()
        );
        Ok(Self { events })
    }

    /// Encodes the chunk with deltas in `division` ticks per quarter note.
    ///
    /// An end-of-track event is appended if the last event is not one.
    pub fn to_bytes(&self, division: u16) -> Vec<u8> {
        let mut body = Vec::new();
        let mut previous = 0u64;
        for event in &self.events {
            let ticks = file_ticks(event.time(), division);
            let delta = ticks.saturating_sub(previous);
            let written = u32::try_from(delta).map_or(vlq::MAX, |delta| delta.min(vlq::MAX));
            if u64::from(written) < delta {
                log::warn!("Delta time {delta} too large for a track, writing {written}");
            }
            // later deltas are measured from where this event actually landed
            previous += u64::from(written);
            vlq::write(written, &mut body);
            event.write_to(&mut body);
        }

        let terminated = matches!(
            self.events.as_slice().last(),
            Some(Event::Meta(e)) if *e.data() == MetaData::EndOfTrack
        );
        if !terminated {
            body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        }

        log::debug!(
            "Wrote track chunk: {} bytes, {} events",
            body.len(),
            self.events.len()
        );

        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(&Self::TAG);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// The tick count of `time` at `division` ticks per beat. Negative times are clamped to zero.
fn file_ticks(time: &BarBeatTime, division: u16) -> u64 {
    if time.is_negative() {
        return 0;
    }
    let divisor = time.subbeat_divisor() as u64;
    let division = division as u64;
    if divisor == division {
        time.magnitude_ticks()
    } else {
        (time.magnitude_ticks() * division + divisor / 2) / divisor
    }
}

impl From<EventContainer> for TrackChunk {
    fn from(events: EventContainer) -> Self {
        Self::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn units() -> TimeUnits {
        TimeUnits::default()
    }

    #[test]
    fn decode_stamps_times() {
        let bytes = [
            b'M', b'T', b'r', b'k', 0, 0, 0, 13, //
            0x00, 0x90, 60, 100, //
            0x83, 0x60, 0x80, 60, 0, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let track = TrackChunk::parse(&mut Reader::from_byte_slice(&bytes), units()).unwrap();
        let deltas: Vec<_> = track.events().iter().map(Event::delta).collect();
        let ticks: Vec<_> = track.events().iter().map(|e| e.time().to_ticks()).collect();
        assert_eq!(deltas, vec![Some(0), Some(480), Some(0)]);
        assert_eq!(ticks, vec![0, 480, 480]);
        assert_eq!(track.to_bytes(480), bytes);
    }

    #[test]
    fn backwards_events_get_zero_delta() {
        let at = |ticks| BarBeatTime::from_ticks(ticks, units());
        let track = TrackChunk::from_events([
            ChannelEvent::note_on(0, 60, 100, at(960)),
            ChannelEvent::note_on(0, 62, 100, at(480)),
            ChannelEvent::note_on(0, 64, 100, at(1_000)),
        ]);
        let bytes = track.to_bytes(480);
        let parsed = TrackChunk::parse(&mut Reader::from_byte_slice(&bytes), units()).unwrap();
        let deltas: Vec<_> = parsed.events().iter().map(Event::delta).collect();
        assert_eq!(deltas, vec![Some(960), Some(0), Some(40), Some(0)]);
    }

    #[test]
    fn oversized_delta_keeps_later_spacing() {
        let at = |ticks| BarBeatTime::from_ticks(ticks, units());
        let max = vlq::MAX as i64;
        let track = TrackChunk::from_events([
            ChannelEvent::note_on(0, 60, 100, at(max + 10)),
            ChannelEvent::note_off(0, 60, at(max + 30)),
        ]);
        let bytes = track.to_bytes(480);
        let parsed = TrackChunk::parse(&mut Reader::from_byte_slice(&bytes), units()).unwrap();
        let deltas: Vec<_> = parsed.events().iter().map(Event::delta).collect();
        assert_eq!(deltas, vec![Some(vlq::MAX), Some(20), Some(0)]);
    }

    #[test]
    fn times_are_rescaled_to_the_division() {
        let coarse = TimeUnits::DEFAULT.with_subbeat_divisor(96);
        let track = TrackChunk::from_events([ChannelEvent::note_on(
            0,
            60,
            100,
            BarBeatTime::new(0, 1, 48, coarse),
        )]);
        let bytes = track.to_bytes(480);
        // one and a half beats at 480 = 720 = 0x85 0x50
        assert_eq!(&bytes[8..10], &[0x85, 0x50]);
    }

    #[test]
    fn declared_length_past_end() {
        let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 9, 0x00, 0xFF, 0x2F, 0x00];
        let err = TrackChunk::parse(&mut Reader::from_byte_slice(&bytes), units()).unwrap_err();
        assert_eq!(
            err.parse_error_kind(),
            Some(&ParseError::Chunk(ChunkError::Length {
                declared: 9,
                remaining: 4
            }))
        );
    }

    #[test]
    fn event_overrunning_chunk() {
        // note on declared inside a three byte chunk, velocity lies outside it
        let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 3, 0x00, 0x90, 60, 100];
        let err = TrackChunk::parse(&mut Reader::from_byte_slice(&bytes), units()).unwrap_err();
        assert_eq!(err.position(), 11);
        assert_eq!(
            err.parse_error_kind(),
            Some(&ParseError::Chunk(ChunkError::Overrun))
        );
        assert_eq!(err.category(), ErrorCategory::StructurallyUnsound);
    }
}
