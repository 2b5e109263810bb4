#![doc = r#"
Timing and interchange for a MIDI sequencer

# Overview

- [`BarBeatTime`](crate::time::BarBeatTime) is a musical position in bars,
  beats and subbeats. It converts exactly to ticks and to seconds at a tempo.
- [`file`] reads and writes Standard MIDI Files and stamps every decoded event
  with its musical time.
- [`Clock`](crate::clock::Clock) follows an external pulse and fires callbacks
  registered for an exact time or for a predicate over time.
- [`LoopSpec`](crate::looping::LoopSpec) replays a stored run of events as a
  lazy sequence between loop markers.

# Example
```rust
use midiseq::prelude::*;

let units = TimeUnits::default();
let mut track = EventContainer::new();
track.push(MetaEvent::new(MetaData::Tempo(Tempo::from_bpm(120.)), BarBeatTime::zero(units)));
track.push(ChannelEvent::note_on(0, 60, 100, BarBeatTime::new(0, 1, 0, units)));

let file = MidiFile::new(480, vec![TrackChunk::new(track)]);
let (header, tracks) = decode(&file.to_bytes()).unwrap();
assert_eq!(header.track_count(), 1);

let note = tracks[0].events().channel_events().next().unwrap();
assert_eq!(note.time().to_string(), "0:1/4.0/480@120");
```
"#]
#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod events;
pub mod file;
pub mod looping;
pub mod reader;
pub mod time;
pub mod vlq;

#[doc = r#"
Commonly used types
"#]
pub mod prelude {
    pub use crate::{
        clock::*,
        error::{ChunkError, ErrorCategory, HeaderError, MetaError, NodeError, ParseError, VlqError},
        events::*,
        file::*,
        looping::*,
        reader::{ReadResult, ReaderError, ReaderErrorKind},
        time::*,
    };
}
