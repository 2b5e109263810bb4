#![doc = r#"
Repeating a stored run of events

A [`LoopSpec`] holds events timed relative to the loop's start. Playing it
produces a lazy sequence:

1. a begin [`LoopMarker`] at `start`
2. every stored event at `start + offset + time`
3. while passes remain, `offset` grows by `repeat_delay + duration` and the
   stored events are replayed
4. an end [`LoopMarker`] at `start + offset + duration`

With `repetitions` of zero or less the sequence never ends; bound it where it is
consumed. A loop without events yields its two markers and stops.

# Example
```rust
# use midiseq::prelude::*;
let units = TimeUnits::default();
let mut events = EventContainer::new();
events.push(ChannelEvent::note_on(0, 60, 100, BarBeatTime::zero(units)));

let looped = LoopSpec::new(
    uuid::Uuid::new_v4(),
    BarBeatTime::new(1, 0, 0, units),
    BarBeatTime::new(2, 0, 0, units),
    events,
)
.with_repetitions(3);

let ticks: Vec<i64> = looped.events().map(|e| e.time().to_ticks()).collect();
assert_eq!(ticks, vec![1_920, 1_920, 3_840, 5_760, 7_680]);
```
"#]

mod marker;
pub use marker::*;

use thiserror::Error;
use uuid::Uuid;

use crate::prelude::*;

/// A failure to recover loops from a track.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    /// Marker text that could not be read
    #[error(transparent)]
    Marker(#[from] LoopMarkerError),
    /// A begin marker inside an open loop
    #[error("Loop {inner} begins inside loop {outer}")]
    Nested {
        /// The loop already open
        outer: Uuid,
        /// The loop that tried to open
        inner: Uuid,
    },
    /// An end marker for a loop other than the open one
    #[error("End of loop {found} while loop {expected} is open")]
    Mismatched {
        /// The open loop
        expected: Uuid,
        /// The loop named by the end marker
        found: Uuid,
    },
    /// An end marker with no open loop
    #[error("End of loop {0} without a beginning")]
    UnmatchedEnd(Uuid),
    /// A loop still open when the track ends
    #[error("Loop {0} is never closed")]
    Unterminated(Uuid),
}

/// A loop: events relative to `start`, replayed `repetitions` times.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSpec {
    identifier: Uuid,
    repetitions: i32,
    repeat_delay: u64,
    start: BarBeatTime,
    end: BarBeatTime,
    events: EventContainer,
}

impl LoopSpec {
    /// An endless loop with no delay between passes.
    pub fn new(
        identifier: Uuid,
        start: BarBeatTime,
        end: BarBeatTime,
        events: EventContainer,
    ) -> Self {
        Self {
            identifier,
            repetitions: 0,
            repeat_delay: 0,
            start,
            end,
            events,
        }
    }

    /// Sets the number of passes. Zero or less loops forever.
    pub fn with_repetitions(mut self, repetitions: i32) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Sets the ticks of silence between passes.
    pub fn with_repeat_delay(mut self, repeat_delay: u64) -> Self {
        self.repeat_delay = repeat_delay;
        self
    }

    /// The loop identifier
    pub const fn identifier(&self) -> Uuid {
        self.identifier
    }

    /// Number of passes, zero or less for endless
    pub const fn repetitions(&self) -> i32 {
        self.repetitions
    }

    /// Ticks between passes
    pub const fn repeat_delay(&self) -> u64 {
        self.repeat_delay
    }

    /// Where the first pass begins
    pub const fn start(&self) -> BarBeatTime {
        self.start
    }

    /// Where the first pass ends
    pub const fn end(&self) -> BarBeatTime {
        self.end
    }

    /// The stored events, timed relative to `start`
    pub fn stored_events(&self) -> &EventContainer {
        &self.events
    }

    /// `end - start`, or zero if the end lies before the start.
    pub fn duration(&self) -> BarBeatTime {
        let duration = self.end - self.start;
        if duration.is_negative() {
            BarBeatTime::zero(self.start.units())
        } else {
            duration
        }
    }

    /// The begin marker for this loop.
    pub const fn begin_marker(&self) -> LoopMarker {
        LoopMarker::Begin {
            identifier: self.identifier,
            repetitions: self.repetitions,
            repeat_delay: self.repeat_delay,
        }
    }

    /// The end marker for this loop.
    pub const fn end_marker(&self) -> LoopMarker {
        LoopMarker::End {
            identifier: self.identifier,
        }
    }

    /// Every pass of the loop between its markers. Each call starts over.
    pub fn events(&self) -> LoopEvents<'_> {
        let passes = u64::try_from(self.repetitions).ok().filter(|&n| n > 0);
        LoopEvents::new(self, passes)
    }

    /// One pass between markers, the form a loop takes inside a track chunk.
    pub fn marked_events(&self) -> LoopEvents<'_> {
        LoopEvents::new(self, Some(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Begin,
    Body,
    End,
    Done,
}

/// The lazy event sequence of a [`LoopSpec`].
#[derive(Debug, Clone)]
pub struct LoopEvents<'a> {
    looped: &'a LoopSpec,
    passes: Option<u64>,
    stage: Stage,
    index: usize,
    completed: u64,
    offset: BarBeatTime,
}

impl<'a> LoopEvents<'a> {
    fn new(looped: &'a LoopSpec, passes: Option<u64>) -> Self {
        Self {
            looped,
            passes,
            stage: Stage::Begin,
            index: 0,
            completed: 0,
            offset: BarBeatTime::zero(looped.start.units()),
        }
    }

    /// The number of passes emitted in full so far.
    pub const fn completed_passes(&self) -> u64 {
        self.completed
    }
}

impl Iterator for LoopEvents<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        let looped = self.looped;
        loop {
            match self.stage {
                Stage::Begin => {
                    self.stage = Stage::Body;
                    return Some(looped.begin_marker().to_event(looped.start));
                }
                Stage::Body => {
                    if let Some(event) = looped.events.as_slice().get(self.index) {
                        self.index += 1;
                        let time = looped.start + self.offset + *event.time();
                        return Some(event.clone().with_time(time));
                    }

                    self.completed += 1;
                    let more = self.passes.is_none_or(|passes| self.completed < passes);
                    if more && !looped.events.is_empty() {
                        let delay = looped.repeat_delay as i64;
                        self.offset += BarBeatTime::from_ticks(delay, looped.start.units())
                            + looped.duration();
                        self.index = 0;
                        log::trace!(
                            "Loop {} pass {} starts at offset {}",
                            looped.identifier,
                            self.completed + 1,
                            self.offset
                        );
                    } else {
                        self.stage = Stage::End;
                    }
                }
                Stage::End => {
                    self.stage = Stage::Done;
                    let time = looped.start + self.offset + looped.duration();
                    return Some(looped.end_marker().to_event(time));
                }
                Stage::Done => return None,
            }
        }
    }
}

/// Splits loop markers out of a track.
///
/// Events between a begin marker and its end marker become a [`LoopSpec`]
/// with times relative to the begin marker; the end marker's time is the
/// loop's end. Everything outside a loop is returned unchanged.
pub fn split_loops(events: &EventContainer) -> Result<(EventContainer, Vec<LoopSpec>), LoopError> {
    struct Open {
        identifier: Uuid,
        repetitions: i32,
        repeat_delay: u64,
        start: BarBeatTime,
        events: EventContainer,
    }

    let mut track = EventContainer::new();
    let mut loops = Vec::new();
    let mut open: Option<Open> = None;

    for event in events {
        match (LoopMarker::from_event(event)?, open.take()) {
            (
                Some(LoopMarker::Begin {
                    identifier,
                    repetitions,
                    repeat_delay,
                }),
                None,
            ) => {
                open = Some(Open {
                    identifier,
                    repetitions,
                    repeat_delay,
                    start: *event.time(),
                    events: EventContainer::new(),
                });
            }
            (Some(LoopMarker::Begin { identifier, .. }), Some(outer)) => {
                return Err(LoopError::Nested {
                    outer: outer.identifier,
                    inner: identifier,
                });
            }
            (Some(LoopMarker::End { identifier }), Some(current)) => {
                if identifier != current.identifier {
                    return Err(LoopError::Mismatched {
                        expected: current.identifier,
                        found: identifier,
                    });
                }
                loops.push(
                    LoopSpec::new(identifier, current.start, *event.time(), current.events)
                        .with_repetitions(current.repetitions)
                        .with_repeat_delay(current.repeat_delay),
                );
            }
            (Some(LoopMarker::End { identifier }), None) => {
                return Err(LoopError::UnmatchedEnd(identifier));
            }
            (None, Some(mut current)) => {
                let relative = *event.time() - current.start;
                current.events.push(event.clone().with_time(relative));
                open = Some(current);
            }
            (None, None) => track.push(event.clone()),
        }
    }

    if let Some(current) = open {
        return Err(LoopError::Unterminated(current.identifier));
    }
    Ok((track, loops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn units() -> TimeUnits {
        TimeUnits::default()
    }

    fn at(ticks: i64) -> BarBeatTime {
        BarBeatTime::from_ticks(ticks, units())
    }

    fn two_notes() -> EventContainer {
        [
            ChannelEvent::note_on(0, 60, 100, at(0)),
            ChannelEvent::note_off(0, 60, at(240)),
        ]
        .into_iter()
        .collect()
    }

    fn melody() -> LoopSpec {
        LoopSpec::new(Uuid::from_bytes([3; 16]), at(960), at(1_920), two_notes())
    }

    #[test]
    fn bounded_loop_yields_markers_and_passes() {
        let looped = melody().with_repetitions(2).with_repeat_delay(480);
        let emitted: Vec<Event> = looped.events().collect();
        assert_eq!(emitted.len(), 1 + 2 * 2 + 1);

        let ticks: Vec<i64> = emitted.iter().map(|e| e.time().to_ticks()).collect();
        // second pass starts after the 960 tick body and the 480 tick delay
        assert_eq!(ticks, vec![960, 960, 1_200, 2_400, 2_640, 3_360]);

        assert_eq!(
            LoopMarker::from_event(&emitted[0]),
            Ok(Some(looped.begin_marker()))
        );
        assert_eq!(
            LoopMarker::from_event(&emitted[5]),
            Ok(Some(looped.end_marker()))
        );
    }

    #[test]
    fn unbounded_loop_keeps_going() {
        let looped = melody().with_repetitions(0);
        let mut events = looped.events();
        let taken: Vec<Event> = events.by_ref().take(1 + 2 * 50).collect();
        assert_eq!(taken.len(), 101);
        assert_eq!(events.completed_passes(), 49);
        assert!(events.next().is_some());

        let negative = melody().with_repetitions(-1);
        assert_eq!(negative.events().take(500).count(), 500);
    }

    #[test]
    fn restartable() {
        let looped = melody().with_repetitions(3);
        assert_eq!(looped.events().count(), looped.events().count());
        assert_eq!(looped.events().count(), 1 + 3 * 2 + 1);
    }

    #[test]
    fn empty_loop_only_has_markers() {
        let looped = LoopSpec::new(Uuid::nil(), at(0), at(480), EventContainer::new());
        let emitted: Vec<Event> = looped.events().collect();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1].time().to_ticks(), 480);
    }

    #[test]
    fn inverted_bounds_have_no_duration() {
        let looped = LoopSpec::new(Uuid::nil(), at(960), at(480), EventContainer::new());
        assert!(looped.duration().is_zero());
    }

    #[test]
    fn split_recovers_marked_loop() {
        let looped = melody().with_repetitions(4).with_repeat_delay(120);
        let mut track = EventContainer::new();
        track.push(MetaEvent::new(MetaData::TrackName("lead".into()), at(0)));
        track.extend(looped.marked_events());
        track.push(MetaEvent::end_of_track(at(3_000)));

        let (rest, loops) = split_loops(&track).unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(loops, vec![looped]);
    }

    #[test]
    fn split_rejects_unbalanced_markers() {
        let a = melody();
        let b = LoopSpec::new(Uuid::from_bytes([4; 16]), at(0), at(10), EventContainer::new());

        let only_begin: EventContainer = [a.begin_marker().to_event(at(0))].into_iter().collect();
        assert_eq!(
            split_loops(&only_begin),
            Err(LoopError::Unterminated(a.identifier()))
        );

        let only_end: EventContainer = [a.end_marker().to_event(at(0))].into_iter().collect();
        assert_eq!(
            split_loops(&only_end),
            Err(LoopError::UnmatchedEnd(a.identifier()))
        );

        let crossed: EventContainer = [
            a.begin_marker().to_event(at(0)),
            b.end_marker().to_event(at(10)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            split_loops(&crossed),
            Err(LoopError::Mismatched {
                expected: a.identifier(),
                found: b.identifier()
            })
        );

        let nested: EventContainer = [
            a.begin_marker().to_event(at(0)),
            b.begin_marker().to_event(at(10)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            split_loops(&nested),
            Err(LoopError::Nested {
                outer: a.identifier(),
                inner: b.identifier()
            })
        );
    }
}
