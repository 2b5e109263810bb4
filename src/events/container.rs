use std::borrow::Cow;

use crate::prelude::*;

#[doc = r#"
An ordered collection of [`Event`]s

Order is the order events were pushed or decoded in, which is not necessarily
time order. The filtered views borrow from the container and are evaluated
lazily.

# Example
```rust
# use midiseq::prelude::*;
let units = TimeUnits::default();
let events: EventContainer = [
    Event::from(MetaEvent::new(MetaData::Tempo(Tempo::from_bpm(90.)), BarBeatTime::zero(units))),
    Event::from(ChannelEvent::note_on(0, 60, 100, BarBeatTime::new(0, 1, 0, units))),
    Event::from(MetaEvent::end_of_track(BarBeatTime::new(1, 0, 0, units))),
]
.into_iter()
.collect();

assert_eq!(events.meta_events().count(), 2);
assert_eq!(events.channel_events().count(), 1);
assert_eq!(events.tempo_events().next().map(Tempo::bpm), Some(90.));
assert_eq!(events.max_time(), Some(BarBeatTime::new(1, 0, 0, units)));
```
"#]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContainer {
    events: Vec<Event>,
}

impl EventContainer {
    /// An empty container.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn push(&mut self, event: impl Into<Event>) {
        self.events.push(event.into());
    }

    /// The number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates every event in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// The events as a slice.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Meta events only. Node events are not included.
    pub fn meta_events(&self) -> impl Iterator<Item = &MetaEvent> {
        self.iter().filter_map(Event::as_meta)
    }

    /// Channel events only.
    pub fn channel_events(&self) -> impl Iterator<Item = &ChannelEvent> {
        self.iter().filter_map(Event::as_channel)
    }

    /// Node events only.
    pub fn node_events(&self) -> impl Iterator<Item = &NodeEvent> {
        self.iter().filter_map(Event::as_node)
    }

    /// Tempo and time signature events, the ones that shape the timeline.
    pub fn time_events(&self) -> impl Iterator<Item = &MetaEvent> {
        self.meta_events().filter(|e| {
            matches!(
                e.data(),
                MetaData::Tempo(_) | MetaData::TimeSignature { .. }
            )
        })
    }

    /// Tempos in insertion order.
    pub fn tempo_events(&self) -> impl Iterator<Item = &Tempo> {
        self.meta_events().filter_map(|e| match e.data() {
            MetaData::Tempo(tempo) => Some(tempo),
            _ => None,
        })
    }

    /// Marker events and their text, decoded lossily.
    pub fn markers(&self) -> impl Iterator<Item = (&MetaEvent, Cow<'_, str>)> {
        self.meta_events().filter_map(|e| match e.data() {
            MetaData::Marker(text) => Some((e, text.to_string_lossy())),
            _ => None,
        })
    }

    /// The earliest event time.
    pub fn min_time(&self) -> Option<BarBeatTime> {
        self.iter().map(|e| *e.time()).min()
    }

    /// The latest event time.
    pub fn max_time(&self) -> Option<BarBeatTime> {
        self.iter().map(|e| *e.time()).max()
    }

    /// A copy sorted by time. Events at the same time keep their relative order.
    pub fn sorted_by_time(&self) -> Self {
        let mut events = self.events.clone();
        events.sort_by_key(|e| *e.time());
        Self { events }
    }

    /// Removes every event matching `predicate`.
    pub fn retain(&mut self, predicate: impl FnMut(&Event) -> bool) {
        self.events.retain(predicate);
    }
}

impl From<Vec<Event>> for EventContainer {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<E: Into<Event>> FromIterator<E> for EventContainer {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<E: Into<Event>> Extend<E> for EventContainer {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.events.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for EventContainer {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;
    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventContainer {
    type Item = &'a Event;
    type IntoIter = core::slice::Iter<'a, Event>;
    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[test]
fn views_and_sorting() {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    let units = TimeUnits::default();
    let at = |ticks| BarBeatTime::from_ticks(ticks, units);
    let mut events = EventContainer::new();
    events.push(ChannelEvent::note_off(0, 60, at(960)));
    events.push(MetaEvent::new(MetaData::Marker("verse".into()), at(0)));
    events.push(NodeEvent::remove(NodeIdentifier::new(Uuid::nil()), at(480)));
    events.push(MetaEvent::new(
        MetaData::time_signature(TimeSignature::THREE_FOUR),
        at(0),
    ));
    events.push(ChannelEvent::note_on(0, 60, 90, at(0)));

    assert_eq!(events.len(), 5);
    assert_eq!(events.node_events().count(), 1);
    assert_eq!(events.time_events().count(), 1);
    assert_eq!(
        events.markers().map(|(_, text)| text).collect::<Vec<_>>(),
        vec!["verse"]
    );
    assert_eq!(events.min_time(), Some(at(0)));
    assert_eq!(events.max_time(), Some(at(960)));

    let sorted = events.sorted_by_time();
    let ticks: Vec<i64> = sorted.iter().map(|e| e.time().to_ticks()).collect();
    assert_eq!(ticks, vec![0, 0, 0, 480, 960]);
    // stable: the marker was pushed before the time signature
    assert!(matches!(
        sorted.as_slice()[0].as_meta().map(MetaEvent::data),
        Some(MetaData::Marker(_))
    ));
}
