#![doc = r#"
Time-keyed dispatch driven by an external pulse

A [`Clock`] owns the current [`BarBeatTime`] of a transport and two callback
indexes:

- exact callbacks, keyed by the time they fire at and an identifier
- predicated callbacks, keyed by identifier, firing whenever their predicate
  holds for the new time

Nothing in the clock runs on its own. Whoever receives MIDI real-time messages
hands them to [`Clock::handle`] (or [`Clock::receive`] for raw bytes), and every
callback runs synchronously inside that call.

```text
            Start (0xFA)                 Tick (0xF8)
Stopped ----------------> Running <----------------+
   ^    reset to zero,      |   |   advance one     |
   |    dispatch            |   +-------------------+
   |                        |       subbeat, dispatch
   +------------------------+
        Stop (0xFC), reset to zero silently
```

Callbacks receive the new time and a [`PendingEdits`] queue. Registration
changes made through the queue are applied after dispatch for that time
finishes.

# Example
```rust
# use midiseq::prelude::*;
# use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
let units = TimeUnits::DEFAULT.with_subbeat_divisor(4);
let mut clock = Clock::new(units);

let hits = Arc::new(AtomicUsize::new(0));
let counter = hits.clone();
clock.register(BarBeatTime::new(0, 1, 0, units), uuid::Uuid::new_v4(), move |_, _| {
    counter.fetch_add(1, Ordering::SeqCst);
});

clock.handle(ClockMessage::Start);
for _ in 0..8 {
    clock.handle(ClockMessage::Tick);
}
assert_eq!(hits.load(Ordering::SeqCst), 1);
assert_eq!(clock.time(), BarBeatTime::new(0, 2, 0, units));
```
"#]

mod edits;
use edits::Edit;
pub use edits::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use uuid::Uuid;

use crate::prelude::*;

/// A callback invoked with the time the clock moved to.
pub type Callback = Box<dyn FnMut(&BarBeatTime, &mut PendingEdits) + Send>;

/// Decides whether a predicated callback fires for a time.
pub type Predicate = Box<dyn Fn(&BarBeatTime) -> bool + Send>;

/// A clock shared between the thread delivering pulses and its observers.
///
/// Callbacks run while the lock is held, so they must not lock it again.
pub type SharedClock = Arc<Mutex<Clock>>;

/// MIDI real-time messages the clock responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ClockMessage {
    /// Advance one subbeat
    Tick = 0xF8,
    /// Return to zero and run
    Start = 0xFA,
    /// Run from the current time
    Continue = 0xFB,
    /// Stop and return to zero
    Stop = 0xFC,
}

/// Whether ticks move the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Ticks are ignored
    #[default]
    Stopped,
    /// Ticks advance the time
    Running,
}

/// The live clock of one transport.
pub struct Clock {
    time: BarBeatTime,
    state: TransportState,
    callbacks: HashMap<BarBeatTime, HashMap<Uuid, Callback>>,
    predicated: HashMap<Uuid, (Predicate, Callback)>,
    suppress_callbacks: bool,
}

impl Clock {
    /// A stopped clock at zero.
    pub fn new(units: TimeUnits) -> Self {
        Self {
            time: BarBeatTime::zero(units),
            state: TransportState::Stopped,
            callbacks: HashMap::new(),
            predicated: HashMap::new(),
            suppress_callbacks: false,
        }
    }

    /// Wraps the clock for sharing with a pulse source on another thread.
    pub fn into_shared(self) -> SharedClock {
        Arc::new(Mutex::new(self))
    }

    /// The current time.
    pub const fn time(&self) -> BarBeatTime {
        self.time
    }

    /// Current bar
    pub const fn bar(&self) -> u64 {
        self.time.bar()
    }

    /// Current beat within the bar
    pub const fn beat(&self) -> u32 {
        self.time.beat()
    }

    /// Current subbeat within the beat
    pub const fn subbeat(&self) -> u32 {
        self.time.subbeat()
    }

    /// Current time in ticks
    pub const fn ticks(&self) -> i64 {
        self.time.to_ticks()
    }

    /// Current time in seconds
    pub fn seconds(&self) -> f64 {
        self.time.to_seconds()
    }

    /// The transport state.
    pub const fn state(&self) -> TransportState {
        self.state
    }

    /// True while ticks advance the time.
    pub const fn is_running(&self) -> bool {
        matches!(self.state, TransportState::Running)
    }

    /// Whether dispatch is currently disabled.
    pub const fn callbacks_suppressed(&self) -> bool {
        self.suppress_callbacks
    }

    /// Disables or enables dispatch. Registrations are kept either way.
    pub fn set_suppress_callbacks(&mut self, suppress: bool) {
        self.suppress_callbacks = suppress;
    }

    /// Changes the units of the live time, keeping its tick count.
    pub fn set_units(&mut self, units: TimeUnits) {
        self.time = self.time.with_units(units);
    }

    /// Applies one real-time message.
    pub fn handle(&mut self, message: ClockMessage) {
        match message {
            ClockMessage::Tick => {
                if !self.is_running() {
                    log::trace!("Ignoring tick while stopped");
                    return;
                }
                let next = self.time + self.time.subbeat_unit();
                self.set_time(next);
            }
            ClockMessage::Start => {
                log::debug!("Clock started");
                self.state = TransportState::Running;
                self.reset();
            }
            ClockMessage::Continue => {
                log::debug!("Clock continued at {}", self.time);
                self.state = TransportState::Running;
            }
            ClockMessage::Stop => {
                log::debug!("Clock stopped at {}", self.time);
                self.state = TransportState::Stopped;
                self.time = BarBeatTime::zero(self.time.units());
            }
        }
    }

    /// Applies a raw MIDI packet by its first byte. Anything other than a
    /// clock message is ignored.
    pub fn receive(&mut self, packet: &[u8]) {
        let Some(&status) = packet.first() else {
            return;
        };
        match ClockMessage::try_from(status) {
            Ok(message) => self.handle(message),
            Err(_) => log::trace!("Ignoring status {status:#04X}"),
        }
    }

    /// Moves the clock to `time`, dispatching if the clock is running.
    pub fn set_time(&mut self, time: BarBeatTime) {
        log::trace!("Clock at {time}");
        self.time = time;
        if self.is_running() {
            self.invoke_callbacks();
        }
    }

    /// Returns to zero, dispatching if the clock is running.
    pub fn reset(&mut self) {
        self.set_time(BarBeatTime::zero(self.time.units()));
    }

    /// Drops every registration, then resets.
    pub fn hard_reset(&mut self) {
        self.clear_callbacks();
        self.reset();
    }

    /// Drops every registration.
    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
        self.predicated.clear();
    }

    /// Registers `callback` to run whenever the clock reaches `time`.
    ///
    /// An existing callback with the same time and identifier is replaced.
    pub fn register<F>(&mut self, time: BarBeatTime, identifier: Uuid, callback: F)
    where
        F: FnMut(&BarBeatTime, &mut PendingEdits) + Send + 'static,
    {
        self.insert(time, identifier, Box::new(callback));
    }

    /// Registers `callback` to run for every time `predicate` accepts.
    pub fn register_predicated<P, F>(&mut self, identifier: Uuid, predicate: P, callback: F)
    where
        P: Fn(&BarBeatTime) -> bool + Send + 'static,
        F: FnMut(&BarBeatTime, &mut PendingEdits) + Send + 'static,
    {
        self.predicated
            .insert(identifier, (Box::new(predicate), Box::new(callback)));
    }

    /// Removes the callback registered for `time` under `identifier`, or every
    /// callback for `time` when `identifier` is `None`.
    pub fn remove(&mut self, time: &BarBeatTime, identifier: Option<Uuid>) {
        match identifier {
            Some(identifier) => {
                if let Some(bag) = self.callbacks.get_mut(time) {
                    bag.remove(&identifier);
                    if bag.is_empty() {
                        self.callbacks.remove(time);
                    }
                }
            }
            None => {
                self.callbacks.remove(time);
            }
        }
    }

    /// Removes a predicated callback.
    pub fn remove_predicated(&mut self, identifier: Uuid) {
        self.predicated.remove(&identifier);
    }

    /// True if `identifier` has an exact or predicated registration.
    pub fn callback_registered(&self, identifier: Uuid) -> bool {
        self.predicated.contains_key(&identifier)
            || self.callbacks.values().any(|bag| bag.contains_key(&identifier))
    }

    fn insert(&mut self, time: BarBeatTime, identifier: Uuid, callback: Callback) {
        self.callbacks
            .entry(time)
            .or_default()
            .insert(identifier, callback);
    }

    fn invoke_callbacks(&mut self) {
        if self.suppress_callbacks {
            return;
        }
        if self.callbacks.is_empty() && self.predicated.is_empty() {
            return;
        }

        let time = self.time;
        let mut edits = PendingEdits::default();

        if let Some(bag) = self.callbacks.get_mut(&time) {
            log::trace!("Dispatching {} callbacks at {time}", bag.len());
            for callback in bag.values_mut() {
                callback(&time, &mut edits);
            }
        }
        for (predicate, callback) in self.predicated.values_mut() {
            if predicate(&time) {
                callback(&time, &mut edits);
            }
        }

        if !edits.is_empty() {
            log::trace!("Applying {} deferred edits", edits.len());
        }
        for edit in edits.drain() {
            match edit {
                Edit::Register {
                    time,
                    identifier,
                    callback,
                } => self.insert(time, identifier, callback),
                Edit::RegisterPredicated {
                    identifier,
                    predicate,
                    callback,
                } => {
                    self.predicated.insert(identifier, (predicate, callback));
                }
                Edit::Remove { time, identifier } => self.remove(&time, identifier),
                Edit::RemovePredicated(identifier) => self.remove_predicated(identifier),
                Edit::Clear => self.clear_callbacks(),
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(TimeUnits::DEFAULT)
    }
}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Clock")
            .field("time", &self.time)
            .field("state", &self.state)
            .field("callbacks", &self.callbacks.values().map(HashMap::len).sum::<usize>())
            .field("predicated", &self.predicated.len())
            .field("suppress_callbacks", &self.suppress_callbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn units() -> TimeUnits {
        TimeUnits::DEFAULT.with_subbeat_divisor(4)
    }

    fn recorder() -> (
        Arc<Mutex<Vec<i64>>>,
        impl FnMut(&BarBeatTime, &mut PendingEdits) + Send + 'static,
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        (log, move |time: &BarBeatTime, _: &mut PendingEdits| {
            sink.lock().unwrap().push(time.to_ticks())
        })
    }

    #[test]
    fn ticks_ignored_until_started() {
        let mut clock = Clock::new(units());
        clock.handle(ClockMessage::Tick);
        assert_eq!(clock.ticks(), 0);

        clock.handle(ClockMessage::Start);
        clock.handle(ClockMessage::Tick);
        clock.handle(ClockMessage::Tick);
        assert_eq!(clock.ticks(), 2);

        clock.handle(ClockMessage::Stop);
        assert!(!clock.is_running());
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn continue_keeps_position() {
        let mut clock = Clock::new(units());
        clock.handle(ClockMessage::Continue);
        clock.set_time(BarBeatTime::new(1, 0, 0, units()));
        clock.receive(&[0xF8, 0x00]);
        assert_eq!(clock.ticks(), 17);
        clock.receive(&[0x90, 60, 100]);
        clock.receive(&[]);
        assert_eq!(clock.ticks(), 17);
    }

    #[test]
    fn exact_callbacks_fire_in_clock_order() {
        let mut clock = Clock::new(units());
        let (log, _) = recorder();
        for ticks in [9, 2, 5] {
            let sink = log.clone();
            clock.register(
                BarBeatTime::from_ticks(ticks, units()),
                Uuid::new_v4(),
                move |time, _| sink.lock().unwrap().push(time.to_ticks()),
            );
        }

        clock.handle(ClockMessage::Start);
        for _ in 0..12 {
            clock.handle(ClockMessage::Tick);
        }
        assert_eq!(*log.lock().unwrap(), vec![2, 5, 9]);
    }

    #[test]
    fn predicated_callback_fires_on_every_update() {
        let mut clock = Clock::new(units());
        let (log, callback) = recorder();
        clock.register_predicated(Uuid::new_v4(), |_| true, callback);

        clock.handle(ClockMessage::Start);
        clock.handle(ClockMessage::Tick);
        clock.handle(ClockMessage::Tick);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn predicate_filters_times() {
        let mut clock = Clock::new(units());
        let (log, callback) = recorder();
        // every downbeat
        clock.register_predicated(Uuid::new_v4(), |t| t.subbeat() == 0, callback);

        clock.handle(ClockMessage::Start);
        for _ in 0..9 {
            clock.handle(ClockMessage::Tick);
        }
        assert_eq!(*log.lock().unwrap(), vec![0, 4, 8]);
    }

    #[test]
    fn suppressed_callbacks_are_kept() {
        let mut clock = Clock::new(units());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        clock.register(BarBeatTime::zero(units()), Uuid::new_v4(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        clock.set_suppress_callbacks(true);
        clock.handle(ClockMessage::Start);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        clock.set_suppress_callbacks(false);
        clock.handle(ClockMessage::Start);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_and_lookup() {
        let mut clock = Clock::new(units());
        let exact = Uuid::new_v4();
        let other = Uuid::new_v4();
        let predicated = Uuid::new_v4();
        let time = BarBeatTime::from_ticks(3, units());
        clock.register(time, exact, |_, _| {});
        clock.register(time, other, |_, _| {});
        clock.register_predicated(predicated, |_| false, |_, _| {});

        assert!(clock.callback_registered(exact));
        assert!(clock.callback_registered(predicated));

        clock.remove(&time, Some(exact));
        assert!(!clock.callback_registered(exact));
        assert!(clock.callback_registered(other));

        clock.remove(&time, None);
        assert!(!clock.callback_registered(other));

        clock.remove_predicated(predicated);
        assert!(!clock.callback_registered(predicated));
    }

    #[test]
    fn hard_reset_clears_registrations() {
        let mut clock = Clock::new(units());
        let id = Uuid::new_v4();
        clock.register_predicated(id, |_| true, |_, _| {});
        clock.handle(ClockMessage::Start);
        clock.handle(ClockMessage::Tick);

        clock.hard_reset();
        assert!(!clock.callback_registered(id));
        assert_eq!(clock.ticks(), 0);
        assert!(clock.is_running());
    }

    #[test]
    fn edits_from_callbacks_apply_after_dispatch() {
        let mut clock = Clock::new(units());
        let (log, _) = recorder();
        let self_id = Uuid::new_v4();
        let sink = log.clone();

        // at tick 1: remove ourselves and schedule a follow-up at tick 3
        clock.register(
            BarBeatTime::from_ticks(1, units()),
            self_id,
            move |time, edits| {
                sink.lock().unwrap().push(time.to_ticks());
                edits.remove(*time, Some(self_id));
                let follow_up = sink.clone();
                edits.register(
                    *time + BarBeatTime::from_ticks(2, time.units()),
                    Uuid::new_v4(),
                    move |time, _| follow_up.lock().unwrap().push(time.to_ticks() * 10),
                );
            },
        );

        clock.handle(ClockMessage::Start);
        for _ in 0..4 {
            clock.handle(ClockMessage::Tick);
        }
        assert!(!clock.callback_registered(self_id));

        // a second pass only runs the follow-up
        clock.handle(ClockMessage::Start);
        for _ in 0..4 {
            clock.handle(ClockMessage::Tick);
        }
        assert_eq!(*log.lock().unwrap(), vec![1, 30, 30]);
    }

    #[test]
    fn set_units_renormalizes() {
        let mut clock = Clock::new(units());
        clock.handle(ClockMessage::Continue);
        clock.set_time(BarBeatTime::new(1, 1, 0, units()));
        clock.set_units(units().with_beats_per_bar(3));
        assert_eq!((clock.bar(), clock.beat(), clock.subbeat()), (1, 2, 0));
        assert_eq!(clock.ticks(), 20);
    }

    #[test]
    fn shared_clock_across_threads() {
        let clock = Clock::new(units()).into_shared();
        let pulses = clock.clone();
        std::thread::spawn(move || {
            let mut clock = pulses.lock().unwrap();
            clock.receive(&[0xFA]);
            for _ in 0..6 {
                clock.receive(&[0xF8]);
            }
        })
        .join()
        .unwrap();
        assert_eq!(clock.lock().unwrap().ticks(), 6);
    }
}
