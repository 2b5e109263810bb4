#![doc = r#"
Musical time expressed as bars, beats and subbeats

# Overview

A [`BarBeatTime`] is a mixed-radix number. The subbeat place counts up to
[`TimeUnits::subbeat_divisor`], the beat place counts up to
[`TimeUnits::beats_per_bar`], and the bar place is unbounded. Every value can
therefore be flattened into a single tick count:

```text
ticks = (bar * beats_per_bar + beat) * subbeat_divisor + subbeat
```

Equality, ordering and hashing are all defined on that signed tick count, each
value using its *own* units. Two values with identical components but different
radices are generally different times.

The sign lives only in [`BarBeatTime::is_negative`]; the components themselves
are always non-negative and zero is never negative.

# Example
```rust
# use midiseq::prelude::*;
let units = TimeUnits::default();

let time = BarBeatTime::from_ticks(1_930, units);
assert_eq!((time.bar(), time.beat(), time.subbeat()), (1, 0, 10));

let later = time + BarBeatTime::new(0, 3, 470, units);
assert_eq!((later.bar(), later.beat(), later.subbeat()), (2, 0, 0));
assert_eq!(later.to_ticks(), 3_840);
```
"#]

mod arith;

mod signature;
pub use signature::*;

mod text;
pub use text::*;

mod units;
pub use units::*;

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// A position (or distance) in musical time.
///
/// See the [module documentation](self) for the arithmetic model.
#[derive(Debug, Clone, Copy)]
pub struct BarBeatTime {
    bar: u64,
    beat: u32,
    subbeat: u32,
    negative: bool,
    units: TimeUnits,
}

impl BarBeatTime {
    /// Create a time from its components, carrying any overflow from the
    /// subbeat place into the beat place and from the beat place into the bar.
    ///
    /// # Panics
    /// if `units` has a zero radix or a non-positive tempo.
    pub fn new(bar: u64, beat: u64, subbeat: u64, units: TimeUnits) -> Self {
        Self::from_components(bar, beat, subbeat, false, units)
    }

    /// Same as [`BarBeatTime::new`], for a negative time.
    pub fn negative(bar: u64, beat: u64, subbeat: u64, units: TimeUnits) -> Self {
        Self::from_components(bar, beat, subbeat, true, units)
    }

    /// The zero time for the given units.
    pub fn zero(units: TimeUnits) -> Self {
        Self::from_components(0, 0, 0, false, units)
    }

    /// Create a time from a signed tick count.
    pub fn from_ticks(ticks: i64, units: TimeUnits) -> Self {
        Self::from_components(0, 0, ticks.unsigned_abs(), ticks < 0, units)
    }

    /// Create a time from a (possibly fractional, possibly negative) number of beats.
    ///
    /// Fractions of a subbeat are rounded to the nearest subbeat.
    pub fn from_total_beats(total_beats: f64, units: TimeUnits) -> Self {
        units.validate();
        let ticks = (total_beats * units.subbeat_divisor as f64).round() as i64;
        Self::from_ticks(ticks, units)
    }

    /// Create a time from a number of seconds at `units.beats_per_minute`.
    pub fn from_seconds(seconds: f64, units: TimeUnits) -> Self {
        units.validate();
        Self::from_total_beats(seconds * units.beats_per_minute / 60., units)
    }

    pub(crate) fn from_components(
        bar: u64,
        beat: u64,
        subbeat: u64,
        negative: bool,
        units: TimeUnits,
    ) -> Self {
        units.validate();
        let divisor = units.subbeat_divisor as u64;
        let beats_per_bar = units.beats_per_bar as u64;

        let beat = beat + subbeat / divisor;
        let subbeat = subbeat % divisor;
        let bar = bar + beat / beats_per_bar;
        let beat = beat % beats_per_bar;

        Self {
            bar,
            beat: beat as u32,
            subbeat: subbeat as u32,
            negative: negative && (bar != 0 || beat != 0 || subbeat != 0),
            units,
        }
    }

    /// The number of complete bars.
    pub const fn bar(&self) -> u64 {
        self.bar
    }

    /// The number of complete beats within the bar, `0..beats_per_bar`.
    pub const fn beat(&self) -> u32 {
        self.beat
    }

    /// The number of subbeats within the beat, `0..subbeat_divisor`.
    pub const fn subbeat(&self) -> u32 {
        self.subbeat
    }

    /// Whether the time lies before zero.
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether every component is zero.
    pub const fn is_zero(&self) -> bool {
        self.bar == 0 && self.beat == 0 && self.subbeat == 0
    }

    /// The units this time is measured in.
    pub const fn units(&self) -> TimeUnits {
        self.units
    }

    /// Number of beats per bar.
    pub const fn beats_per_bar(&self) -> u32 {
        self.units.beats_per_bar
    }

    /// Number of subbeats per beat.
    pub const fn subbeat_divisor(&self) -> u32 {
        self.units.subbeat_divisor
    }

    /// Tempo used for conversions to seconds.
    pub const fn beats_per_minute(&self) -> f64 {
        self.units.beats_per_minute
    }

    /// The number of whole beats, ignoring sign.
    pub const fn beats(&self) -> u64 {
        self.bar * self.units.beats_per_bar as u64 + self.beat as u64
    }

    /// The tick count, ignoring sign.
    pub const fn magnitude_ticks(&self) -> u64 {
        self.beats() * self.units.subbeat_divisor as u64 + self.subbeat as u64
    }

    /// The signed tick count.
    pub const fn to_ticks(&self) -> i64 {
        let ticks = self.magnitude_ticks() as i64;
        if self.negative { -ticks } else { ticks }
    }

    /// The signed number of beats including the fraction contributed by the subbeat.
    pub fn total_beats(&self) -> f64 {
        self.to_ticks() as f64 / self.units.subbeat_divisor as f64
    }

    /// The time in seconds at `beats_per_minute`.
    pub fn to_seconds(&self) -> f64 {
        self.total_beats() * 60. / self.units.beats_per_minute
    }

    /// The absolute value of this time.
    pub const fn abs(&self) -> Self {
        Self {
            negative: false,
            ..*self
        }
    }

    /// A single subbeat in the same units.
    pub fn subbeat_unit(&self) -> Self {
        Self::new(0, 0, 1, self.units)
    }

    /// A single beat in the same units.
    pub fn beat_unit(&self) -> Self {
        Self::new(0, 1, 0, self.units)
    }

    /// Returns `self + distance`.
    pub fn advanced_by(&self, distance: &Self) -> Self {
        *self + *distance
    }

    /// Returns the distance from `self` to `other`, i.e. `other - self`.
    pub fn distance_to(&self, other: &Self) -> Self {
        *other - *self
    }

    /// Re-expresses the same tick count in `units`.
    ///
    /// This is a renormalization: the bar, beat and subbeat are derived again
    /// from the unchanged tick count under the new radices.
    pub fn with_units(&self, units: TimeUnits) -> Self {
        Self::from_components(0, 0, self.magnitude_ticks(), self.negative, units)
    }

    /// Changes the beat radix, keeping the tick count.
    pub fn set_beats_per_bar(&mut self, beats_per_bar: u32) {
        if beats_per_bar == self.units.beats_per_bar {
            return;
        }
        *self = self.with_units(self.units.with_beats_per_bar(beats_per_bar));
    }

    /// Changes the subbeat radix, keeping the tick count.
    pub fn set_subbeat_divisor(&mut self, subbeat_divisor: u32) {
        if subbeat_divisor == self.units.subbeat_divisor {
            return;
        }
        *self = self.with_units(self.units.with_subbeat_divisor(subbeat_divisor));
    }

    /// Changes the tempo. Only conversions to and from seconds are affected.
    pub fn set_beats_per_minute(&mut self, beats_per_minute: f64) {
        self.units = self.units.with_beats_per_minute(beats_per_minute);
    }
}

impl Default for BarBeatTime {
    fn default() -> Self {
        Self::zero(TimeUnits::DEFAULT)
    }
}

impl PartialEq for BarBeatTime {
    fn eq(&self, other: &Self) -> bool {
        self.to_ticks() == other.to_ticks()
    }
}

impl Eq for BarBeatTime {}

impl PartialOrd for BarBeatTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BarBeatTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_ticks().cmp(&other.to_ticks())
    }
}

impl Hash for BarBeatTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_ticks().hash(state);
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BarBeatTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BarBeatTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parts(time: &BarBeatTime) -> (u64, u32, u32, bool) {
        (time.bar(), time.beat(), time.subbeat(), time.is_negative())
    }

    #[test]
    fn construction_carries_overflow() {
        let units = TimeUnits::default();
        let time = BarBeatTime::new(1, 7, 965, units);
        // 965 subbeats = 2 beats + 5, 9 beats = 2 bars + 1
        assert_eq!(parts(&time), (3, 1, 5, false));
    }

    #[test]
    fn ticks_round_trip() {
        let units = TimeUnits::new(3, 90., 96);
        for ticks in (0..5_000).step_by(7) {
            assert_eq!(BarBeatTime::from_ticks(ticks, units).to_ticks(), ticks);
        }
        assert_eq!(BarBeatTime::from_ticks(-289, units).to_ticks(), -289);
    }

    #[test]
    fn negative_zero_is_canonical() {
        let units = TimeUnits::default();
        let zero = BarBeatTime::negative(0, 0, 0, units);
        assert!(!zero.is_negative());
        assert_eq!(zero, BarBeatTime::zero(units));
        assert!(!BarBeatTime::from_ticks(0, units).is_negative());
    }

    #[test]
    fn equality_respects_units() {
        let one_beat_bars = BarBeatTime::new(4, 3, 2, TimeUnits::DEFAULT.with_beats_per_bar(1));
        let four_beat_bars = BarBeatTime::new(4, 3, 2, TimeUnits::DEFAULT);
        assert_ne!(one_beat_bars, four_beat_bars);
        assert_eq!(one_beat_bars.to_ticks(), 7 * 480 + 2);
        assert_eq!(four_beat_bars.to_ticks(), 19 * 480 + 2);
    }

    #[test]
    fn seconds_conversion() {
        let units = TimeUnits::default();
        let two_bars = BarBeatTime::new(2, 0, 0, units);
        assert_eq!(two_bars.to_seconds(), 4.);
        assert_eq!(BarBeatTime::from_seconds(4., units), two_bars);

        let half_beat = BarBeatTime::new(0, 0, 240, units);
        assert_eq!(half_beat.total_beats(), 0.5);
        assert_eq!(half_beat.to_seconds(), 0.25);
        assert_eq!(BarBeatTime::from_seconds(-0.25, units).to_ticks(), -240);
    }

    #[test]
    fn changing_radix_renormalizes() {
        let mut time = BarBeatTime::new(1, 2, 100, TimeUnits::default());
        let ticks = time.to_ticks();

        time.set_beats_per_bar(3);
        assert_eq!(time.to_ticks(), ticks);
        assert_eq!(parts(&time), (2, 0, 100, false));

        time.set_subbeat_divisor(96);
        assert_eq!(time.to_ticks(), ticks);
        // 3_010 ticks = 31 beats + 34 = 10 bars + 1 beat
        assert_eq!(parts(&time), (10, 1, 34, false));
    }

    #[test]
    fn ordering_follows_ticks() {
        let units = TimeUnits::default();
        let mut times = vec![
            BarBeatTime::new(1, 0, 0, units),
            BarBeatTime::negative(0, 1, 0, units),
            BarBeatTime::zero(units),
            BarBeatTime::new(0, 3, 479, units),
        ];
        times.sort();
        let ticks: Vec<i64> = times.iter().map(BarBeatTime::to_ticks).collect();
        assert_eq!(ticks, vec![-480, 0, 1_919, 1_920]);
    }
}
