/// The configuration a [`BarBeatTime`](super::BarBeatTime) is measured in.
///
/// `beats_per_bar` and `subbeat_divisor` are the radices of the bar and beat
/// places; `beats_per_minute` is only consulted when converting to or from
/// seconds.
///
/// # Example
/// ```rust
/// # use midiseq::prelude::*;
/// let units = TimeUnits::default();
///
/// assert_eq!(units.beats_per_bar, 4);
/// assert_eq!(units.subbeat_divisor, 480);
/// assert_eq!(units.ticks_per_bar(), 1920);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeUnits {
    /// Number of beats in a bar.
    pub beats_per_bar: u32,
    /// Tempo used for conversions to and from seconds.
    pub beats_per_minute: f64,
    /// Number of subbeats (ticks) in a beat.
    pub subbeat_divisor: u32,
}

impl TimeUnits {
    /// Four beats per bar at 120 BPM, 480 subbeats per beat.
    pub const DEFAULT: Self = Self {
        beats_per_bar: 4,
        beats_per_minute: 120.,
        subbeat_divisor: 480,
    };

    /// Create a new set of units.
    ///
    /// # Panics
    /// if `beats_per_bar` or `subbeat_divisor` is zero, or `beats_per_minute`
    /// is not a positive, finite number.
    pub fn new(beats_per_bar: u32, beats_per_minute: f64, subbeat_divisor: u32) -> Self {
        let units = Self {
            beats_per_bar,
            beats_per_minute,
            subbeat_divisor,
        };
        units.validate();
        units
    }

    /// Returns a copy with `beats_per_bar` replaced.
    pub fn with_beats_per_bar(self, beats_per_bar: u32) -> Self {
        Self::new(beats_per_bar, self.beats_per_minute, self.subbeat_divisor)
    }

    /// Returns a copy with `beats_per_minute` replaced.
    pub fn with_beats_per_minute(self, beats_per_minute: f64) -> Self {
        Self::new(self.beats_per_bar, beats_per_minute, self.subbeat_divisor)
    }

    /// Returns a copy with `subbeat_divisor` replaced.
    pub fn with_subbeat_divisor(self, subbeat_divisor: u32) -> Self {
        Self::new(self.beats_per_bar, self.beats_per_minute, subbeat_divisor)
    }

    /// The number of ticks in one bar.
    pub const fn ticks_per_bar(&self) -> u64 {
        self.beats_per_bar as u64 * self.subbeat_divisor as u64
    }

    /// The duration of one beat in seconds.
    pub fn seconds_per_beat(&self) -> f64 {
        60. / self.beats_per_minute
    }

    /// True when every radix is positive and the tempo is usable.
    pub fn is_valid(&self) -> bool {
        self.beats_per_bar > 0
            && self.subbeat_divisor > 0
            && self.beats_per_minute.is_finite()
            && self.beats_per_minute > 0.
    }

    pub(crate) fn validate(&self) {
        assert!(self.beats_per_bar > 0, "`beats_per_bar` must be a positive value");
        assert!(
            self.subbeat_divisor > 0,
            "`subbeat_divisor` must be a positive value"
        );
        assert!(
            self.beats_per_minute.is_finite() && self.beats_per_minute > 0.,
            "`beats_per_minute` must be a positive value, got {}",
            self.beats_per_minute
        );
    }
}

impl Default for TimeUnits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn default_units() {
    let units = TimeUnits::default();
    assert_eq!(units, TimeUnits::new(4, 120., 480));
    assert_eq!(units.seconds_per_beat(), 0.5);
    assert!(units.is_valid());
}

#[test]
#[should_panic(expected = "subbeat_divisor")]
fn zero_divisor_is_rejected() {
    let _ = TimeUnits::DEFAULT.with_subbeat_divisor(0);
}

#[test]
#[should_panic(expected = "beats_per_bar")]
fn zero_beats_per_bar_is_rejected() {
    let _ = TimeUnits::new(0, 120., 480);
}
