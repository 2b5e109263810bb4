use core::fmt;

/// A time signature as notated: beats per bar over the note value of a beat.
///
/// In a file the denominator is stored as a power of two, so `6/8` is written
/// as `[6, 3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    beats_per_bar: u8,
    beat_unit: u8,
}

impl TimeSignature {
    /// `4/4`
    pub const FOUR_FOUR: Self = Self {
        beats_per_bar: 4,
        beat_unit: 4,
    };
    /// `3/4`
    pub const THREE_FOUR: Self = Self {
        beats_per_bar: 3,
        beat_unit: 4,
    };
    /// `2/4`
    pub const TWO_FOUR: Self = Self {
        beats_per_bar: 2,
        beat_unit: 4,
    };

    /// Returns `None` unless `beat_unit` is a power of two and `beats_per_bar` is non-zero.
    pub const fn new(beats_per_bar: u8, beat_unit: u8) -> Option<Self> {
        if beats_per_bar == 0 || !beat_unit.is_power_of_two() {
            return None;
        }
        Some(Self {
            beats_per_bar,
            beat_unit,
        })
    }

    /// The upper number of the signature.
    pub const fn beats_per_bar(&self) -> u8 {
        self.beats_per_bar
    }

    /// The lower number of the signature. `4` means a quarter note lasts one beat.
    pub const fn beat_unit(&self) -> u8 {
        self.beat_unit
    }

    /// numerator, then the denominator's base-2 exponent
    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.beats_per_bar, self.beat_unit.trailing_zeros() as u8]
    }

    /// Inverse of [`TimeSignature::to_bytes`].
    pub const fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        if bytes[1] > 7 {
            return None;
        }
        Self::new(bytes[0], 1 << bytes[1])
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_bar, self.beat_unit)
    }
}

#[test]
fn signature_bytes() {
    let six_eight = TimeSignature::new(6, 8).unwrap();
    assert_eq!(six_eight.to_bytes(), [6, 3]);
    assert_eq!(TimeSignature::from_bytes([6, 3]), Some(six_eight));
    assert_eq!(TimeSignature::FOUR_FOUR.to_bytes(), [4, 2]);
    assert_eq!(TimeSignature::from_bytes([4, 9]), None);
    assert_eq!(TimeSignature::new(3, 6), None);
}
