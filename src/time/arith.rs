use core::cmp::Ordering;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use super::BarBeatTime;

/// Place values, most significant first.
type Places = (u64, u64, u64);

impl BarBeatTime {
    const fn places(&self) -> Places {
        (self.bar, self.beat as u64, self.subbeat as u64)
    }

    /// `a - b` for `a >= b`, borrowing from the beat and bar places as needed.
    fn borrow_sub(a: Places, b: Places, beats_per_bar: u64, divisor: u64) -> Places {
        let (mut bar, mut beat, mut subbeat) = a;
        if subbeat < b.2 {
            subbeat += divisor;
            if beat == 0 {
                beat += beats_per_bar;
                bar -= 1;
            }
            beat -= 1;
        }
        subbeat -= b.2;
        if beat < b.1 {
            beat += beats_per_bar;
            bar -= 1;
        }
        (bar - b.0, beat - b.1, subbeat)
    }

    /// Adds `rhs` to `self` place by place. `rhs` is first re-expressed in
    /// `self`'s units.
    fn mixed_radix_add(self, rhs: Self) -> Self {
        let rhs = rhs.with_units(self.units);
        let (a, b) = (self.places(), rhs.places());

        if self.negative == rhs.negative {
            // from_components carries subbeat -> beat -> bar
            return Self::from_components(
                a.0 + b.0,
                a.1 + b.1,
                a.2 + b.2,
                self.negative,
                self.units,
            );
        }

        let beats_per_bar = self.units.beats_per_bar as u64;
        let divisor = self.units.subbeat_divisor as u64;
        // place values are normalized, so lexicographic order is magnitude order
        let (bar, beat, subbeat, negative) = match a.cmp(&b) {
            Ordering::Equal => return Self::zero(self.units),
            Ordering::Greater => {
                let (bar, beat, subbeat) = Self::borrow_sub(a, b, beats_per_bar, divisor);
                (bar, beat, subbeat, self.negative)
            }
            Ordering::Less => {
                let (bar, beat, subbeat) = Self::borrow_sub(b, a, beats_per_bar, divisor);
                (bar, beat, subbeat, rhs.negative)
            }
        };
        Self::from_components(bar, beat, subbeat, negative, self.units)
    }
}

impl Neg for BarBeatTime {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self {
            negative: !self.negative && !self.is_zero(),
            ..self
        }
    }
}

impl Add for BarBeatTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.mixed_radix_add(rhs)
    }
}

impl Sub for BarBeatTime {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self.mixed_radix_add(-rhs)
    }
}

impl AddAssign for BarBeatTime {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for BarBeatTime {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
