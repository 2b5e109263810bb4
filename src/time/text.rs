use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use super::{BarBeatTime, TimeUnits};

/// A failure to parse the text form of a [`BarBeatTime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// The text is missing the `:` between bar and beat, or the `.` between
    /// beat and subbeat.
    #[error("Expected `<bar>:<beat>.<subbeat>`, got {0:?}")]
    Shape(String),
    /// A numeric field could not be read.
    #[error("Invalid {field} {text:?}")]
    Field {
        /// Name of the field
        field: &'static str,
        /// The offending text
        text: String,
    },
    /// A radix or the tempo is zero.
    #[error("{0} must be a positive value")]
    NotPositive(&'static str),
    /// The beat or subbeat does not fit below its radix.
    #[error("{field} {value} is out of range for radix {radix}")]
    OutOfRange {
        /// Name of the field
        field: &'static str,
        /// Parsed value
        value: u64,
        /// Radix the value must stay below
        radix: u32,
    },
}

fn field<T: FromStr>(field: &'static str, text: &str) -> Result<T, TimeParseError> {
    text.parse().map_err(|_| TimeParseError::Field {
        field,
        text: text.to_owned(),
    })
}

/// Splits `<value>/<radix>` into its two halves; the radix is optional.
fn fraction(
    name: &'static str,
    radix_name: &'static str,
    text: &str,
    default_radix: u32,
) -> Result<(u64, u32), TimeParseError> {
    let (value, radix) = match text.split_once('/') {
        Some((value, radix)) => (field(name, value)?, field(radix_name, radix)?),
        None => (field(name, text)?, default_radix),
    };
    if radix == 0 {
        return Err(TimeParseError::NotPositive(radix_name));
    }
    if value >= radix as u64 {
        return Err(TimeParseError::OutOfRange {
            field: name,
            value,
            radix,
        });
    }
    Ok((value, radix))
}

impl FromStr for BarBeatTime {
    type Err = TimeParseError;

    /// Parses `[-]<bar>:<beat>[/<beatsPerBar>].<subbeat>[/<subbeatDivisor>][@<bpm>]`.
    ///
    /// Omitted configuration fields take their [`TimeUnits::DEFAULT`] values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (text, bpm) = match text.split_once('@') {
            Some((time, bpm)) => (time, field::<f64>("beats_per_minute", bpm)?),
            None => (text, TimeUnits::DEFAULT.beats_per_minute),
        };
        if !(bpm.is_finite() && bpm > 0.) {
            return Err(TimeParseError::NotPositive("beats_per_minute"));
        }

        let shape = || TimeParseError::Shape(s.to_owned());
        let (bar, rest) = text.split_once(':').ok_or_else(shape)?;
        let (beat, subbeat) = rest.split_once('.').ok_or_else(shape)?;

        let bar = field::<u64>("bar", bar)?;
        let (beat, beats_per_bar) = fraction(
            "beat",
            "beats_per_bar",
            beat,
            TimeUnits::DEFAULT.beats_per_bar,
        )?;
        let (subbeat, subbeat_divisor) = fraction(
            "subbeat",
            "subbeat_divisor",
            subbeat,
            TimeUnits::DEFAULT.subbeat_divisor,
        )?;

        let units = TimeUnits::new(beats_per_bar, bpm, subbeat_divisor);
        Ok(Self::from_components(
            bar,
            beat,
            subbeat,
            negative,
            units,
        ))
    }
}

impl fmt::Display for BarBeatTime {
    /// The canonical form, which [`FromStr`] parses back into an identical value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}/{}.{}/{}@{}",
            if self.negative { "-" } else { "" },
            self.bar,
            self.beat,
            self.units.beats_per_bar,
            self.subbeat,
            self.units.subbeat_divisor,
            self.units.beats_per_minute
        )
    }
}

impl BarBeatTime {
    /// A one-based position label for showing to a user, e.g. `001:1.001`.
    ///
    /// The bar is padded to three digits and the subbeat to the width of
    /// the divisor.
    pub fn position_label(&self) -> String {
        let width = self.units.subbeat_divisor.to_string().len();
        format!(
            "{}{:03}:{}.{:0width$}",
            if self.negative { "-" } else { "" },
            self.bar + 1,
            self.beat + 1,
            self.subbeat + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_text() {
        let units = TimeUnits::default();
        let time = BarBeatTime::new(4, 3, 2, units);
        assert_eq!(time.to_string(), "4:3/4.2/480@120");
        assert_eq!("4:3/4.2/480@120".parse::<BarBeatTime>(), Ok(time));

        let negative = BarBeatTime::negative(4, 3, 2, units);
        assert_eq!(negative.to_string(), "-4:3/4.2/480@120");
        assert_eq!(negative.to_string().parse::<BarBeatTime>(), Ok(negative));
    }

    #[test]
    fn text_keeps_units() {
        let units = TimeUnits::new(7, 97.5, 96);
        let time = BarBeatTime::new(12, 6, 95, units);
        let parsed: BarBeatTime = time.to_string().parse().unwrap();
        assert_eq!(parsed.units(), units);
        assert_eq!(parsed.to_ticks(), time.to_ticks());
    }

    #[test]
    fn abbreviated_text() {
        let time: BarBeatTime = "2:1.240".parse().unwrap();
        assert_eq!(time.units(), TimeUnits::DEFAULT);
        assert_eq!(time.to_ticks(), (2 * 4 + 1) * 480 + 240);

        let time: BarBeatTime = "0:2/3.5@90".parse().unwrap();
        assert_eq!(time.units(), TimeUnits::new(3, 90., 480));
    }

    #[test]
    fn malformed_text() {
        assert_eq!(
            "12".parse::<BarBeatTime>(),
            Err(TimeParseError::Shape("12".to_owned()))
        );
        assert_eq!(
            "1:4/4.0".parse::<BarBeatTime>(),
            Err(TimeParseError::OutOfRange {
                field: "beat",
                value: 4,
                radix: 4
            })
        );
        assert_eq!(
            "1:0.0/0".parse::<BarBeatTime>(),
            Err(TimeParseError::NotPositive("subbeat_divisor"))
        );
        assert!(matches!(
            "x:0.0".parse::<BarBeatTime>(),
            Err(TimeParseError::Field { field: "bar", .. })
        ));
    }

    #[test]
    fn position_label() {
        let time = BarBeatTime::new(0, 2, 9, TimeUnits::default());
        assert_eq!(time.position_label(), "001:3.010");
    }
}
