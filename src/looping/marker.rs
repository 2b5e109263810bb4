use core::fmt;
use core::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::prelude::*;

/// A failure to read loop boundary text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopMarkerError {
    /// Text that starts like a loop marker but does not follow either form
    #[error("Malformed loop marker {0:?}")]
    Malformed(String),
    /// The identifier between the parentheses is not a uuid
    #[error("Invalid loop identifier {0:?}")]
    Identifier(String),
    /// Repetitions or delay is not an integer
    #[error("Invalid loop {field} {text:?}")]
    Number {
        /// Which field
        field: &'static str,
        /// The offending text
        text: String,
    },
}

#[doc = r#"
The text of a marker meta event bracketing a loop in a track

```text
start(<uuid>):<repetitions>:<repeat delay in ticks>
end(<uuid>)
```

# Example
```rust
# use midiseq::prelude::*;
let marker: LoopMarker = "start(4B1E5FD6-6E8F-4E2C-9A51-2B0C1E6E9C11):2:480".parse().unwrap();
let LoopMarker::Begin { repetitions, repeat_delay, .. } = marker else { panic!() };
assert_eq!((repetitions, repeat_delay), (2, 480));
assert_eq!(marker.to_string(), "start(4B1E5FD6-6E8F-4E2C-9A51-2B0C1E6E9C11):2:480");
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopMarker {
    /// Opens a loop
    Begin {
        /// The loop
        identifier: Uuid,
        /// Number of passes, zero or less for endless
        repetitions: i32,
        /// Ticks of silence between passes
        repeat_delay: u64,
    },
    /// Closes a loop
    End {
        /// The loop
        identifier: Uuid,
    },
}

impl LoopMarker {
    /// The loop this marker belongs to.
    pub const fn identifier(&self) -> Uuid {
        match self {
            Self::Begin { identifier, .. } | Self::End { identifier } => *identifier,
        }
    }

    /// Reads a loop marker out of an event.
    ///
    /// Returns `Ok(None)` for anything that is not a marker meta event whose UTF-8
    /// text starts with `start(` or `end(`.
    pub fn from_event(event: &Event) -> Result<Option<Self>, LoopMarkerError> {
        let Some(MetaData::Marker(text)) = event.as_meta().map(MetaEvent::data) else {
            return Ok(None);
        };
        let Some(text) = text.as_str() else {
            return Ok(None);
        };
        if text.starts_with("start(") || text.starts_with("end(") {
            text.parse().map(Some)
        } else {
            Ok(None)
        }
    }

    /// The marker meta event at `time`.
    pub fn to_event(&self, time: BarBeatTime) -> Event {
        MetaEvent::new(MetaData::Marker(self.to_string().into()), time).into()
    }
}

impl fmt::Display for LoopMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin {
                identifier,
                repetitions,
                repeat_delay,
            } => write!(
                f,
                "start({:X}):{repetitions}:{repeat_delay}",
                identifier.hyphenated()
            ),
            Self::End { identifier } => write!(f, "end({:X})", identifier.hyphenated()),
        }
    }
}

fn identifier(text: &str) -> Result<Uuid, LoopMarkerError> {
    Uuid::parse_str(text).map_err(|_| LoopMarkerError::Identifier(text.to_owned()))
}

impl FromStr for LoopMarker {
    type Err = LoopMarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LoopMarkerError::Malformed(s.to_owned());

        if let Some(rest) = s.strip_prefix("end(") {
            let id = rest.strip_suffix(')').ok_or_else(malformed)?;
            return Ok(Self::End {
                identifier: identifier(id)?,
            });
        }

        let rest = s.strip_prefix("start(").ok_or_else(malformed)?;
        let (id, rest) = rest.split_once("):").ok_or_else(malformed)?;
        let (repetitions, repeat_delay) = rest.split_once(':').ok_or_else(malformed)?;
        Ok(Self::Begin {
            identifier: identifier(id)?,
            repetitions: repetitions.parse().map_err(|_| LoopMarkerError::Number {
                field: "repetitions",
                text: repetitions.to_owned(),
            })?,
            repeat_delay: repeat_delay.parse().map_err(|_| LoopMarkerError::Number {
                field: "repeat delay",
                text: repeat_delay.to_owned(),
            })?,
        })
    }
}

#[test]
fn marker_text() {
    use pretty_assertions::assert_eq;

    let identifier = Uuid::from_bytes([0xAB; 16]);
    let begin = LoopMarker::Begin {
        identifier,
        repetitions: -1,
        repeat_delay: 0,
    };
    let text = begin.to_string();
    assert_eq!(text, "start(ABABABAB-ABAB-ABAB-ABAB-ABABABABABAB):-1:0");
    assert_eq!(text.parse::<LoopMarker>(), Ok(begin));

    let end = LoopMarker::End { identifier };
    assert_eq!(end.to_string(), "end(ABABABAB-ABAB-ABAB-ABAB-ABABABABABAB)");
    assert_eq!(end.to_string().parse::<LoopMarker>(), Ok(end));
    // lower case identifiers are accepted too
    assert_eq!(
        "end(abababab-abab-abab-abab-abababababab)".parse::<LoopMarker>(),
        Ok(end)
    );
}

#[test]
fn malformed_markers() {
    use pretty_assertions::assert_eq;

    assert_eq!(
        "end(nope)".parse::<LoopMarker>(),
        Err(LoopMarkerError::Identifier("nope".to_owned()))
    );
    assert!(matches!(
        "start(ABABABAB-ABAB-ABAB-ABAB-ABABABABABAB):x:0".parse::<LoopMarker>(),
        Err(LoopMarkerError::Number {
            field: "repetitions",
            ..
        })
    ));
    assert_eq!(
        "chorus".parse::<LoopMarker>(),
        Err(LoopMarkerError::Malformed("chorus".to_owned()))
    );
}

#[test]
fn plain_markers_are_not_loop_markers() {
    let event = MetaEvent::new(MetaData::Marker("chorus".into()), BarBeatTime::default());
    assert_eq!(LoopMarker::from_event(&Event::from(event)), Ok(None));
}
