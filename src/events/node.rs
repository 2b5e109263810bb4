#![doc = r#"
Node placement events

A sequencer track records when a node (a moving note emitter) is placed on or
removed from the playing field. These are stored as meta events of kind `0x07`
with a payload laid out as follows, integers big-endian:

```text
u32            identifier length
  u32          loop identifier length (0 or 16)
  [u8; 0|16]   loop uuid
  u8           b':'
  [u8; 16]     node uuid
-- add only --
u8             trajectory length
  ascii        "{{x, y}, {dx, dy}}"
u8             generator length
  u8 u8 u8     channel, note, velocity
  ascii        duration name
```

A payload that ends right after the identifier removes the node.
"#]

use core::fmt;
use core::str::FromStr;

use uuid::Uuid;

use crate::{error::NodeError, prelude::*, vlq};

/// Identifies a node, and the loop that placed it if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIdentifier {
    /// The loop the node belongs to
    pub loop_id: Option<Uuid>,
    /// The node itself
    pub node_id: Uuid,
}

impl NodeIdentifier {
    /// A node placed directly on a track.
    pub const fn new(node_id: Uuid) -> Self {
        Self {
            loop_id: None,
            node_id,
        }
    }

    /// A node placed by a loop.
    pub const fn in_loop(loop_id: Uuid, node_id: Uuid) -> Self {
        Self {
            loop_id: Some(loop_id),
            node_id,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self.loop_id {
            Some(loop_id) => {
                out.extend_from_slice(&16u32.to_be_bytes());
                out.extend_from_slice(loop_id.as_bytes());
            }
            None => out.extend_from_slice(&0u32.to_be_bytes()),
        }
        out.push(b':');
        out.extend_from_slice(self.node_id.as_bytes());
    }

    fn parse(mut bytes: &[u8]) -> Result<Self, NodeError> {
        let loop_len = u32::from_be_bytes(take_array(&mut bytes, "loop identifier length")?);
        let loop_id = match loop_len {
            0 => None,
            16 => Some(Uuid::from_bytes(take_array(&mut bytes, "loop identifier")?)),
            _ => return Err(NodeError::Identifier),
        };
        if take(&mut bytes, 1, "identifier separator")? != b":" {
            return Err(NodeError::Identifier);
        }
        let node_id = Uuid::from_bytes(take_array(&mut bytes, "node identifier")?);
        if !bytes.is_empty() {
            return Err(NodeError::Identifier);
        }
        Ok(Self { loop_id, node_id })
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loop_id) = self.loop_id {
            write!(f, "{loop_id}")?;
        }
        write!(f, ":{}", self.node_id)
    }
}

/// Where a node starts and how fast it moves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    /// Initial x position
    pub x: f64,
    /// Initial y position
    pub y: f64,
    /// Velocity along x
    pub dx: f64,
    /// Velocity along y
    pub dy: f64,
}

impl Trajectory {
    /// Create a trajectory from a position and a velocity.
    pub const fn new(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, dx, dy }
    }
}

/// Very large and very small values switch to exponent form, which never
/// exceeds 24 bytes, so a trajectory always fits its `u8` length prefix.
fn coordinate(value: f64) -> String {
    let plain = value.to_string();
    if plain.len() > 24 {
        format!("{value:e}")
    } else {
        plain
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{{{}, {}}}, {{{}, {}}}}}",
            coordinate(self.x),
            coordinate(self.y),
            coordinate(self.dx),
            coordinate(self.dy)
        )
    }
}

impl FromStr for Trajectory {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || NodeError::Trajectory(s.to_owned());
        let pair = |text: &str| -> Option<(f64, f64)> {
            let (a, b) = text.split_once(',')?;
            Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
        };

        let inner = s
            .trim()
            .strip_prefix("{{")
            .and_then(|s| s.strip_suffix("}}"))
            .ok_or_else(malformed)?;
        let (position, velocity) = inner.split_once("}, {").ok_or_else(malformed)?;
        let (x, y) = pair(position).ok_or_else(malformed)?;
        let (dx, dy) = pair(velocity).ok_or_else(malformed)?;
        Ok(Self { x, y, dx, dy })
    }
}

/// A notated note length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum Duration {
    DoubleWhole,
    DottedWhole,
    Whole,
    DottedHalf,
    Half,
    DottedQuarter,
    Quarter,
    DottedEighth,
    Eighth,
    DottedSixteenth,
    Sixteenth,
    DottedThirtySecond,
    ThirtySecond,
    DottedSixtyFourth,
    SixtyFourth,
    DottedHundredTwentyEighth,
    HundredTwentyEighth,
    DottedTwoHundredFiftySixth,
    TwoHundredFiftySixth,
}

impl Duration {
    /// Every duration, longest first.
    pub const ALL: [Self; 19] = [
        Self::DoubleWhole,
        Self::DottedWhole,
        Self::Whole,
        Self::DottedHalf,
        Self::Half,
        Self::DottedQuarter,
        Self::Quarter,
        Self::DottedEighth,
        Self::Eighth,
        Self::DottedSixteenth,
        Self::Sixteenth,
        Self::DottedThirtySecond,
        Self::ThirtySecond,
        Self::DottedSixtyFourth,
        Self::SixtyFourth,
        Self::DottedHundredTwentyEighth,
        Self::HundredTwentyEighth,
        Self::DottedTwoHundredFiftySixth,
        Self::TwoHundredFiftySixth,
    ];

    /// The name stored in a note generator payload.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DoubleWhole => "DoubleWhole",
            Self::DottedWhole => "DottedWhole",
            Self::Whole => "Whole",
            Self::DottedHalf => "DottedHalf",
            Self::Half => "Half",
            Self::DottedQuarter => "DottedQuarter",
            Self::Quarter => "Quarter",
            Self::DottedEighth => "DottedEighth",
            Self::Eighth => "Eighth",
            Self::DottedSixteenth => "DottedSixteenth",
            Self::Sixteenth => "Sixteenth",
            Self::DottedThirtySecond => "DottedThirtySecond",
            Self::ThirtySecond => "ThirtySecond",
            Self::DottedSixtyFourth => "DottedSixtyFourth",
            Self::SixtyFourth => "SixtyFourth",
            Self::DottedHundredTwentyEighth => "DottedHundredTwentyEighth",
            Self::HundredTwentyEighth => "HundredTwentyEighth",
            Self::DottedTwoHundredFiftySixth => "DottedTwoHundredFiftySixth",
            Self::TwoHundredFiftySixth => "TwoHundredFiftySixth",
        }
    }

    /// Looks a duration up by [`Duration::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// Length in beats, taking a quarter note as one beat.
    pub const fn beats(&self) -> f64 {
        match self {
            Self::DoubleWhole => 8.,
            Self::DottedWhole => 6.,
            Self::Whole => 4.,
            Self::DottedHalf => 3.,
            Self::Half => 2.,
            Self::DottedQuarter => 1.5,
            Self::Quarter => 1.,
            Self::DottedEighth => 0.75,
            Self::Eighth => 0.5,
            Self::DottedSixteenth => 0.375,
            Self::Sixteenth => 0.25,
            Self::DottedThirtySecond => 0.1875,
            Self::ThirtySecond => 0.125,
            Self::DottedSixtyFourth => 0.09375,
            Self::SixtyFourth => 0.0625,
            Self::DottedHundredTwentyEighth => 0.046875,
            Self::HundredTwentyEighth => 0.03125,
            Self::DottedTwoHundredFiftySixth => 0.0234375,
            Self::TwoHundredFiftySixth => 0.015625,
        }
    }

    /// Length in seconds at `beats_per_minute`.
    pub fn seconds(&self, beats_per_minute: f64) -> f64 {
        self.beats() * 60. / beats_per_minute
    }
}

/// What a node plays each time it strikes a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteGenerator {
    /// MIDI channel
    pub channel: u8,
    /// MIDI note number
    pub note: u8,
    /// Strike velocity
    pub velocity: u8,
    /// How long the note sounds
    pub duration: Duration,
}

impl NoteGenerator {
    fn to_bytes(self) -> Vec<u8> {
        let mut out = vec![self.channel, self.note, self.velocity];
        out.extend_from_slice(self.duration.name().as_bytes());
        out
    }

    fn parse(bytes: &[u8]) -> Result<Self, NodeError> {
        let [channel, note, velocity, name @ ..] = bytes else {
            return Err(NodeError::Generator);
        };
        let duration = core::str::from_utf8(name)
            .ok()
            .and_then(Duration::from_name)
            .ok_or(NodeError::Generator)?;
        Ok(Self {
            channel: *channel,
            note: *note,
            velocity: *velocity,
            duration,
        })
    }
}

/// Whether a node arrives or leaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeAction {
    /// Place a node
    Add {
        /// Starting position and velocity
        trajectory: Trajectory,
        /// Note played on each strike
        generator: NoteGenerator,
    },
    /// Remove the node
    Remove,
}

/// A node placement event.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    pub(crate) time: BarBeatTime,
    pub(crate) delta: Option<u32>,
    identifier: NodeIdentifier,
    action: NodeAction,
}

fn take<'a>(bytes: &mut &'a [u8], len: usize, what: &'static str) -> Result<&'a [u8], NodeError> {
    if bytes.len() < len {
        return Err(NodeError::Truncated(what));
    }
    let (head, tail) = bytes.split_at(len);
    *bytes = tail;
    Ok(head)
}

fn take_array<const N: usize>(bytes: &mut &[u8], what: &'static str) -> Result<[u8; N], NodeError> {
    let mut out = [0; N];
    out.copy_from_slice(take(bytes, N, what)?);
    Ok(out)
}

/// Writes a `u8` length prefix and the bytes it covers.
///
/// Fields longer than 255 bytes are cut so the prefix always matches.
fn push_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = u8::try_from(bytes.len()).unwrap_or_else(|_| {
        log::warn!("Node payload field of {} bytes cut to 255", bytes.len());
        u8::MAX
    });
    out.push(len);
    out.extend_from_slice(&bytes[..len as usize]);
}

/// Reads a `u8` length prefix and the bytes it covers.
fn take_prefixed<'a>(bytes: &mut &'a [u8], what: &'static str) -> Result<&'a [u8], NodeError> {
    let len = take(bytes, 1, what)?[0];
    take(bytes, len as usize, what)
}

impl NodeEvent {
    /// An event placing a node.
    pub fn add(
        identifier: NodeIdentifier,
        trajectory: Trajectory,
        generator: NoteGenerator,
        time: BarBeatTime,
    ) -> Self {
        Self {
            time,
            delta: None,
            identifier,
            action: NodeAction::Add {
                trajectory,
                generator,
            },
        }
    }

    /// An event removing a node.
    pub fn remove(identifier: NodeIdentifier, time: BarBeatTime) -> Self {
        Self {
            time,
            delta: None,
            identifier,
            action: NodeAction::Remove,
        }
    }

    /// When the event occurs
    pub const fn time(&self) -> &BarBeatTime {
        &self.time
    }

    /// The node this event concerns
    pub const fn identifier(&self) -> NodeIdentifier {
        self.identifier
    }

    /// Add or remove
    pub const fn action(&self) -> &NodeAction {
        &self.action
    }

    /// Payload bytes, without the `FF 07` prefix or length.
    pub fn payload(&self) -> Vec<u8> {
        let mut identifier = Vec::with_capacity(37);
        self.identifier.write_to(&mut identifier);

        let mut out = Vec::with_capacity(identifier.len() + 64);
        out.extend_from_slice(&(identifier.len() as u32).to_be_bytes());
        out.extend_from_slice(&identifier);

        if let NodeAction::Add {
            trajectory,
            generator,
        } = &self.action
        {
            push_prefixed(&mut out, trajectory.to_string().as_bytes());
            push_prefixed(&mut out, &generator.to_bytes());
        }
        out
    }

    /// Decodes a payload read from a track chunk.
    pub fn parse(payload: &[u8], time: BarBeatTime) -> Result<Self, NodeError> {
        let mut bytes = payload;
        let identifier_len = u32::from_be_bytes(take_array(&mut bytes, "identifier length")?);
        let identifier =
            NodeIdentifier::parse(take(&mut bytes, identifier_len as usize, "identifier")?)?;

        if bytes.is_empty() {
            return Ok(Self::remove(identifier, time));
        }

        let trajectory = take_prefixed(&mut bytes, "trajectory")?;
        let trajectory = core::str::from_utf8(trajectory)
            .map_err(|_| NodeError::Trajectory(String::from_utf8_lossy(trajectory).into_owned()))?
            .parse()?;
        let generator = NoteGenerator::parse(take_prefixed(&mut bytes, "generator")?)?;
        if !bytes.is_empty() {
            return Err(NodeError::Generator);
        }
        Ok(Self::add(identifier, trajectory, generator, time))
    }

    /// Appends `FF 07 <length> <payload>`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let payload = self.payload();
        out.push(0xFF);
        out.push(MetaKind::Node.into());
        vlq::write(payload.len() as u32, out);
        out.extend_from_slice(&payload);
    }
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            NodeAction::Add {
                trajectory,
                generator,
            } => write!(
                f,
                "{} add node '{}' ({trajectory}, {:?} {} {})",
                self.time, self.identifier, generator.duration, generator.note, generator.velocity
            ),
            NodeAction::Remove => write!(f, "{} remove node '{}'", self.time, self.identifier),
        }
    }
}
