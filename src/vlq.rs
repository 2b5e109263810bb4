#![doc = r#"
Variable length quantities

Delta times in a track chunk are written seven bits per byte, most significant
group first. Every byte but the last has its top bit set.

```text
0x00000000 -> 00
0x0000007F -> 7F
0x00000080 -> 81 00
0x00003FFF -> FF 7F
0x0FFFFFFF -> FF FF FF 7F
```

Quantities never exceed four bytes, which bounds them at [`MAX`].
"#]

use crate::error::VlqError;

/// The largest value that fits in four bytes.
pub const MAX: u32 = 0x0FFF_FFFF;

/// Appends the encoding of `value` to `out`, using as few bytes as possible.
///
/// Values above [`MAX`] are clamped to it.
pub fn write(value: u32, out: &mut Vec<u8>) {
    if value > MAX {
        log::warn!("Delta time {value} exceeds the variable length maximum, writing {MAX}");
    }
    let value = value.min(MAX);

    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

/// Encodes `value` into a fresh buffer.
pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    write(value, &mut out);
    out
}

/// The number of bytes [`write`] uses for `value`.
pub const fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

/// Decodes a quantity from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), VlqError> {
    let mut value = 0u32;
    for (i, byte) in bytes.iter().enumerate() {
        if i == 4 {
            return Err(VlqError::TooLong);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= 4 {
        Err(VlqError::TooLong)
    } else {
        Err(VlqError::Unterminated)
    }
}

#[test]
fn known_encodings() {
    use pretty_assertions::assert_eq;
    let cases: [(u32, &[u8]); 8] = [
        (0x00, &[0x00]),
        (0x40, &[0x40]),
        (0x7F, &[0x7F]),
        (0x80, &[0x81, 0x00]),
        (0x2000, &[0xC0, 0x00]),
        (0x3FFF, &[0xFF, 0x7F]),
        (0x10_0000, &[0xC0, 0x80, 0x00]),
        (MAX, &[0xFF, 0xFF, 0xFF, 0x7F]),
    ];
    for (value, bytes) in cases {
        assert_eq!(encode(value), bytes);
        assert_eq!(encoded_len(value), bytes.len());
        assert_eq!(decode(bytes), Ok((value, bytes.len())));
    }
}

#[test]
fn round_trip_is_minimal() {
    for shift in 0..28 {
        for value in [1u32 << shift, (1u32 << shift) - 1, (1u32 << shift) + 1] {
            let bytes = encode(value);
            assert_eq!(bytes.len(), encoded_len(value));
            assert_ne!(bytes[0], 0x80, "leading empty group for {value}");
            assert_eq!(decode(&bytes), Ok((value, bytes.len())));
        }
    }
}

#[test]
fn decode_stops_at_terminator() {
    assert_eq!(decode(&[0x81, 0x00, 0xFF]), Ok((0x80, 2)));
}

#[test]
fn decode_rejects_malformed() {
    assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]), Err(VlqError::TooLong));
    assert_eq!(decode(&[0x81, 0x80]), Err(VlqError::Unterminated));
    assert_eq!(decode(&[]), Err(VlqError::Unterminated));
}

#[test]
fn oversized_values_are_clamped() {
    assert_eq!(encode(u32::MAX), encode(MAX));
}
