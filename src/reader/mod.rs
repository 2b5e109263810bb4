#![doc = r#"
A cursor over a complete byte buffer

The [`Reader`] hands out big-endian integers, fixed size arrays, borrowed
slices and variable length quantities, reporting every failure with the
absolute offset into the original buffer.

# Example
```rust
# use midiseq::reader::Reader;
let mut reader = Reader::from_byte_slice(&[0x4D, 0x54, 0x68, 0x64, 0x81, 0x00]);
assert_eq!(&reader.read_exact_size::<4>().unwrap(), b"MThd");
assert_eq!(reader.read_vlq().unwrap(), 0x80);
assert!(reader.is_empty());
```
"#]

mod error;
pub use error::*;

use crate::{error::VlqError, vlq};

/// Reads values from a borrowed buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
    /// Absolute offset of `data[0]`, so sub-readers report positions in the
    /// outermost buffer.
    base: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader at the start of `data`.
    pub const fn from_byte_slice(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            base: 0,
        }
    }

    /// The absolute offset of the next byte to be read.
    pub const fn buffer_position(&self) -> usize {
        self.base + self.position
    }

    /// The number of unread bytes.
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True once every byte has been read.
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> ReadResult<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or_else(|| ReaderError::oob(self.buffer_position()))
    }

    /// Borrows the next `len` bytes.
    pub fn read_exact(&mut self, len: usize) -> ReadResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(ReaderError::oob(self.buffer_position()));
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    /// Copies the next `N` bytes into an array.
    pub fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        let byte = self.peek_u8()?;
        self.position += 1;
        Ok(byte)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> ReadResult<u16> {
        self.read_exact_size().map(u16::from_be_bytes)
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> ReadResult<u32> {
        self.read_exact_size().map(u32::from_be_bytes)
    }

    /// Reads a variable length quantity.
    pub fn read_vlq(&mut self) -> ReadResult<u32> {
        let start = self.buffer_position();
        match vlq::decode(&self.data[self.position..]) {
            Ok((value, len)) => {
                self.position += len;
                Ok(value)
            }
            Err(VlqError::Unterminated) => Err(ReaderError::oob(self.base + self.data.len())),
            Err(e) => Err(ReaderError::parse_error(start, e)),
        }
    }

    /// Splits off a reader over the next `len` bytes and advances past them.
    ///
    /// Positions reported by the sub-reader stay absolute.
    pub fn split_off(&mut self, len: usize) -> ReadResult<Reader<'a>> {
        let base = self.buffer_position();
        let data = self.read_exact(len)?;
        Ok(Reader {
            data,
            position: 0,
            base,
        })
    }
}

#[test]
fn reads_big_endian() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x06, 0x00, 0x00, 0x01, 0xE0, 0x7F]);
    assert_eq!(reader.read_u16().unwrap(), 6);
    assert_eq!(reader.read_u32().unwrap(), 0x1E0);
    assert_eq!(reader.peek_u8().unwrap(), 0x7F);
    assert_eq!(reader.read_u8().unwrap(), 0x7F);
    assert!(reader.read_u8().unwrap_err().is_out_of_bounds());
}

#[test]
fn sub_reader_positions_are_absolute() {
    let mut reader = Reader::from_byte_slice(&[1, 2, 3, 4, 5, 6]);
    reader.read_u16().unwrap();
    let mut inner = reader.split_off(3).unwrap();
    assert_eq!(reader.buffer_position(), 5);
    assert_eq!(inner.buffer_position(), 2);
    inner.read_exact(3).unwrap();
    assert_eq!(inner.read_u8().unwrap_err().position(), 5);
}

#[test]
fn unterminated_quantity_is_out_of_bounds() {
    let mut reader = Reader::from_byte_slice(&[0x81, 0x80]);
    let err = reader.read_vlq().unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(err.position(), 2);
}
