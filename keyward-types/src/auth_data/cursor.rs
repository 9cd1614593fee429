use ciborium::value::Value;

use crate::DecodeError;

/// A bounds checked reader over a byte slice.
///
/// Every read either returns exactly the requested bytes or fails with
/// [`DecodeError::TooShort`] without moving the position.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    /// Read `len` bytes.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let rest = self.rest();
        if rest.len() < len {
            return Err(DecodeError::TooShort {
                needed: self.position + len,
                available: self.data.len(),
            });
        }
        self.position += len;
        Ok(&rest[..len])
    }

    /// Read a fixed size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_slice(N)?);
        Ok(array)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Read a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Decode one CBOR data item and return it together with the exact bytes it spanned.
    ///
    /// CBOR items are self-delimiting so no length prefix is needed; the position advances by
    /// exactly the encoded length of the item.
    pub fn read_cbor(&mut self) -> Result<(Value, &'a [u8]), DecodeError> {
        let rest = self.rest();
        let mut reader = rest;
        let value: Value = ciborium::de::from_reader(&mut reader).map_err(|e| match e {
            ciborium::de::Error::Io(_) => DecodeError::TooShort {
                needed: self.data.len() + 1,
                available: self.data.len(),
            },
            other => DecodeError::InvalidCbor(other.to_string()),
        })?;
        let consumed = rest.len() - reader.len();
        self.position += consumed;
        Ok((value, &rest[..consumed]))
    }

    /// Finish reading, failing if any bytes were left unconsumed.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(DecodeError::TrailingBytes { remaining }),
        }
    }
}
