//! Minimal BCS (Binary Canonical Serialization) for Move layouts
//!
//! Integers are little-endian and fixed width, `bool` is one byte (0 or 1),
//! sequence lengths are ULEB128 and Move `address` is 32 raw bytes.
//!
//! [`BcsWriter`] grows its buffer as needed; [`BcsReader`] checks every read
//! against the remaining input and [`BcsReader::finish`] rejects trailing
//! bytes, so a decode consumes exactly its input.

use alloy::primitives::{B256, U256};
use thiserror::Error;

/// Longest sequence length accepted when decoding
const MAX_SEQUENCE_LENGTH: u64 = u32::MAX as u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BcsError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid bool byte: {0}")]
    InvalidBool(u8),

    #[error("ULEB128 length overflow")]
    LengthOverflow,

    #[error("non-canonical ULEB128 length")]
    NonCanonicalLength,

    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}

// ============================================================================
// Writer
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u256(&mut self, value: U256) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes::<32>());
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(value as u8);
        self
    }

    pub fn write_length(&mut self, len: usize) -> &mut Self {
        let mut value = len as u64;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
        self
    }

    /// Fixed-size value with no length prefix (e.g. a Move `address`)
    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `vector<u8>`
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_length(bytes.len());
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `vector<address>`
    pub fn write_addresses(&mut self, addresses: &[B256]) -> &mut Self {
        self.write_length(addresses.len());
        for address in addresses {
            self.buf.extend_from_slice(address.as_slice());
        }
        self
    }

    /// `vector<vector<u8>>`
    pub fn write_bytes_vec<T: AsRef<[u8]>>(&mut self, items: &[T]) -> &mut Self {
        self.write_length(items.len());
        for item in items {
            self.write_bytes(item.as_ref());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug, Clone)]
pub struct BcsReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BcsReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BcsError> {
        if self.remaining() < n {
            return Err(BcsError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], BcsError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, BcsError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, BcsError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, BcsError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, BcsError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_u256(&mut self) -> Result<U256, BcsError> {
        Ok(U256::from_le_bytes(self.take_array::<32>()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, BcsError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BcsError::InvalidBool(other)),
        }
    }

    pub fn read_length(&mut self) -> Result<usize, BcsError> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            let digit = (byte & 0x7f) as u64;
            if shift >= 64 || (shift > 0 && digit << shift >> shift != digit) {
                return Err(BcsError::LengthOverflow);
            }
            value |= digit << shift;
            if byte & 0x80 == 0 {
                if shift > 0 && digit == 0 {
                    return Err(BcsError::NonCanonicalLength);
                }
                break;
            }
            shift += 7;
        }
        if value > MAX_SEQUENCE_LENGTH {
            return Err(BcsError::LengthOverflow);
        }
        Ok(value as usize)
    }

    pub fn read_address(&mut self) -> Result<B256, BcsError> {
        Ok(B256::from(self.take_array::<32>()?))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, BcsError> {
        let len = self.read_length()?;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_addresses(&mut self) -> Result<Vec<B256>, BcsError> {
        let len = self.read_length()?;
        // Each address needs 32 bytes; fail before allocating for a bogus length
        if len > self.remaining() / 32 {
            return Err(BcsError::UnexpectedEof {
                needed: len.saturating_mul(32),
                remaining: self.remaining(),
            });
        }
        (0..len).map(|_| self.read_address()).collect()
    }

    pub fn read_bytes_vec(&mut self) -> Result<Vec<Vec<u8>>, BcsError> {
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(BcsError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        (0..len).map(|_| self.read_bytes()).collect()
    }

    /// Succeed only if all input was consumed
    pub fn finish(self) -> Result<(), BcsError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(BcsError::TrailingBytes(n)),
        }
    }
}
