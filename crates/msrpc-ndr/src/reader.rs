//! NDR input buffer
//!
//! The reader consumes little-endian NDR from a `Bytes` front to back. Every
//! read checks the bytes remaining first, so a truncated or hostile stub
//! fails with [`NdrError::TruncatedInput`] instead of panicking.

use crate::{Alignment, NdrError, NdrUnmarshal, Result};
use bytes::{Buf, Bytes};

/// Default bound on any decoded element count (MS-RRP's largest value size)
pub const DEFAULT_MAX_ARRAY_ELEMENTS: usize = 0x0400_0000;

/// Decode limits applied to counts read from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrLimits {
    /// Largest conformance or variance count accepted
    pub max_array_elements: usize,
}

impl Default for NdrLimits {
    fn default() -> Self {
        Self {
            max_array_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
        }
    }
}

/// Sequential NDR decoder for one response stub
#[derive(Debug, Clone)]
pub struct NdrReader {
    buf: Bytes,
    position: usize,
    limits: NdrLimits,
}

impl NdrReader {
    /// Create a reader positioned at the start of the stub
    pub fn new(stub: impl Into<Bytes>) -> Self {
        Self {
            buf: stub.into(),
            position: 0,
            limits: NdrLimits::default(),
        }
    }

    /// Replace the decode limits
    pub fn with_limits(mut self, limits: NdrLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> NdrLimits {
        self.limits
    }

    /// Current offset from the start of the stub
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::truncated(needed, self.buf.remaining()));
        }
        Ok(())
    }

    /// Skip `count` bytes
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.buf.advance(count);
        self.position += count;
        Ok(())
    }

    /// Skip padding up to the given boundary
    pub fn align(&mut self, alignment: Alignment) -> Result<()> {
        let padding = alignment.pad_to(self.position);
        self.skip(padding)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.position += 1;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        self.position += 1;
        Ok(self.buf.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.align(Alignment::Two)?;
        self.ensure(2)?;
        self.position += 2;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.align(Alignment::Two)?;
        self.ensure(2)?;
        self.position += 2;
        Ok(self.buf.get_i16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.align(Alignment::Four)?;
        self.ensure(4)?;
        self.position += 4;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.align(Alignment::Four)?;
        self.ensure(4)?;
        self.position += 4;
        Ok(self.buf.get_i32_le())
    }

    /// Read a run of raw bytes (alignment 1)
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes> {
        self.ensure(count)?;
        self.position += count;
        Ok(self.buf.split_to(count))
    }

    /// Read a fixed-size byte array (alignment 1)
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        self.position += N;
        Ok(out)
    }

    /// Read `count` UTF-16 code units (alignment 2)
    pub fn read_utf16(&mut self, count: usize) -> Result<Vec<u16>> {
        self.align(Alignment::Two)?;
        let byte_count = count
            .checked_mul(2)
            .ok_or_else(|| NdrError::truncated(usize::MAX, self.remaining()))?;
        self.ensure(byte_count)?;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.buf.get_u16_le());
        }
        self.position += byte_count;
        Ok(units)
    }

    /// Read a referent ID and report whether the pointer is present
    pub fn read_referent(&mut self) -> Result<bool> {
        Ok(self.read_u32()? != crate::NULL_REFERENT)
    }

    /// Validate a count read from the wire before allocating for it
    ///
    /// `min_element_size` is the fewest bytes one element can occupy; a count
    /// that cannot possibly fit in the remaining input is rejected up front.
    pub fn check_count(&self, count: u32, min_element_size: usize) -> Result<usize> {
        let count = count as usize;
        if count > self.limits.max_array_elements {
            return Err(NdrError::LimitExceeded {
                requested: count,
                limit: self.limits.max_array_elements,
            });
        }
        let needed = count.saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(NdrError::truncated(needed, self.remaining()));
        }
        Ok(count)
    }

    /// Read a value in full into a fresh placeholder
    pub fn read_value<T: NdrUnmarshal + Default>(&mut self) -> Result<T> {
        let mut value = T::default();
        self.read_value_into(&mut value)?;
        Ok(value)
    }

    /// Read a value in full into an existing placeholder
    pub fn read_value_into<T: NdrUnmarshal + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        value.unmarshal_preamble(self)?;
        value.unmarshal_entity(self)?;
        value.unmarshal_deferrals(self)
    }

    /// Read a top-level `[unique]` parameter: referent, then the pointee
    pub fn read_unique<T: NdrUnmarshal + Default>(&mut self) -> Result<Option<T>> {
        if self.read_referent()? {
            Ok(Some(self.read_value()?))
        } else {
            Ok(None)
        }
    }
}
