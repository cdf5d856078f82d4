//! NDR output buffer
//!
//! The writer appends little-endian NDR to a `BytesMut`. Its position is the
//! offset from the start of the stub data and is only used to compute
//! alignment padding; the writer never seeks.

use crate::referent::ReferentRegistry;
use crate::{Alignment, NdrMarshal, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Append-only NDR encoder for one request stub
#[derive(Debug, Default)]
pub struct NdrWriter {
    buf: BytesMut,
    referents: ReferentRegistry,
}

impl NdrWriter {
    /// Create an empty writer positioned at the start of the stub
    pub fn new() -> Self {
        Self::default()
    }

    /// Current offset from the start of the stub
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Insert zero padding up to the given boundary
    pub fn align(&mut self, alignment: Alignment) {
        let padding = alignment.pad_to(self.position());
        self.buf.put_bytes(0, padding);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.align(Alignment::Two);
        self.buf.put_u16_le(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.align(Alignment::Two);
        self.buf.put_i16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.align(Alignment::Four);
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.align(Alignment::Four);
        self.buf.put_i32_le(value);
    }

    /// Write a run of raw bytes (alignment 1)
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write UTF-16 code units (alignment 2)
    pub fn write_utf16(&mut self, units: &[u16]) {
        self.align(Alignment::Two);
        for unit in units {
            self.buf.put_u16_le(*unit);
        }
    }

    /// Write an element count, rejecting counts that do not fit the wire field
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| {
            crate::NdrError::InvalidArgument(format!("count {count} does not fit in 32 bits"))
        })?;
        self.write_u32(count);
        Ok(())
    }

    /// Write the referent ID of a pointer that is present or null
    pub fn write_referent(&mut self, present: bool) {
        let id = self.referents.referent_for(present);
        self.write_u32(id);
    }

    /// Write a value in full: preamble, entity, then deferrals
    pub fn write_value<T: NdrMarshal + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.marshal_preamble(self)?;
        value.marshal_entity(self)?;
        value.marshal_deferrals(self)
    }

    /// Write a top-level `[unique]` parameter: referent, then the pointee
    pub fn write_unique<T: NdrMarshal>(&mut self, value: Option<&T>) -> Result<()> {
        self.write_referent(value.is_some());
        match value {
            Some(value) => self.write_value(value),
            None => Ok(()),
        }
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finish and return the stub
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}
