//! NDR pointer types
//!
//! NDR has three pointer flavours:
//!
//! - Reference (`[ref]`): never null and has no wire representation; the
//!   pointee is encoded where the pointer would be. Plain values model these.
//! - Unique (`[unique]`): nullable, a 4-byte referent ID with the pointee
//!   deferred. `Option<T>` models these when embedded in a structure.
//! - Full (`[ptr]`): unique plus aliasing. None of the interfaces here send
//!   aliased pointers, so full pointers are encoded as unique ones.
//!
//! For top-level parameters use [`NdrWriter::write_unique`] and
//! [`NdrReader::read_unique`], which write the pointee straight after the
//! referent.

use crate::{Alignment, NdrMarshal, NdrReader, NdrType, NdrUnmarshal, NdrWriter, Result};

impl<T> NdrType for Option<T> {
    const ALIGNMENT: Alignment = Alignment::Four;
}

/// Embedded unique pointer: the referent inline, the pointee deferred
impl<T: NdrMarshal> NdrMarshal for Option<T> {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_referent(self.is_some());
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        match self {
            Some(pointee) => w.write_value(pointee),
            None => Ok(()),
        }
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for Option<T> {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        *self = if r.read_referent()? {
            Some(T::default())
        } else {
            None
        };
        Ok(())
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        match self {
            Some(pointee) => r.read_value_into(pointee),
            None => Ok(()),
        }
    }
}
