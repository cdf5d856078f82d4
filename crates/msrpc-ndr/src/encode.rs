//! NDR encoding traits
//!
//! A constructed NDR value is written in three phases:
//!
//! 1. **preamble**: conformance headers (`MaximumCount`) that NDR hoists to
//!    the front of the enclosing structure
//! 2. **entity**: the fixed-size inline representation; embedded pointers
//!    contribute only their referent ID
//! 3. **deferrals**: the pointees of the referents written in phase 2, in
//!    declaration order
//!
//! A caller driving several values (the members of a structure, the elements
//! of an array) must run one phase across all of them before starting the
//! next.

use crate::{Alignment, NdrWriter, Result};

/// Alignment declared by a wire type
pub trait NdrType {
    /// Boundary the entity representation is aligned to
    const ALIGNMENT: Alignment;
}

/// Trait for types that can be marshalled to NDR
pub trait NdrMarshal: NdrType {
    /// Write the conformance headers of this value, if any
    fn marshal_preamble(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Write the inline representation of this value
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()>;

    /// Write the data referenced from the entity, if any
    fn marshal_deferrals(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }
}

impl<T: NdrType + ?Sized> NdrType for &T {
    const ALIGNMENT: Alignment = T::ALIGNMENT;
}

impl<T: NdrMarshal + ?Sized> NdrMarshal for &T {
    fn marshal_preamble(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_preamble(w)
    }

    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_entity(w)
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).marshal_deferrals(w)
    }
}
