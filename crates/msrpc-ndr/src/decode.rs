//! NDR decoding trait

use crate::{NdrReader, NdrType, Result};

/// Trait for types that can be unmarshalled from NDR
///
/// Decoding mirrors [`NdrMarshal`](crate::NdrMarshal) phase for phase. The
/// phases take `&mut self` because what an earlier phase reads (a referent,
/// a conformance count) decides what a later phase consumes; types are
/// decoded into a placeholder, usually their `Default`.
pub trait NdrUnmarshal: NdrType {
    /// Read the conformance headers of this value, if any
    fn unmarshal_preamble(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }

    /// Read the inline representation of this value
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()>;

    /// Read the data referenced from the entity, if any
    fn unmarshal_deferrals(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }
}
