//! Context handles

use crate::{Alignment, NdrError, NdrMarshal, NdrReader, NdrType, NdrUnmarshal, NdrWriter, Result};
use std::fmt;

/// Size of a context handle on the wire
pub const CONTEXT_HANDLE_SIZE: usize = 20;

/// Opaque 20-byte token returned by an "open" call
///
/// The client never looks inside; it hands the bytes back on every call
/// against the opened resource until the matching close.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextHandle([u8; CONTEXT_HANDLE_SIZE]);

impl ContextHandle {
    pub const fn from_bytes(bytes: [u8; CONTEXT_HANDLE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CONTEXT_HANDLE_SIZE] {
        &self.0
    }

    /// True for the all-zero handle a server returns after a close
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl TryFrom<&[u8]> for ContextHandle {
    type Error = NdrError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; CONTEXT_HANDLE_SIZE] = bytes.try_into().map_err(|_| {
            NdrError::InvalidArgument(format!(
                "context handle must be {} bytes, got {}",
                CONTEXT_HANDLE_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; CONTEXT_HANDLE_SIZE]> for ContextHandle {
    fn from(bytes: [u8; CONTEXT_HANDLE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextHandle(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        f.write_str(")")
    }
}

impl NdrType for ContextHandle {
    const ALIGNMENT: Alignment = Alignment::One;
}

impl NdrMarshal for ContextHandle {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_bytes(&self.0);
        Ok(())
    }
}

impl NdrUnmarshal for ContextHandle {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0 = r.read_array()?;
        Ok(())
    }
}
