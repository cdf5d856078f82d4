//! NDR string types
//!
//! Two shapes of UTF-16 string appear on the wire:
//!
//! `RPC_UNICODE_STRING`, a counted string structure:
//! ```text
//! length: u16           # entity, bytes excluding any terminator
//! maximum_length: u16   # entity, bytes including any terminator
//! referent: u32         # entity
//! max_count, offset, actual_count: u32   # deferrals
//! units[actual_count]
//! ```
//!
//! and the `[string] wchar_t*` pointee, a NUL-terminated conformant varying
//! array of UTF-16 code units.
//!
//! In memory neither form ever holds the terminator.

use std::hash::{Hash, Hasher};

use crate::{
    Alignment, ConformantVaryingArray, NdrError, NdrMarshal, NdrReader, NdrType, NdrUnmarshal,
    NdrWriter, Result,
};

fn byte_length(units: usize) -> Result<u16> {
    units
        .checked_mul(2)
        .and_then(|bytes| u16::try_from(bytes).ok())
        .ok_or_else(|| {
            NdrError::InvalidArgument(format!("string of {units} code units is too long"))
        })
}

fn decode_units(mut units: Vec<u16>, terminated: bool) -> Result<String> {
    if terminated && units.last() == Some(&0) {
        units.pop();
    }
    Ok(String::from_utf16(&units)?)
}

/// `RPC_UNICODE_STRING`
///
/// `NUL` fixes at the type level whether a terminating zero unit is sent
/// with the characters (and counted in `MaximumLength` and the array counts,
/// but never in `Length`). Use the [`UnicodeString`] and
/// [`TerminatedUnicodeString`] aliases.
///
/// Equality and hashing look at `value` only.
#[derive(Debug, Clone, Default)]
pub struct RpcUnicodeString<const NUL: bool> {
    /// `None` encodes as a null buffer pointer
    pub value: Option<String>,
    /// `Length` as decoded, held until the deferred buffer is read
    length: u16,
}

/// `RPC_UNICODE_STRING` sent without a terminator
pub type UnicodeString = RpcUnicodeString<false>;

/// `RPC_UNICODE_STRING` sent with a terminating zero unit
pub type TerminatedUnicodeString = RpcUnicodeString<true>;

impl<const NUL: bool> RpcUnicodeString<NUL> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            length: 0,
        }
    }

    /// A string whose buffer pointer is null
    pub fn null() -> Self {
        Self {
            value: None,
            length: 0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The string, treating a null buffer as empty
    pub fn into_string(self) -> String {
        self.value.unwrap_or_default()
    }

    fn wire_units(value: &str) -> Vec<u16> {
        let mut units: Vec<u16> = value.encode_utf16().collect();
        if NUL {
            units.push(0);
        }
        units
    }
}

impl<const NUL: bool> From<&str> for RpcUnicodeString<NUL> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<const NUL: bool> From<String> for RpcUnicodeString<NUL> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<const NUL: bool> From<Option<String>> for RpcUnicodeString<NUL> {
    fn from(value: Option<String>) -> Self {
        Self { value, length: 0 }
    }
}

impl<const NUL: bool> PartialEq for RpcUnicodeString<NUL> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<const NUL: bool> Eq for RpcUnicodeString<NUL> {}

impl<const NUL: bool> Hash for RpcUnicodeString<NUL> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<const NUL: bool> NdrType for RpcUnicodeString<NUL> {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl<const NUL: bool> NdrMarshal for RpcUnicodeString<NUL> {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.align(Alignment::Four);
        match &self.value {
            Some(value) => {
                let units = value.encode_utf16().count();
                let length = byte_length(units)?;
                let maximum_length = byte_length(units + usize::from(NUL))?;
                w.write_u16(length);
                w.write_u16(maximum_length);
                w.write_referent(true);
            }
            None => {
                w.write_u16(0);
                w.write_u16(0);
                w.write_referent(false);
            }
        }
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.value {
            Some(value) => w.write_value(&ConformantVaryingArray::new(Self::wire_units(value))),
            None => Ok(()),
        }
    }
}

impl<const NUL: bool> NdrUnmarshal for RpcUnicodeString<NUL> {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        r.align(Alignment::Four)?;
        self.length = r.read_u16()?;
        let _maximum_length = r.read_u16()?;
        self.value = if r.read_referent()? {
            Some(String::new())
        } else {
            None
        };
        Ok(())
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        if self.value.is_none() {
            return Ok(());
        }
        // Length counts bytes; the buffer must hold at least that many
        let mut array = ConformantVaryingArray::<u16>::at_least((u32::from(self.length) + 1) / 2);
        r.read_value_into(&mut array)?;
        self.value = Some(decode_units(array.into_vec(), NUL)?);
        Ok(())
    }
}

/// Empty `RPC_UNICODE_STRING` offered to the server as an output buffer
///
/// Encodes `Length = 0`, `MaximumLength = 2 * capacity` and a present buffer
/// holding no characters. The server answers with a regular string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeStringBuffer {
    /// Capacity in UTF-16 code units
    pub capacity: u16,
}

impl UnicodeStringBuffer {
    pub fn new(capacity: u16) -> Self {
        Self { capacity }
    }
}

impl NdrType for UnicodeStringBuffer {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for UnicodeStringBuffer {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        let maximum_length = byte_length(usize::from(self.capacity))?;
        w.align(Alignment::Four);
        w.write_u16(0);
        w.write_u16(maximum_length);
        w.write_referent(true);
        Ok(())
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        let empty: ConformantVaryingArray<u16> =
            ConformantVaryingArray::with_max_count(u32::from(self.capacity), Vec::new());
        w.write_value(&empty)
    }
}

/// `[string] wchar_t*` pointee: a NUL-terminated UTF-16 string
///
/// Only ever appears behind a pointer, so its conformance count travels with
/// the body rather than being hoisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct WString(pub String);

impl WString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for WString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for WString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for WString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl NdrType for WString {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for WString {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        let mut units: Vec<u16> = self.0.encode_utf16().collect();
        units.push(0);
        w.write_value(&ConformantVaryingArray::new(units))
    }
}

impl NdrUnmarshal for WString {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        let array: ConformantVaryingArray<u16> = r.read_value()?;
        self.0 = decode_units(array.into_vec(), true)?;
        Ok(())
    }
}
