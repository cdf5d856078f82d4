//! NDR primitive type implementations
//!
//! | IDL Type       | Rust Type | Size | Alignment |
//! |----------------|-----------|------|-----------|
//! | boolean/BOOLEAN| bool      | 1    | 1         |
//! | byte/char      | u8        | 1    | 1         |
//! | small          | i8        | 1    | 1         |
//! | short          | i16       | 2    | 2         |
//! | unsigned short | u16       | 2    | 2         |
//! | wchar_t        | u16       | 2    | 2         |
//! | long           | i32       | 4    | 4         |
//! | unsigned long  | u32       | 4    | 4         |
//! | GUID           | Guid      | 16   | 4         |
//!
//! Primitives have no preamble and no deferrals.

use crate::{Alignment, NdrMarshal, NdrReader, NdrType, NdrUnmarshal, NdrWriter, Result};

macro_rules! impl_ndr_primitive {
    ($ty:ty, $align:expr, $write:ident, $read:ident) => {
        impl NdrType for $ty {
            const ALIGNMENT: Alignment = $align;
        }

        impl NdrMarshal for $ty {
            fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
                w.$write(*self);
                Ok(())
            }
        }

        impl NdrUnmarshal for $ty {
            fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
                *self = r.$read()?;
                Ok(())
            }
        }
    };
}

impl_ndr_primitive!(u8, Alignment::One, write_u8, read_u8);
impl_ndr_primitive!(i8, Alignment::One, write_i8, read_i8);
impl_ndr_primitive!(u16, Alignment::Two, write_u16, read_u16);
impl_ndr_primitive!(i16, Alignment::Two, write_i16, read_i16);
impl_ndr_primitive!(u32, Alignment::Four, write_u32, read_u32);
impl_ndr_primitive!(i32, Alignment::Four, write_i32, read_i32);

/// NDR boolean - a single byte, any non-zero value is true
impl NdrType for bool {
    const ALIGNMENT: Alignment = Alignment::One;
}

impl NdrMarshal for bool {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u8(u8::from(*self));
        Ok(())
    }
}

impl NdrUnmarshal for bool {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        *self = r.read_u8()? != 0;
        Ok(())
    }
}

/// GUID as laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Nil GUID
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 || parts[4].len() != 12 {
            return None;
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;

        let mut data4 = [0u8; 8];
        data4[..2].copy_from_slice(&clock.to_be_bytes());
        for i in 0..6 {
            data4[2 + i] = u8::from_str_radix(parts[4].get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-",
            self.data1, self.data2, self.data3, self.data4[0], self.data4[1],
        )?;
        for byte in &self.data4[2..] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl NdrType for Guid {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for Guid {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u32(self.data1);
        w.write_u16(self.data2);
        w.write_u16(self.data3);
        w.write_bytes(&self.data4);
        Ok(())
    }
}

impl NdrUnmarshal for Guid {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        self.data1 = r.read_u32()?;
        self.data2 = r.read_u16()?;
        self.data3 = r.read_u16()?;
        self.data4 = r.read_array()?;
        Ok(())
    }
}
