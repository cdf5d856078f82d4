//! Wire structure declarations
//!
//! `ndr_struct!` declares a plain structure and implements the three NDR
//! phases for it by running each phase across the fields in declaration
//! order. Every structure declared this way contains a 4-byte member, so it
//! is 4-aligned.

macro_rules! ndr_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl ::msrpc_ndr::NdrType for $name {
            const ALIGNMENT: ::msrpc_ndr::Alignment = ::msrpc_ndr::Alignment::Four;
        }

        impl ::msrpc_ndr::NdrMarshal for $name {
            fn marshal_preamble(&self, _w: &mut ::msrpc_ndr::NdrWriter) -> ::msrpc_ndr::Result<()> {
                $( ::msrpc_ndr::NdrMarshal::marshal_preamble(&self.$field, _w)?; )*
                Ok(())
            }

            fn marshal_entity(&self, w: &mut ::msrpc_ndr::NdrWriter) -> ::msrpc_ndr::Result<()> {
                w.align(::msrpc_ndr::Alignment::Four);
                $( ::msrpc_ndr::NdrMarshal::marshal_entity(&self.$field, w)?; )*
                Ok(())
            }

            fn marshal_deferrals(&self, _w: &mut ::msrpc_ndr::NdrWriter) -> ::msrpc_ndr::Result<()> {
                $( ::msrpc_ndr::NdrMarshal::marshal_deferrals(&self.$field, _w)?; )*
                Ok(())
            }
        }

        impl ::msrpc_ndr::NdrUnmarshal for $name {
            fn unmarshal_preamble(&mut self, _r: &mut ::msrpc_ndr::NdrReader) -> ::msrpc_ndr::Result<()> {
                $( ::msrpc_ndr::NdrUnmarshal::unmarshal_preamble(&mut self.$field, _r)?; )*
                Ok(())
            }

            fn unmarshal_entity(&mut self, r: &mut ::msrpc_ndr::NdrReader) -> ::msrpc_ndr::Result<()> {
                r.align(::msrpc_ndr::Alignment::Four)?;
                $( ::msrpc_ndr::NdrUnmarshal::unmarshal_entity(&mut self.$field, r)?; )*
                Ok(())
            }

            fn unmarshal_deferrals(&mut self, _r: &mut ::msrpc_ndr::NdrReader) -> ::msrpc_ndr::Result<()> {
                $( ::msrpc_ndr::NdrUnmarshal::unmarshal_deferrals(&mut self.$field, _r)?; )*
                Ok(())
            }
        }
    };
}

/// `[v1_enum]`-less IDL enums travel as 16-bit values
macro_rules! ndr_enum16 {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        pub enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            /// A value this client has no name for
            Other(u16),
        }

        impl $name {
            pub fn value(self) -> u16 {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Other(value) => value,
                }
            }
        }

        impl From<u16> for $name {
            fn from(value: u16) -> Self {
                match value {
                    $( $value => Self::$variant, )*
                    other => Self::Other(other),
                }
            }
        }

        impl ::msrpc_ndr::NdrType for $name {
            const ALIGNMENT: ::msrpc_ndr::Alignment = ::msrpc_ndr::Alignment::Two;
        }

        impl ::msrpc_ndr::NdrMarshal for $name {
            fn marshal_entity(&self, w: &mut ::msrpc_ndr::NdrWriter) -> ::msrpc_ndr::Result<()> {
                w.write_u16(self.value());
                Ok(())
            }
        }

        impl ::msrpc_ndr::NdrUnmarshal for $name {
            fn unmarshal_entity(&mut self, r: &mut ::msrpc_ndr::NdrReader) -> ::msrpc_ndr::Result<()> {
                *self = Self::from(r.read_u16()?);
                Ok(())
            }
        }
    };
}
