//! NDR (Network Data Representation) marshalling for MS-RPC clients
//!
//! This crate implements the subset of NDR20 that the LSA, SAMR, SVCCTL,
//! SRVSVC and WINREG interfaces use, little-endian throughout.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2 or 4 bytes)
//! - Structures align to their most strictly aligned member
//! - Embedded pointers are 4-byte referent IDs; 0 means null
//! - Pointees and conformant data are deferred until the referencing
//!   structure is complete
//!
//! Every wire type implements [`NdrMarshal`] and [`NdrUnmarshal`] as three
//! phases: preamble, entity and deferrals.

mod alignment;
mod arrays;
mod decode;
mod encode;
mod error;
mod handle;
mod pointers;
mod primitives;
mod reader;
mod referent;
mod sid;
mod strings;
mod writer;

pub use alignment::Alignment;
pub use arrays::{ConformantArray, ConformantVaryingArray, CountedArray};
pub use decode::NdrUnmarshal;
pub use encode::{NdrMarshal, NdrType};
pub use error::{NdrError, Result};
pub use handle::{ContextHandle, CONTEXT_HANDLE_SIZE};
pub use primitives::Guid;
pub use reader::{NdrLimits, NdrReader, DEFAULT_MAX_ARRAY_ELEMENTS};
pub use referent::{ReferentRegistry, FIRST_REFERENT, NULL_REFERENT};
pub use sid::{RpcSid, MAX_SUB_AUTHORITIES, NT_AUTHORITY};
pub use strings::{RpcUnicodeString, TerminatedUnicodeString, UnicodeString, UnicodeStringBuffer, WString};
pub use writer::NdrWriter;

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
