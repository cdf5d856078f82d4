//! `RPC_SID`
//!
//! Wire format:
//! ```text
//! sub_authority_count: u32   # preamble, conformance of the trailing array
//! revision: u8
//! sub_authority_count: u8
//! identifier_authority: [u8; 6]
//! sub_authorities[count]: u32
//! ```
//!
//! The two counts are written from the same list and must agree on decode.

use crate::{Alignment, NdrError, NdrMarshal, NdrReader, NdrType, NdrUnmarshal, NdrWriter, Result};
use std::fmt;
use std::str::FromStr;

/// Largest number of sub-authorities a SID may carry
pub const MAX_SUB_AUTHORITIES: usize = 15;

/// Well-known identifier authority `SECURITY_NT_AUTHORITY`
pub const NT_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 5];

/// Security identifier
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RpcSid {
    revision: u8,
    sub_authority_count: u8,
    identifier_authority: [u8; 6],
    sub_authorities: Vec<u32>,
    /// Conformance count read during the preamble phase
    conformance: u32,
}

impl RpcSid {
    /// Create a SID, deriving the count from the list
    pub fn new(revision: u8, identifier_authority: [u8; 6], sub_authorities: Vec<u32>) -> Result<Self> {
        let count = u8::try_from(sub_authorities.len()).map_err(|_| {
            NdrError::InvalidArgument(format!(
                "{} sub-authorities exceed the maximum of {}",
                sub_authorities.len(),
                MAX_SUB_AUTHORITIES
            ))
        })?;
        Self::from_parts(revision, count, &identifier_authority, sub_authorities)
    }

    /// Create a SID from its raw fields, checking them for consistency
    pub fn from_parts(
        revision: u8,
        sub_authority_count: u8,
        identifier_authority: &[u8],
        sub_authorities: Vec<u32>,
    ) -> Result<Self> {
        let identifier_authority: [u8; 6] = identifier_authority.try_into().map_err(|_| {
            NdrError::InvalidArgument(format!(
                "identifier authority must be 6 bytes, got {}",
                identifier_authority.len()
            ))
        })?;
        let sid = Self {
            revision,
            sub_authority_count,
            identifier_authority,
            conformance: sub_authorities.len() as u32,
            sub_authorities,
        };
        sid.validate().map_err(NdrError::InvalidArgument)?;
        Ok(sid)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if usize::from(self.sub_authority_count) != self.sub_authorities.len() {
            return Err(format!(
                "sub-authority count {} does not match {} sub-authorities",
                self.sub_authority_count,
                self.sub_authorities.len()
            ));
        }
        if self.sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(format!(
                "{} sub-authorities exceed the maximum of {}",
                self.sub_authorities.len(),
                MAX_SUB_AUTHORITIES
            ));
        }
        Ok(())
    }

    pub fn revision(&self) -> u8 {
        self.revision
    }

    pub fn sub_authority_count(&self) -> u8 {
        self.sub_authority_count
    }

    pub fn identifier_authority(&self) -> [u8; 6] {
        self.identifier_authority
    }

    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Relative identifier: the last sub-authority
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    /// Account SID formed by appending a relative identifier to this domain SID
    pub fn with_rid(&self, rid: u32) -> Result<Self> {
        let mut sub_authorities = self.sub_authorities.clone();
        sub_authorities.push(rid);
        Self::new(self.revision, self.identifier_authority, sub_authorities)
    }

    fn authority_value(&self) -> u64 {
        self.identifier_authority
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }
}

impl Default for RpcSid {
    fn default() -> Self {
        Self {
            revision: 1,
            sub_authority_count: 0,
            identifier_authority: [0; 6],
            sub_authorities: Vec::new(),
            conformance: 0,
        }
    }
}

impl fmt::Debug for RpcSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcSid")
            .field("revision", &self.revision)
            .field("sub_authority_count", &self.sub_authority_count)
            .field("identifier_authority", &self.identifier_authority)
            .field("sub_authorities", &self.sub_authorities)
            .finish()
    }
}

/// `S-1-5-21-...` form; authorities of 2^32 and above are printed in hex
impl fmt::Display for RpcSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authority = self.authority_value();
        if authority >> 32 == 0 {
            write!(f, "S-{}-{}", self.revision, authority)?;
        } else {
            write!(f, "S-{}-0x{:012X}", self.revision, authority)?;
        }
        for sub_authority in &self.sub_authorities {
            write!(f, "-{}", sub_authority)?;
        }
        Ok(())
    }
}

impl FromStr for RpcSid {
    type Err = NdrError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NdrError::InvalidArgument(format!("invalid SID string: {s:?}"));

        let mut parts = s.split('-');
        if !parts.next().is_some_and(|prefix| prefix.eq_ignore_ascii_case("S")) {
            return Err(invalid());
        }
        let revision = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(invalid)?;
        let authority = parts
            .next()
            .and_then(|p| match p.strip_prefix("0x").or_else(|| p.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => p.parse::<u64>().ok(),
            })
            .filter(|value| value >> 48 == 0)
            .ok_or_else(invalid)?;
        let sub_authorities = parts
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        let bytes = authority.to_be_bytes();
        let mut identifier_authority = [0u8; 6];
        identifier_authority.copy_from_slice(&bytes[2..]);
        Self::new(revision, identifier_authority, sub_authorities)
    }
}

impl NdrType for RpcSid {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for RpcSid {
    fn marshal_preamble(&self, w: &mut NdrWriter) -> Result<()> {
        self.validate().map_err(NdrError::InvalidArgument)?;
        w.write_u32(u32::from(self.sub_authority_count));
        Ok(())
    }

    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        self.validate().map_err(NdrError::InvalidArgument)?;
        w.align(Alignment::Four);
        w.write_u8(self.revision);
        w.write_u8(self.sub_authority_count);
        w.write_bytes(&self.identifier_authority);
        for sub_authority in &self.sub_authorities {
            w.write_u32(*sub_authority);
        }
        Ok(())
    }
}

impl NdrUnmarshal for RpcSid {
    fn unmarshal_preamble(&mut self, r: &mut NdrReader) -> Result<()> {
        self.conformance = r.read_u32()?;
        Ok(())
    }

    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        r.align(Alignment::Four)?;
        self.revision = r.read_u8()?;
        self.sub_authority_count = r.read_u8()?;
        self.identifier_authority = r.read_array()?;

        if u32::from(self.sub_authority_count) != self.conformance {
            return Err(NdrError::MalformedSid(format!(
                "sub-authority count {} does not match conformance {}",
                self.sub_authority_count, self.conformance
            )));
        }
        let count = usize::from(self.sub_authority_count);
        if count > MAX_SUB_AUTHORITIES {
            return Err(NdrError::MalformedSid(format!(
                "{count} sub-authorities exceed the maximum of {MAX_SUB_AUTHORITIES}"
            )));
        }
        let count = r.check_count(self.conformance, 4)?;
        self.sub_authorities = (0..count).map(|_| r.read_u32()).collect::<Result<_>>()?;
        self.validate().map_err(NdrError::MalformedSid)
    }
}
