//! Interface identifiers for binding

use msrpc_ndr::Guid;
use std::fmt;

/// Abstract syntax of an RPC interface plus its well-known named pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId {
    pub uuid: Guid,
    pub version_major: u16,
    pub version_minor: u16,
    /// SMB named pipe the interface listens on, e.g. `\pipe\lsarpc`
    pub pipe_name: &'static str,
}

impl InterfaceId {
    pub const fn new(uuid: Guid, version_major: u16, version_minor: u16, pipe_name: &'static str) -> Self {
        Self {
            uuid,
            version_major,
            version_minor,
            pipe_name,
        }
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.version_major, self.version_minor)
    }
}
