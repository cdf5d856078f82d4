//! Error types for RPC calls

use crate::status::{NtStatus, Win32Error};
use msrpc_ndr::NdrError;
use thiserror::Error;

/// Errors raised by an [`RpcTransport`](crate::RpcTransport)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("fault: status 0x{0:08x}")]
    Fault(u32),

    #[error("{0}")]
    Other(String),
}

/// RPC call errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("NDR error: {0}")]
    Ndr(#[from] NdrError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{operation} failed: {status}")]
    NtStatus {
        operation: &'static str,
        status: NtStatus,
    },

    #[error("{operation} failed: {error}")]
    Win32 {
        operation: &'static str,
        error: Win32Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RpcError {
    /// NT status carried by this error, if any
    pub fn nt_status(&self) -> Option<NtStatus> {
        match self {
            Self::NtStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Win32 error carried by this error, if any
    pub fn win32_error(&self) -> Option<Win32Error> {
        match self {
            Self::Win32 { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// Result type for RPC calls
pub type Result<T> = std::result::Result<T, RpcError>;

/// Reject a reply array that does not pair one-to-one with the request
pub(crate) fn check_reply_count(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RpcError::Ndr(NdrError::LengthMismatch {
            context,
            expected,
            actual,
        }));
    }
    Ok(())
}
