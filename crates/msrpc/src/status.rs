//! Status codes returned in the trailing field of a response
//!
//! LSA and SAMR return `NTSTATUS`; SVCCTL, SRVSVC and WINREG return Win32
//! error codes. The call layer hands both back uninterpreted; the façades
//! turn failures into [`RpcError`](crate::RpcError).

use crate::error::{Result, RpcError};
use msrpc_ndr::{Alignment, NdrReader, NdrType, NdrUnmarshal};
use std::fmt;

/// `NTSTATUS` value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NtStatus(pub u32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0x0000_0000);
    pub const MORE_ENTRIES: Self = Self(0x0000_0105);
    pub const SOME_NOT_MAPPED: Self = Self(0x0000_0107);
    pub const NO_MORE_ENTRIES: Self = Self(0x8000_001A);
    pub const ACCESS_DENIED: Self = Self(0xC000_0022);
    pub const OBJECT_NAME_NOT_FOUND: Self = Self(0xC000_0034);
    pub const INVALID_HANDLE: Self = Self(0xC000_0008);
    pub const INVALID_PARAMETER: Self = Self(0xC000_000D);
    pub const NO_SUCH_DOMAIN: Self = Self(0xC000_00DF);
    pub const NO_SUCH_USER: Self = Self(0xC000_0064);
    pub const NONE_MAPPED: Self = Self(0xC000_0073);
    pub const INVALID_INFO_CLASS: Self = Self(0xC000_0003);

    /// Severity is success or informational
    pub fn is_success(self) -> bool {
        self.0 >> 30 <= 1
    }

    /// Severity is warning
    pub fn is_warning(self) -> bool {
        self.0 >> 30 == 2
    }

    /// Severity is error
    pub fn is_error(self) -> bool {
        self.0 >> 30 == 3
    }

    /// Fail with [`RpcError::NtStatus`] unless the status is `SUCCESS`
    pub fn check(self, operation: &'static str) -> Result<()> {
        if self == Self::SUCCESS {
            Ok(())
        } else {
            Err(RpcError::NtStatus {
                operation,
                status: self,
            })
        }
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "STATUS_SUCCESS",
            Self::MORE_ENTRIES => "STATUS_MORE_ENTRIES",
            Self::SOME_NOT_MAPPED => "STATUS_SOME_NOT_MAPPED",
            Self::NO_MORE_ENTRIES => "STATUS_NO_MORE_ENTRIES",
            Self::ACCESS_DENIED => "STATUS_ACCESS_DENIED",
            Self::OBJECT_NAME_NOT_FOUND => "STATUS_OBJECT_NAME_NOT_FOUND",
            Self::INVALID_HANDLE => "STATUS_INVALID_HANDLE",
            Self::INVALID_PARAMETER => "STATUS_INVALID_PARAMETER",
            Self::NO_SUCH_DOMAIN => "STATUS_NO_SUCH_DOMAIN",
            Self::NO_SUCH_USER => "STATUS_NO_SUCH_USER",
            Self::NONE_MAPPED => "STATUS_NONE_MAPPED",
            Self::INVALID_INFO_CLASS => "STATUS_INVALID_INFO_CLASS",
            _ => return None,
        })
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus(0x{:08x})", self.0)
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08x})", name, self.0),
            None => write!(f, "NTSTATUS 0x{:08x}", self.0),
        }
    }
}

impl NdrType for NtStatus {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrUnmarshal for NtStatus {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> msrpc_ndr::Result<()> {
        self.0 = r.read_u32()?;
        Ok(())
    }
}

/// Win32 error code
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Win32Error(pub u32);

impl Win32Error {
    pub const SUCCESS: Self = Self(0);
    pub const FILE_NOT_FOUND: Self = Self(2);
    pub const ACCESS_DENIED: Self = Self(5);
    pub const INVALID_HANDLE: Self = Self(6);
    pub const INVALID_PARAMETER: Self = Self(87);
    pub const INSUFFICIENT_BUFFER: Self = Self(122);
    pub const MORE_DATA: Self = Self(234);
    pub const NO_MORE_ITEMS: Self = Self(259);
    pub const SERVICE_REQUEST_TIMEOUT: Self = Self(1053);
    pub const DEPENDENT_SERVICES_RUNNING: Self = Self(1051);
    pub const SERVICE_ALREADY_RUNNING: Self = Self(1056);
    pub const SERVICE_DISABLED: Self = Self(1058);
    pub const SERVICE_DOES_NOT_EXIST: Self = Self(1060);
    pub const SERVICE_CANNOT_ACCEPT_CTRL: Self = Self(1061);
    pub const SERVICE_NOT_ACTIVE: Self = Self(1062);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Fail with [`RpcError::Win32`] unless the code is `ERROR_SUCCESS`
    pub fn check(self, operation: &'static str) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(RpcError::Win32 {
                operation,
                error: self,
            })
        }
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "ERROR_SUCCESS",
            Self::FILE_NOT_FOUND => "ERROR_FILE_NOT_FOUND",
            Self::ACCESS_DENIED => "ERROR_ACCESS_DENIED",
            Self::INVALID_HANDLE => "ERROR_INVALID_HANDLE",
            Self::INVALID_PARAMETER => "ERROR_INVALID_PARAMETER",
            Self::INSUFFICIENT_BUFFER => "ERROR_INSUFFICIENT_BUFFER",
            Self::MORE_DATA => "ERROR_MORE_DATA",
            Self::NO_MORE_ITEMS => "ERROR_NO_MORE_ITEMS",
            Self::SERVICE_REQUEST_TIMEOUT => "ERROR_SERVICE_REQUEST_TIMEOUT",
            Self::DEPENDENT_SERVICES_RUNNING => "ERROR_DEPENDENT_SERVICES_RUNNING",
            Self::SERVICE_ALREADY_RUNNING => "ERROR_SERVICE_ALREADY_RUNNING",
            Self::SERVICE_DISABLED => "ERROR_SERVICE_DISABLED",
            Self::SERVICE_DOES_NOT_EXIST => "ERROR_SERVICE_DOES_NOT_EXIST",
            Self::SERVICE_CANNOT_ACCEPT_CTRL => "ERROR_SERVICE_CANNOT_ACCEPT_CTRL",
            Self::SERVICE_NOT_ACTIVE => "ERROR_SERVICE_NOT_ACTIVE",
            _ => return None,
        })
    }
}

impl fmt::Debug for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Win32Error({})", self.0)
    }
}

impl fmt::Display for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "Win32 error {}", self.0),
        }
    }
}

impl NdrType for Win32Error {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrUnmarshal for Win32Error {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> msrpc_ndr::Result<()> {
        self.0 = r.read_u32()?;
        Ok(())
    }
}
