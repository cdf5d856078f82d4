//! Service Control Manager (MS-SCMR)
//!
//! Service handles and status over `\pipe\svcctl`:
//! - ROpenSCManagerW / ROpenServiceW / RCloseServiceHandle - Handle lifetime
//! - RQueryServiceStatus / RQueryServiceConfigW - Inspection
//! - RStartServiceW / RControlService - Start, stop and other controls

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
