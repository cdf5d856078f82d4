//! Local Security Authority (MS-LSAD, MS-LSAT)
//!
//! Policy access and name/SID translation over `\pipe\lsarpc`:
//! - LsarOpenPolicy2 / LsarClose - Policy handle lifetime
//! - LsarQueryInformationPolicy - Domain and audit information
//! - LsarLookupNames / LsarLookupSids - Translation
//! - LsarEnumerateAccountsWithUserRight - Privilege holders

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
