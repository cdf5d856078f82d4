//! Remote Registry (MS-RRP)
//!
//! Key and value access over `\pipe\winreg`:
//! - OpenClassesRoot / OpenCurrentUser / OpenLocalMachine / OpenUsers - Root keys
//! - BaseRegOpenKey / BaseRegCloseKey - Key handle lifetime
//! - BaseRegEnumKey / BaseRegEnumValue - Enumeration
//! - BaseRegQueryValue / BaseRegQueryInfoKey - Value data and key metadata

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
