//! Security Account Manager (MS-SAMR)
//!
//! Account database access over `\pipe\samr`: server and domain handles,
//! enumeration of users, groups and aliases, name/RID lookups and alias
//! membership.

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
