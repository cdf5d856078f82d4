//! Server Service (MS-SRVS)
//!
//! Share and server information over `\pipe\srvsvc`.

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
