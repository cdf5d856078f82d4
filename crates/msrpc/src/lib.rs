//! Typed MS-RPC client calls over NDR
//!
//! This crate provides request/response messages and thin client façades for
//! five Windows RPC interfaces:
//!
//! - [`lsa`]: Local Security Authority policy and name/SID translation
//! - [`samr`]: Security Account Manager domains, users, groups and aliases
//! - [`svcctl`]: Service Control Manager
//! - [`srvsvc`]: Server Service shares and server information
//! - [`winreg`]: Remote Registry
//!
//! Messages are encoded with [`msrpc_ndr`] and sent through any
//! [`RpcTransport`]: a bound connection that exchanges one request stub for
//! one response stub. The transport owns binding, PDU framing,
//! fragmentation and authentication.
//!
//! # Example
//!
//! ```no_run
//! use msrpc::lsa::{access, LsaClient};
//! # fn run(transport: impl msrpc::RpcTransport) -> msrpc::Result<()> {
//! let lsa = LsaClient::new(transport);
//! let policy = lsa.open_policy(None, access::POLICY_LOOKUP_NAMES)?;
//! for sid in lsa.enumerate_accounts_with_user_right(&policy, "SeBackupPrivilege")? {
//!     println!("{}", sid);
//! }
//! lsa.close(policy)?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod macros;

mod call;
mod error;
mod handles;
mod interface;
mod status;
mod transport;

pub mod lsa;
pub mod samr;
pub mod srvsvc;
pub mod svcctl;
pub mod winreg;

pub use call::{call, request_call, HandleResponse, RpcCall, RpcRequest};
pub use error::{Result, RpcError, TransportError};
pub use handles::HandleCache;
pub use interface::InterfaceId;
pub use status::{NtStatus, Win32Error};
pub use transport::{RpcTransport, StubRequest};

/// Re-export the NDR crate for message implementors
pub use msrpc_ndr as ndr;
