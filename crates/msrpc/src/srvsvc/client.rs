//! Server Service client

use super::protocol::*;
use crate::call::{call, RpcRequest};
use crate::error::{Result, RpcError};
use crate::status::Win32Error;
use crate::transport::RpcTransport;
use tracing::debug;

/// Server Service client
///
/// Calls name the server as `server_name` when one is set; servers accept a
/// null name as "this server".
pub struct ServerServiceClient<T> {
    transport: T,
    server_name: Option<String>,
}

impl<T: RpcTransport> ServerServiceClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            server_name: None,
        }
    }

    /// Name the server in every request, e.g. `\\FILESRV`
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Every share at `level`, following the resume handle to the end
    pub fn enumerate_shares(&self, level: ShareLevel) -> Result<Vec<ShareInfo>> {
        let mut shares = Vec::new();
        let mut resume_handle = 0;
        loop {
            let response = call(
                &self.transport,
                &NetrShareEnum {
                    server_name: self.server_name.clone(),
                    level,
                    prefered_maximum_length: MAX_PREFERRED_LENGTH,
                    resume_handle: Some(resume_handle),
                },
            )?;
            let more = response.error == Win32Error::MORE_DATA;
            if !more {
                response.error.check(NetrShareEnum::NAME)?;
            }
            shares.extend(response.info.into_shares());

            match (more, response.resume_handle) {
                (true, Some(next)) if next != resume_handle => {
                    debug!(
                        "{}: {} of {} shares, continuing",
                        NetrShareEnum::NAME,
                        shares.len(),
                        response.total_entries
                    );
                    resume_handle = next;
                }
                (true, _) => {
                    return Err(RpcError::InvalidArgument(format!(
                        "{} reported more data without advancing the resume handle",
                        NetrShareEnum::NAME
                    )))
                }
                (false, _) => return Ok(shares),
            }
        }
    }

    /// Names of every share
    pub fn share_names(&self) -> Result<Vec<String>> {
        Ok(self
            .enumerate_shares(ShareLevel::Level0)?
            .iter()
            .filter_map(|share| share.netname().map(str::to_owned))
            .collect())
    }

    /// Information about one share
    pub fn share_info(&self, net_name: &str, level: ShareLevel) -> Result<ShareInfo> {
        let response = call(
            &self.transport,
            &NetrShareGetInfo {
                server_name: self.server_name.clone(),
                net_name: net_name.to_owned(),
                level,
            },
        )?;
        response.error.check(NetrShareGetInfo::NAME)?;
        response.info.ok_or(RpcError::Win32 {
            operation: NetrShareGetInfo::NAME,
            error: Win32Error::FILE_NOT_FOUND,
        })
    }

    /// Information about the server itself
    pub fn server_info(&self, level: ServerLevel) -> Result<ServerInfo> {
        let response = call(
            &self.transport,
            &NetrServerGetInfo {
                server_name: self.server_name.clone(),
                level,
            },
        )?;
        response.error.check(NetrServerGetInfo::NAME)?;
        response.info.ok_or(RpcError::Win32 {
            operation: NetrServerGetInfo::NAME,
            error: Win32Error::INVALID_PARAMETER,
        })
    }
}
