//! SAMR client

use super::protocol::*;
use crate::call::{call, RpcRequest};
use crate::error::{check_reply_count, Result, RpcError};
use crate::handles::HandleCache;
use crate::lsa::SidNameUse;
use crate::status::NtStatus;
use crate::transport::RpcTransport;
use msrpc_ndr::{ContextHandle, RpcSid};
use tracing::debug;

/// Preferred maximum length passed to the enumeration calls
const ENUMERATION_BUFFER: u32 = 0xffff;

/// SAMR carries SID_NAME_USE as a u32; values past u16 cannot be a known use
fn sid_name_use(value: u32) -> SidNameUse {
    u16::try_from(value).map_or(SidNameUse::Other(u16::MAX), SidNameUse::from)
}

/// An account name resolved within a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAccount {
    pub name: String,
    pub relative_id: u32,
    pub sid_type: SidNameUse,
}

/// SAMR client
///
/// Domain handles opened through [`open_domain_by_name`](Self::open_domain_by_name)
/// are cached by domain name and released by [`close_all`](Self::close_all).
pub struct SamrClient<T> {
    transport: T,
    domains: HandleCache,
}

impl<T: RpcTransport> SamrClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            domains: HandleCache::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect to the SAM server object
    pub fn connect(&self, server_name: Option<&str>, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &SamrConnect2 {
                server_name: server_name.map(str::to_owned),
                desired_access,
            },
        )?;
        response.status.check(SamrConnect2::NAME)?;
        debug!("Connected to SAM server: access=0x{:08x}", desired_access);
        Ok(response.handle)
    }

    /// Close any SAM handle
    pub fn close(&self, handle: ContextHandle) -> Result<()> {
        let response = call(&self.transport, &SamrCloseHandle { handle })?;
        response.status.check(SamrCloseHandle::NAME)?;
        debug!("Closed SAM handle {:?}", handle);
        Ok(())
    }

    /// Close every cached domain handle
    pub fn close_all(&self) -> Result<()> {
        let mut first_error = None;
        for (name, handle) in self.domains.drain() {
            debug!("Closing cached domain handle: {}", name);
            if let Err(err) = self.close(handle) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// SID of a domain hosted by the server
    pub fn lookup_domain(&self, server: &ContextHandle, name: &str) -> Result<RpcSid> {
        let response = call(
            &self.transport,
            &SamrLookupDomainInSamServer {
                server: *server,
                name: name.to_owned(),
            },
        )?;
        response.status.check(SamrLookupDomainInSamServer::NAME)?;
        response.domain_id.ok_or(RpcError::NtStatus {
            operation: SamrLookupDomainInSamServer::NAME,
            status: NtStatus::NO_SUCH_DOMAIN,
        })
    }

    /// Names of the domains hosted by the server
    pub fn enumerate_domains(&self, server: &ContextHandle) -> Result<Vec<String>> {
        let entries = self.enumerate(SamrEnumerateDomainsInSamServer::NAME, |context| {
            call(
                &self.transport,
                &SamrEnumerateDomainsInSamServer {
                    server: *server,
                    enumeration_context: context,
                    prefered_maximum_length: ENUMERATION_BUFFER,
                },
            )
        })?;
        Ok(entries.into_iter().map(|entry| entry.name.into_string()).collect())
    }

    /// Open a domain by SID
    pub fn open_domain(&self, server: &ContextHandle, domain_id: &RpcSid, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &SamrOpenDomain {
                server: *server,
                desired_access,
                domain_id: domain_id.clone(),
            },
        )?;
        response.status.check(SamrOpenDomain::NAME)?;
        debug!("Opened domain {}", domain_id);
        Ok(response.handle)
    }

    /// Open a domain by name, reusing a cached handle when there is one
    pub fn open_domain_by_name(&self, server: &ContextHandle, name: &str, desired_access: u32) -> Result<ContextHandle> {
        let key = name.to_ascii_uppercase();
        self.domains.get_or_open(&key, || {
            let domain_id = self.lookup_domain(server, name)?;
            self.open_domain(server, &domain_id, desired_access)
        })
    }

    /// Users in a domain, optionally filtered by account control bits
    pub fn enumerate_users(&self, domain: &ContextHandle, user_account_control: u32) -> Result<Vec<RidEnumeration>> {
        self.enumerate(SamrEnumerateUsersInDomain::NAME, |context| {
            call(
                &self.transport,
                &SamrEnumerateUsersInDomain {
                    domain: *domain,
                    enumeration_context: context,
                    user_account_control,
                    prefered_maximum_length: ENUMERATION_BUFFER,
                },
            )
        })
    }

    /// Global groups in a domain
    pub fn enumerate_groups(&self, domain: &ContextHandle) -> Result<Vec<RidEnumeration>> {
        self.enumerate(SamrEnumerateGroupsInDomain::NAME, |context| {
            call(
                &self.transport,
                &SamrEnumerateGroupsInDomain {
                    domain: *domain,
                    enumeration_context: context,
                    prefered_maximum_length: ENUMERATION_BUFFER,
                },
            )
        })
    }

    /// Aliases (local groups) in a domain
    pub fn enumerate_aliases(&self, domain: &ContextHandle) -> Result<Vec<RidEnumeration>> {
        self.enumerate(SamrEnumerateAliasesInDomain::NAME, |context| {
            call(
                &self.transport,
                &SamrEnumerateAliasesInDomain {
                    domain: *domain,
                    enumeration_context: context,
                    prefered_maximum_length: ENUMERATION_BUFFER,
                },
            )
        })
    }

    /// Follow an enumeration context until the server reports completion
    fn enumerate<F>(&self, operation: &'static str, mut fetch: F) -> Result<Vec<RidEnumeration>>
    where
        F: FnMut(u32) -> Result<EnumerationResponse>,
    {
        let mut context = 0;
        let mut entries = Vec::new();
        loop {
            let response = fetch(context)?;
            entries.extend(response.entries);
            if response.status == NtStatus::MORE_ENTRIES {
                if response.enumeration_context == context {
                    return Err(RpcError::InvalidArgument(format!(
                        "{} reported more entries without advancing the enumeration context",
                        operation
                    )));
                }
                context = response.enumeration_context;
                debug!("{}: {} entries so far, continuing", operation, entries.len());
                continue;
            }
            response.status.check(operation)?;
            return Ok(entries);
        }
    }

    /// Resolve account names within a domain
    pub fn lookup_names(&self, domain: &ContextHandle, names: &[&str]) -> Result<Vec<DomainAccount>> {
        let request = SamrLookupNamesInDomain {
            domain: *domain,
            names: names.iter().map(|name| name.to_string()).collect(),
        };
        let response = call(&self.transport, &request)?;
        if response.status != NtStatus::SOME_NOT_MAPPED {
            response.status.check(SamrLookupNamesInDomain::NAME)?;
        }
        check_reply_count(
            "SamrLookupNamesInDomain RelativeIds",
            request.names.len(),
            response.relative_ids.len(),
        )?;
        check_reply_count(
            "SamrLookupNamesInDomain Use",
            request.names.len(),
            response.uses.len(),
        )?;
        Ok(request
            .names
            .into_iter()
            .zip(response.relative_ids)
            .zip(response.uses)
            .map(|((name, relative_id), sid_type)| DomainAccount {
                name,
                relative_id,
                sid_type: sid_name_use(sid_type),
            })
            .collect())
    }

    /// Resolve relative IDs within a domain; unmapped IDs are skipped
    pub fn lookup_ids(&self, domain: &ContextHandle, relative_ids: &[u32]) -> Result<Vec<DomainAccount>> {
        let response = call(
            &self.transport,
            &SamrLookupIdsInDomain {
                domain: *domain,
                relative_ids: relative_ids.to_vec(),
            },
        )?;
        if response.status != NtStatus::SOME_NOT_MAPPED {
            response.status.check(SamrLookupIdsInDomain::NAME)?;
        }
        check_reply_count(
            "SamrLookupIdsInDomain Names",
            relative_ids.len(),
            response.names.len(),
        )?;
        check_reply_count(
            "SamrLookupIdsInDomain Use",
            relative_ids.len(),
            response.uses.len(),
        )?;
        Ok(relative_ids
            .iter()
            .zip(response.names)
            .zip(response.uses)
            .filter_map(|((relative_id, name), sid_type)| {
                Some(DomainAccount {
                    name: name?,
                    relative_id: *relative_id,
                    sid_type: sid_name_use(sid_type),
                })
            })
            .collect())
    }

    pub fn open_user(&self, domain: &ContextHandle, relative_id: u32, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &SamrOpenUser {
                domain: *domain,
                desired_access,
                relative_id,
            },
        )?;
        response.status.check(SamrOpenUser::NAME)?;
        debug!("Opened user {}", relative_id);
        Ok(response.handle)
    }

    pub fn open_group(&self, domain: &ContextHandle, relative_id: u32, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &SamrOpenGroup {
                domain: *domain,
                desired_access,
                relative_id,
            },
        )?;
        response.status.check(SamrOpenGroup::NAME)?;
        debug!("Opened group {}", relative_id);
        Ok(response.handle)
    }

    pub fn open_alias(&self, domain: &ContextHandle, relative_id: u32, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &SamrOpenAlias {
                domain: *domain,
                desired_access,
                relative_id,
            },
        )?;
        response.status.check(SamrOpenAlias::NAME)?;
        debug!("Opened alias {}", relative_id);
        Ok(response.handle)
    }

    /// SIDs of an alias's members
    pub fn alias_members(&self, alias: &ContextHandle) -> Result<Vec<RpcSid>> {
        let response = call(&self.transport, &SamrGetMembersInAlias { alias: *alias })?;
        response.status.check(SamrGetMembersInAlias::NAME)?;
        Ok(response.members)
    }
}
