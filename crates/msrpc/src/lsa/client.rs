//! LSA client

use super::protocol::*;
use crate::call::{call, RpcRequest};
use crate::error::{check_reply_count, Result};
use crate::status::NtStatus;
use crate::transport::RpcTransport;
use msrpc_ndr::{ContextHandle, RpcSid};
use tracing::debug;

/// A name translated to a SID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTranslation {
    pub name: String,
    pub sid_type: SidNameUse,
    /// Name of the domain the account belongs to
    pub domain: Option<String>,
    /// `None` when the name could not be mapped
    pub sid: Option<RpcSid>,
}

/// A SID translated to a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidTranslation {
    pub sid: RpcSid,
    pub sid_type: SidNameUse,
    pub domain: Option<String>,
    /// `None` when the SID could not be mapped
    pub name: Option<String>,
}

/// LSA client
///
/// Wraps a transport bound to the lsarpc interface.
pub struct LsaClient<T> {
    transport: T,
}

impl<T: RpcTransport> LsaClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open the policy object
    pub fn open_policy(&self, system_name: Option<&str>, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &LsarOpenPolicy2 {
                system_name: system_name.map(str::to_owned),
                desired_access,
            },
        )?;
        response.status.check(LsarOpenPolicy2::NAME)?;
        debug!("Opened LSA policy: access=0x{:08x}", desired_access);
        Ok(response.handle)
    }

    /// Close a handle opened through this interface
    pub fn close(&self, handle: ContextHandle) -> Result<()> {
        let response = call(&self.transport, &LsarClose { handle })?;
        response.status.check(LsarClose::NAME)?;
        debug!("Closed LSA handle {:?}", handle);
        Ok(())
    }

    /// Query one class of policy information
    pub fn query_information(
        &self,
        policy: &ContextHandle,
        information_class: PolicyInformationClass,
    ) -> Result<Option<PolicyInformation>> {
        let response = call(
            &self.transport,
            &LsarQueryInformationPolicy {
                policy: *policy,
                information_class,
            },
        )?;
        response.status.check(LsarQueryInformationPolicy::NAME)?;
        Ok(response.information)
    }

    /// Name and SID of the machine's account domain
    pub fn account_domain(&self, policy: &ContextHandle) -> Result<Option<DomainInfo>> {
        Ok(
            match self.query_information(policy, PolicyInformationClass::AccountDomain)? {
                Some(PolicyInformation::AccountDomain(info)) => Some(info),
                _ => None,
            },
        )
    }

    /// Translate account names to SIDs
    ///
    /// Names that do not map come back with `sid: None`. Fails only when
    /// none of the names map.
    pub fn lookup_names(&self, policy: &ContextHandle, names: &[&str]) -> Result<Vec<NameTranslation>> {
        let request = LsarLookupNames {
            policy: *policy,
            names: names.iter().map(|name| name.to_string()).collect(),
            lookup_level: LookupLevel::Workstation,
        };
        let response = call(&self.transport, &request)?;
        if response.status != NtStatus::SOME_NOT_MAPPED {
            response.status.check(LsarLookupNames::NAME)?;
        }
        check_reply_count(
            "LsarLookupNames TranslatedSids",
            request.names.len(),
            response.translated_sids.len(),
        )?;

        let domains = response.referenced_domains.unwrap_or_default();
        let mut translations = Vec::with_capacity(names.len());
        for (name, translated) in request.names.into_iter().zip(response.translated_sids) {
            let domain = domains.get(translated.domain_index);
            let domain_sid = domain.and_then(|d| d.sid.as_ref());
            let sid = match (translated.sid_type, domain_sid) {
                (SidNameUse::Domain, Some(sid)) => Some(sid.clone()),
                (SidNameUse::Unknown | SidNameUse::Invalid, _) | (_, None) => None,
                (_, Some(sid)) => Some(sid.with_rid(translated.relative_id)?),
            };
            translations.push(NameTranslation {
                name,
                sid_type: translated.sid_type,
                domain: domain.and_then(|d| d.name.value.clone()),
                sid,
            });
        }
        Ok(translations)
    }

    /// Translate SIDs to account names
    pub fn lookup_sids(&self, policy: &ContextHandle, sids: &[RpcSid]) -> Result<Vec<SidTranslation>> {
        let request = LsarLookupSids {
            policy: *policy,
            sids: sids.to_vec(),
            lookup_level: LookupLevel::Workstation,
        };
        let response = call(&self.transport, &request)?;
        if response.status != NtStatus::SOME_NOT_MAPPED {
            response.status.check(LsarLookupSids::NAME)?;
        }
        check_reply_count(
            "LsarLookupSids TranslatedNames",
            request.sids.len(),
            response.translated_names.len(),
        )?;

        let domains = response.referenced_domains.unwrap_or_default();
        Ok(request
            .sids
            .into_iter()
            .zip(response.translated_names)
            .map(|(sid, translated)| {
                let mapped = !matches!(
                    translated.sid_type,
                    SidNameUse::Unknown | SidNameUse::Invalid
                );
                SidTranslation {
                    sid,
                    sid_type: translated.sid_type,
                    domain: domains
                        .get(translated.domain_index)
                        .and_then(|d| d.name.value.clone()),
                    name: translated.name.value.filter(|_| mapped),
                }
            })
            .collect())
    }

    /// SIDs of the accounts holding a privilege or right
    ///
    /// A right nobody holds yields an empty list.
    pub fn enumerate_accounts_with_user_right(
        &self,
        policy: &ContextHandle,
        user_right: &str,
    ) -> Result<Vec<RpcSid>> {
        let response = call(
            &self.transport,
            &LsarEnumerateAccountsWithUserRight {
                policy: *policy,
                user_right: Some(user_right.to_owned()),
            },
        )?;
        if response.status == NtStatus::NO_MORE_ENTRIES {
            return Ok(Vec::new());
        }
        response
            .status
            .check(LsarEnumerateAccountsWithUserRight::NAME)?;
        Ok(response.accounts.unwrap_or_default())
    }
}
