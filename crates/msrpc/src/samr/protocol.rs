//! SAMR wire protocol (MS-SAMR)

use crate::call::{HandleResponse, RpcRequest};
use crate::interface::InterfaceId;
use crate::status::NtStatus;
use msrpc_ndr::{
    ConformantVaryingArray, ContextHandle, CountedArray, Guid, NdrError, NdrReader, NdrWriter,
    Result, RpcSid, UnicodeString, WString,
};

/// samr interface
pub const INTERFACE: InterfaceId = InterfaceId::new(
    Guid::new(0x1234_5778, 0x1234, 0xabcd, [0xef, 0x00, 0x01, 0x23, 0x45, 0x67, 0x89, 0xac]),
    1,
    0,
    "\\pipe\\samr",
);

/// Operation numbers for samr
pub mod opnum {
    pub const CLOSE_HANDLE: u16 = 1;
    pub const LOOKUP_DOMAIN_IN_SAM_SERVER: u16 = 5;
    pub const ENUMERATE_DOMAINS_IN_SAM_SERVER: u16 = 6;
    pub const OPEN_DOMAIN: u16 = 7;
    pub const ENUMERATE_GROUPS_IN_DOMAIN: u16 = 11;
    pub const ENUMERATE_USERS_IN_DOMAIN: u16 = 13;
    pub const ENUMERATE_ALIASES_IN_DOMAIN: u16 = 15;
    pub const LOOKUP_NAMES_IN_DOMAIN: u16 = 17;
    pub const LOOKUP_IDS_IN_DOMAIN: u16 = 18;
    pub const OPEN_GROUP: u16 = 19;
    pub const OPEN_ALIAS: u16 = 27;
    pub const GET_MEMBERS_IN_ALIAS: u16 = 33;
    pub const OPEN_USER: u16 = 34;
    pub const CONNECT2: u16 = 57;
}

/// Object access rights (MS-SAMR 2.2.1)
pub mod access {
    pub const SAM_SERVER_CONNECT: u32 = 0x0000_0001;
    pub const SAM_SERVER_ENUMERATE_DOMAINS: u32 = 0x0000_0010;
    pub const SAM_SERVER_LOOKUP_DOMAIN: u32 = 0x0000_0020;

    pub const DOMAIN_READ_PASSWORD_PARAMETERS: u32 = 0x0000_0001;
    pub const DOMAIN_READ_OTHER_PARAMETERS: u32 = 0x0000_0004;
    pub const DOMAIN_LIST_ACCOUNTS: u32 = 0x0000_0100;
    pub const DOMAIN_LOOKUP: u32 = 0x0000_0200;

    pub const GROUP_READ_INFORMATION: u32 = 0x0000_0001;
    pub const GROUP_LIST_MEMBERS: u32 = 0x0000_0010;

    pub const ALIAS_LIST_MEMBERS: u32 = 0x0000_0004;
    pub const ALIAS_READ_INFORMATION: u32 = 0x0000_0008;

    pub const USER_READ_GENERAL: u32 = 0x0000_0001;
    pub const USER_READ_ACCOUNT: u32 = 0x0000_0010;
    pub const USER_LIST_GROUPS: u32 = 0x0000_0100;

    pub const MAXIMUM_ALLOWED: u32 = 0x0200_0000;
}

/// `UserAccountControl` filter bits for SamrEnumerateUsersInDomain
pub mod account_control {
    pub const USER_ACCOUNT_DISABLED: u32 = 0x0000_0001;
    pub const USER_NORMAL_ACCOUNT: u32 = 0x0000_0010;
    pub const USER_INTERDOMAIN_TRUST_ACCOUNT: u32 = 0x0000_0040;
    pub const USER_WORKSTATION_TRUST_ACCOUNT: u32 = 0x0000_0080;
    pub const USER_SERVER_TRUST_ACCOUNT: u32 = 0x0000_0100;
}

/// Largest name or RID count the lookup calls accept
pub const MAX_LOOKUP_COUNT: usize = 1000;

ndr_struct! {
    /// `SAMPR_RID_ENUMERATION`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct RidEnumeration {
        pub relative_id: u32,
        pub name: UnicodeString,
    }
}

/// Response of the SamrEnumerate* calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationResponse {
    /// Resume handle for the next call
    pub enumeration_context: u32,
    pub entries: Vec<RidEnumeration>,
    pub count_returned: u32,
    /// `STATUS_MORE_ENTRIES` while entries remain
    pub status: NtStatus,
}

impl EnumerationResponse {
    fn read(r: &mut NdrReader) -> Result<Self> {
        let enumeration_context = r.read_u32()?;
        let buffer: Option<CountedArray<RidEnumeration>> = r.read_unique()?;
        Ok(Self {
            enumeration_context,
            entries: buffer.map(CountedArray::into_vec).unwrap_or_default(),
            count_returned: r.read_u32()?,
            status: r.read_value()?,
        })
    }
}

fn check_lookup_count(count: usize) -> Result<()> {
    if count > MAX_LOOKUP_COUNT {
        return Err(NdrError::InvalidArgument(format!(
            "{count} entries exceed the lookup maximum of {MAX_LOOKUP_COUNT}"
        )));
    }
    Ok(())
}

/// SamrConnect2
#[derive(Debug, Clone)]
pub struct SamrConnect2 {
    pub server_name: Option<String>,
    pub desired_access: u32,
}

impl RpcRequest for SamrConnect2 {
    const OPNUM: u16 = opnum::CONNECT2;
    const NAME: &'static str = "SamrConnect2";
    type Response = HandleResponse<NtStatus>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let server_name = self.server_name.as_deref().map(WString::from);
        w.write_unique(server_name.as_ref())?;
        w.write_u32(self.desired_access);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// SamrCloseHandle
#[derive(Debug, Clone, Copy)]
pub struct SamrCloseHandle {
    pub handle: ContextHandle,
}

impl RpcRequest for SamrCloseHandle {
    const OPNUM: u16 = opnum::CLOSE_HANDLE;
    const NAME: &'static str = "SamrCloseHandle";
    type Response = HandleResponse<NtStatus>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.handle)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// SamrLookupDomainInSamServer
#[derive(Debug, Clone)]
pub struct SamrLookupDomainInSamServer {
    pub server: ContextHandle,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupDomainResponse {
    pub domain_id: Option<RpcSid>,
    pub status: NtStatus,
}

impl RpcRequest for SamrLookupDomainInSamServer {
    const OPNUM: u16 = opnum::LOOKUP_DOMAIN_IN_SAM_SERVER;
    const NAME: &'static str = "SamrLookupDomainInSamServer";
    type Response = LookupDomainResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.server)?;
        w.write_value(&UnicodeString::new(self.name.as_str()))
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        Ok(LookupDomainResponse {
            domain_id: r.read_unique()?,
            status: r.read_value()?,
        })
    }
}

/// SamrEnumerateDomainsInSamServer
#[derive(Debug, Clone, Copy)]
pub struct SamrEnumerateDomainsInSamServer {
    pub server: ContextHandle,
    pub enumeration_context: u32,
    pub prefered_maximum_length: u32,
}

impl RpcRequest for SamrEnumerateDomainsInSamServer {
    const OPNUM: u16 = opnum::ENUMERATE_DOMAINS_IN_SAM_SERVER;
    const NAME: &'static str = "SamrEnumerateDomainsInSamServer";
    type Response = EnumerationResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.server)?;
        w.write_u32(self.enumeration_context);
        w.write_u32(self.prefered_maximum_length);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        EnumerationResponse::read(r)
    }
}

/// SamrOpenDomain
#[derive(Debug, Clone)]
pub struct SamrOpenDomain {
    pub server: ContextHandle,
    pub desired_access: u32,
    pub domain_id: RpcSid,
}

impl RpcRequest for SamrOpenDomain {
    const OPNUM: u16 = opnum::OPEN_DOMAIN;
    const NAME: &'static str = "SamrOpenDomain";
    type Response = HandleResponse<NtStatus>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.server)?;
        w.write_u32(self.desired_access);
        w.write_value(&self.domain_id)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// SamrEnumerateGroupsInDomain
#[derive(Debug, Clone, Copy)]
pub struct SamrEnumerateGroupsInDomain {
    pub domain: ContextHandle,
    pub enumeration_context: u32,
    pub prefered_maximum_length: u32,
}

impl RpcRequest for SamrEnumerateGroupsInDomain {
    const OPNUM: u16 = opnum::ENUMERATE_GROUPS_IN_DOMAIN;
    const NAME: &'static str = "SamrEnumerateGroupsInDomain";
    type Response = EnumerationResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.domain)?;
        w.write_u32(self.enumeration_context);
        w.write_u32(self.prefered_maximum_length);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        EnumerationResponse::read(r)
    }
}

/// SamrEnumerateUsersInDomain
#[derive(Debug, Clone, Copy)]
pub struct SamrEnumerateUsersInDomain {
    pub domain: ContextHandle,
    pub enumeration_context: u32,
    /// Bits from [`account_control`]; 0 returns every account
    pub user_account_control: u32,
    pub prefered_maximum_length: u32,
}

impl RpcRequest for SamrEnumerateUsersInDomain {
    const OPNUM: u16 = opnum::ENUMERATE_USERS_IN_DOMAIN;
    const NAME: &'static str = "SamrEnumerateUsersInDomain";
    type Response = EnumerationResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.domain)?;
        w.write_u32(self.enumeration_context);
        w.write_u32(self.user_account_control);
        w.write_u32(self.prefered_maximum_length);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        EnumerationResponse::read(r)
    }
}

/// SamrEnumerateAliasesInDomain
#[derive(Debug, Clone, Copy)]
pub struct SamrEnumerateAliasesInDomain {
    pub domain: ContextHandle,
    pub enumeration_context: u32,
    pub prefered_maximum_length: u32,
}

impl RpcRequest for SamrEnumerateAliasesInDomain {
    const OPNUM: u16 = opnum::ENUMERATE_ALIASES_IN_DOMAIN;
    const NAME: &'static str = "SamrEnumerateAliasesInDomain";
    type Response = EnumerationResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.domain)?;
        w.write_u32(self.enumeration_context);
        w.write_u32(self.prefered_maximum_length);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        EnumerationResponse::read(r)
    }
}

/// SamrLookupNamesInDomain
#[derive(Debug, Clone)]
pub struct SamrLookupNamesInDomain {
    pub domain: ContextHandle,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupNamesInDomainResponse {
    pub relative_ids: Vec<u32>,
    /// `SID_NAME_USE` values, one per name
    pub uses: Vec<u32>,
    pub status: NtStatus,
}

impl RpcRequest for SamrLookupNamesInDomain {
    const OPNUM: u16 = opnum::LOOKUP_NAMES_IN_DOMAIN;
    const NAME: &'static str = "SamrLookupNamesInDomain";
    type Response = LookupNamesInDomainResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        check_lookup_count(self.names.len())?;
        let names = ConformantVaryingArray::with_max_count(
            MAX_LOOKUP_COUNT as u32,
            self.names
                .iter()
                .map(|name| UnicodeString::new(name.as_str()))
                .collect(),
        );
        w.write_value(&self.domain)?;
        w.write_count(self.names.len())?;
        w.write_value(&names)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let relative_ids: CountedArray<u32> = r.read_value()?;
        let uses: CountedArray<u32> = r.read_value()?;
        Ok(LookupNamesInDomainResponse {
            relative_ids: relative_ids.into_vec(),
            uses: uses.into_vec(),
            status: r.read_value()?,
        })
    }
}

/// SamrLookupIdsInDomain
#[derive(Debug, Clone)]
pub struct SamrLookupIdsInDomain {
    pub domain: ContextHandle,
    pub relative_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupIdsInDomainResponse {
    /// One entry per RID; `None` where the RID did not map
    pub names: Vec<Option<String>>,
    pub uses: Vec<u32>,
    pub status: NtStatus,
}

impl RpcRequest for SamrLookupIdsInDomain {
    const OPNUM: u16 = opnum::LOOKUP_IDS_IN_DOMAIN;
    const NAME: &'static str = "SamrLookupIdsInDomain";
    type Response = LookupIdsInDomainResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        check_lookup_count(self.relative_ids.len())?;
        let relative_ids =
            ConformantVaryingArray::with_max_count(MAX_LOOKUP_COUNT as u32, self.relative_ids.clone());
        w.write_value(&self.domain)?;
        w.write_count(self.relative_ids.len())?;
        w.write_value(&relative_ids)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let names: CountedArray<UnicodeString> = r.read_value()?;
        let uses: CountedArray<u32> = r.read_value()?;
        Ok(LookupIdsInDomainResponse {
            names: names.into_vec().into_iter().map(|name| name.value).collect(),
            uses: uses.into_vec(),
            status: r.read_value()?,
        })
    }
}

/// SamrOpenGroup, SamrOpenAlias and SamrOpenUser share one shape
macro_rules! open_account {
    ($name:ident, $opnum:expr, $label:literal) => {
        #[doc = concat!("`", $label, "`")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub domain: ContextHandle,
            pub desired_access: u32,
            pub relative_id: u32,
        }

        impl RpcRequest for $name {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = $label;
            type Response = HandleResponse<NtStatus>;

            fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_value(&self.domain)?;
                w.write_u32(self.desired_access);
                w.write_u32(self.relative_id);
                Ok(())
            }

            fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
                HandleResponse::read(r)
            }
        }
    };
}

open_account!(SamrOpenGroup, opnum::OPEN_GROUP, "SamrOpenGroup");
open_account!(SamrOpenAlias, opnum::OPEN_ALIAS, "SamrOpenAlias");
open_account!(SamrOpenUser, opnum::OPEN_USER, "SamrOpenUser");

/// SamrGetMembersInAlias
#[derive(Debug, Clone, Copy)]
pub struct SamrGetMembersInAlias {
    pub alias: ContextHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMembersResponse {
    pub members: Vec<RpcSid>,
    pub status: NtStatus,
}

impl RpcRequest for SamrGetMembersInAlias {
    const OPNUM: u16 = opnum::GET_MEMBERS_IN_ALIAS;
    const NAME: &'static str = "SamrGetMembersInAlias";
    type Response = AliasMembersResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.alias)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let members: CountedArray<Option<RpcSid>> = r.read_value()?;
        Ok(AliasMembersResponse {
            members: members.into_vec().into_iter().flatten().collect(),
            status: r.read_value()?,
        })
    }
}
