//! LSA wire protocol (MS-LSAD, MS-LSAT)

use crate::call::{HandleResponse, RpcRequest};
use crate::interface::InterfaceId;
use crate::status::NtStatus;
use msrpc_ndr::{
    Alignment, ConformantArray, ContextHandle, CountedArray, Guid, NdrError, NdrMarshal,
    NdrReader, NdrType, NdrWriter, Result, RpcSid, UnicodeString, WString,
};

/// lsarpc interface
pub const INTERFACE: InterfaceId = InterfaceId::new(
    Guid::new(0x1234_5778, 0x1234, 0xabcd, [0xef, 0x00, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab]),
    0,
    0,
    "\\pipe\\lsarpc",
);

/// Operation numbers for lsarpc
pub mod opnum {
    pub const CLOSE: u16 = 0;
    pub const QUERY_INFORMATION_POLICY: u16 = 7;
    pub const LOOKUP_NAMES: u16 = 14;
    pub const LOOKUP_SIDS: u16 = 15;
    pub const ENUMERATE_ACCOUNTS_WITH_USER_RIGHT: u16 = 35;
    pub const OPEN_POLICY2: u16 = 44;
}

/// Policy object access rights (MS-LSAD 2.2.1.1.2)
pub mod access {
    pub const POLICY_VIEW_LOCAL_INFORMATION: u32 = 0x0000_0001;
    pub const POLICY_VIEW_AUDIT_INFORMATION: u32 = 0x0000_0002;
    pub const POLICY_GET_PRIVATE_INFORMATION: u32 = 0x0000_0004;
    pub const POLICY_TRUST_ADMIN: u32 = 0x0000_0008;
    pub const POLICY_CREATE_ACCOUNT: u32 = 0x0000_0010;
    pub const POLICY_CREATE_SECRET: u32 = 0x0000_0020;
    pub const POLICY_CREATE_PRIVILEGE: u32 = 0x0000_0040;
    pub const POLICY_SET_DEFAULT_QUOTA_LIMITS: u32 = 0x0000_0080;
    pub const POLICY_SET_AUDIT_REQUIREMENTS: u32 = 0x0000_0100;
    pub const POLICY_AUDIT_LOG_ADMIN: u32 = 0x0000_0200;
    pub const POLICY_SERVER_ADMIN: u32 = 0x0000_0400;
    pub const POLICY_LOOKUP_NAMES: u32 = 0x0000_0800;
    pub const POLICY_NOTIFICATION: u32 = 0x0000_1000;
    pub const MAXIMUM_ALLOWED: u32 = 0x0200_0000;
}

ndr_enum16! {
    /// `SID_NAME_USE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum SidNameUse {
        User = 1,
        Group = 2,
        Domain = 3,
        Alias = 4,
        WellKnownGroup = 5,
        DeletedAccount = 6,
        Invalid = 7,
        #[default]
        Unknown = 8,
        Computer = 9,
        Label = 10,
    }
}

ndr_enum16! {
    /// `LSAP_LOOKUP_LEVEL`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum LookupLevel {
        #[default]
        Workstation = 1,
        PrimaryDomainController = 2,
        TrustedDomain = 3,
        GlobalCatalog = 4,
    }
}

ndr_enum16! {
    /// `POLICY_INFORMATION_CLASS` values this client decodes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum PolicyInformationClass {
        AuditEvents = 2,
        PrimaryDomain = 3,
        #[default]
        AccountDomain = 5,
        DnsDomain = 12,
    }
}

/// `LSAPR_OBJECT_ATTRIBUTES` with every pointer null, as servers require
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectAttributes;

impl NdrType for ObjectAttributes {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for ObjectAttributes {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u32(24); // Length
        w.write_referent(false); // RootDirectory
        w.write_referent(false); // ObjectName
        w.write_u32(0); // Attributes
        w.write_referent(false); // SecurityDescriptor
        w.write_referent(false); // SecurityQualityOfService
        Ok(())
    }
}

ndr_struct! {
    /// `LSAPR_TRUST_INFORMATION`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct TrustInformation {
        pub name: UnicodeString,
        pub sid: Option<RpcSid>,
    }
}

ndr_struct! {
    /// `LSAPR_REFERENCED_DOMAIN_LIST`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ReferencedDomainList {
        pub domains: CountedArray<TrustInformation>,
        pub max_entries: u32,
    }
}

impl ReferencedDomainList {
    /// Domain at the index a translated name or SID refers to
    pub fn get(&self, index: i32) -> Option<&TrustInformation> {
        let index = usize::try_from(index).ok()?;
        self.domains.entries()?.get(index)
    }
}

ndr_struct! {
    /// `LSA_TRANSLATED_SID`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TranslatedSid {
        pub sid_type: SidNameUse,
        pub relative_id: u32,
        pub domain_index: i32,
    }
}

ndr_struct! {
    /// `LSAPR_TRANSLATED_NAME`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct TranslatedName {
        pub sid_type: SidNameUse,
        pub name: UnicodeString,
        pub domain_index: i32,
    }
}

ndr_struct! {
    /// `POLICY_AUDIT_EVENTS_INFO`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct AuditEventsInfo {
        pub auditing_mode: bool,
        pub event_auditing_options: Option<ConformantArray<u32>>,
        pub maximum_audit_event_count: u32,
    }
}

ndr_struct! {
    /// `LSAPR_POLICY_PRIMARY_DOM_INFO` and `LSAPR_POLICY_ACCOUNT_DOM_INFO`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct DomainInfo {
        pub name: UnicodeString,
        pub sid: Option<RpcSid>,
    }
}

ndr_struct! {
    /// `LSAPR_POLICY_DNS_DOMAIN_INFO`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct DnsDomainInfo {
        pub name: UnicodeString,
        pub dns_domain_name: UnicodeString,
        pub dns_forest_name: UnicodeString,
        pub domain_guid: Guid,
        pub sid: Option<RpcSid>,
    }
}

/// `LSAPR_POLICY_INFORMATION`, the arms this client decodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyInformation {
    AuditEvents(AuditEventsInfo),
    PrimaryDomain(DomainInfo),
    AccountDomain(DomainInfo),
    DnsDomain(DnsDomainInfo),
}

impl PolicyInformation {
    pub fn class(&self) -> PolicyInformationClass {
        match self {
            Self::AuditEvents(_) => PolicyInformationClass::AuditEvents,
            Self::PrimaryDomain(_) => PolicyInformationClass::PrimaryDomain,
            Self::AccountDomain(_) => PolicyInformationClass::AccountDomain,
            Self::DnsDomain(_) => PolicyInformationClass::DnsDomain,
        }
    }

    /// Decode the union: discriminant, then the arm it selects
    pub fn read(r: &mut NdrReader, expected: PolicyInformationClass) -> Result<Self> {
        let tag = r.read_u16()?;
        if tag != expected.value() {
            return Err(NdrError::UnexpectedTag {
                expected: u32::from(expected.value()),
                actual: u32::from(tag),
            });
        }
        match expected {
            PolicyInformationClass::AuditEvents => Ok(Self::AuditEvents(r.read_value()?)),
            PolicyInformationClass::PrimaryDomain => Ok(Self::PrimaryDomain(r.read_value()?)),
            PolicyInformationClass::AccountDomain => Ok(Self::AccountDomain(r.read_value()?)),
            PolicyInformationClass::DnsDomain => Ok(Self::DnsDomain(r.read_value()?)),
            PolicyInformationClass::Other(value) => Err(unsupported_class(value)),
        }
    }

    /// Encode the union: discriminant, then the arm
    pub fn write(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_u16(self.class().value());
        match self {
            Self::AuditEvents(info) => w.write_value(info),
            Self::PrimaryDomain(info) | Self::AccountDomain(info) => w.write_value(info),
            Self::DnsDomain(info) => w.write_value(info),
        }
    }
}

fn unsupported_class(value: u16) -> NdrError {
    NdrError::InvalidArgument(format!("unsupported policy information class {value}"))
}

/// LsarClose
#[derive(Debug, Clone, Copy)]
pub struct LsarClose {
    pub handle: ContextHandle,
}

impl RpcRequest for LsarClose {
    const OPNUM: u16 = opnum::CLOSE;
    const NAME: &'static str = "LsarClose";
    type Response = HandleResponse<NtStatus>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.handle)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// LsarOpenPolicy2
#[derive(Debug, Clone)]
pub struct LsarOpenPolicy2 {
    /// Ignored by servers; usually `None`
    pub system_name: Option<String>,
    pub desired_access: u32,
}

impl RpcRequest for LsarOpenPolicy2 {
    const OPNUM: u16 = opnum::OPEN_POLICY2;
    const NAME: &'static str = "LsarOpenPolicy2";
    type Response = HandleResponse<NtStatus>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let system_name = self.system_name.as_deref().map(WString::from);
        w.write_unique(system_name.as_ref())?;
        w.write_value(&ObjectAttributes)?;
        w.write_u32(self.desired_access);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// LsarQueryInformationPolicy
#[derive(Debug, Clone, Copy)]
pub struct LsarQueryInformationPolicy {
    pub policy: ContextHandle,
    pub information_class: PolicyInformationClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInformationPolicyResponse {
    pub information: Option<PolicyInformation>,
    pub status: NtStatus,
}

impl RpcRequest for LsarQueryInformationPolicy {
    const OPNUM: u16 = opnum::QUERY_INFORMATION_POLICY;
    const NAME: &'static str = "LsarQueryInformationPolicy";
    type Response = QueryInformationPolicyResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        if let PolicyInformationClass::Other(value) = self.information_class {
            return Err(unsupported_class(value));
        }
        w.write_value(&self.policy)?;
        w.write_value(&self.information_class)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let information = if r.read_referent()? {
            Some(PolicyInformation::read(r, self.information_class)?)
        } else {
            None
        };
        Ok(QueryInformationPolicyResponse {
            information,
            status: r.read_value()?,
        })
    }
}

/// LsarLookupNames
#[derive(Debug, Clone)]
pub struct LsarLookupNames {
    pub policy: ContextHandle,
    pub names: Vec<String>,
    pub lookup_level: LookupLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupNamesResponse {
    pub referenced_domains: Option<ReferencedDomainList>,
    pub translated_sids: Vec<TranslatedSid>,
    pub mapped_count: u32,
    pub status: NtStatus,
}

impl RpcRequest for LsarLookupNames {
    const OPNUM: u16 = opnum::LOOKUP_NAMES;
    const NAME: &'static str = "LsarLookupNames";
    type Response = LookupNamesResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let names: ConformantArray<UnicodeString> = self
            .names
            .iter()
            .map(|name| UnicodeString::new(name.as_str()))
            .collect::<Vec<_>>()
            .into();
        w.write_value(&self.policy)?;
        w.write_count(names.len())?;
        w.write_value(&names)?;
        w.write_value(&CountedArray::<TranslatedSid>::null())?;
        w.write_value(&self.lookup_level)?;
        w.write_u32(0); // MappedCount
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let referenced_domains = r.read_unique()?;
        let translated_sids: CountedArray<TranslatedSid> = r.read_value()?;
        Ok(LookupNamesResponse {
            referenced_domains,
            translated_sids: translated_sids.into_vec(),
            mapped_count: r.read_u32()?,
            status: r.read_value()?,
        })
    }
}

/// LsarLookupSids
#[derive(Debug, Clone)]
pub struct LsarLookupSids {
    pub policy: ContextHandle,
    pub sids: Vec<RpcSid>,
    pub lookup_level: LookupLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSidsResponse {
    pub referenced_domains: Option<ReferencedDomainList>,
    pub translated_names: Vec<TranslatedName>,
    pub mapped_count: u32,
    pub status: NtStatus,
}

impl RpcRequest for LsarLookupSids {
    const OPNUM: u16 = opnum::LOOKUP_SIDS;
    const NAME: &'static str = "LsarLookupSids";
    type Response = LookupSidsResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let sids: CountedArray<Option<RpcSid>> =
            self.sids.iter().cloned().map(Some).collect::<Vec<_>>().into();
        w.write_value(&self.policy)?;
        w.write_value(&sids)?;
        w.write_value(&CountedArray::<TranslatedName>::null())?;
        w.write_value(&self.lookup_level)?;
        w.write_u32(0); // MappedCount
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let referenced_domains = r.read_unique()?;
        let translated_names: CountedArray<TranslatedName> = r.read_value()?;
        Ok(LookupSidsResponse {
            referenced_domains,
            translated_names: translated_names.into_vec(),
            mapped_count: r.read_u32()?,
            status: r.read_value()?,
        })
    }
}

/// LsarEnumerateAccountsWithUserRight
#[derive(Debug, Clone)]
pub struct LsarEnumerateAccountsWithUserRight {
    pub policy: ContextHandle,
    /// Privilege or right name such as `SeBackupPrivilege`
    pub user_right: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateAccountsResponse {
    /// `None` when the server returned a null buffer
    pub accounts: Option<Vec<RpcSid>>,
    pub status: NtStatus,
}

impl RpcRequest for LsarEnumerateAccountsWithUserRight {
    const OPNUM: u16 = opnum::ENUMERATE_ACCOUNTS_WITH_USER_RIGHT;
    const NAME: &'static str = "LsarEnumerateAccountsWithUserRight";
    type Response = EnumerateAccountsResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let user_right = self.user_right.as_deref().map(UnicodeString::new);
        w.write_value(&self.policy)?;
        w.write_unique(user_right.as_ref())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let buffer: CountedArray<Option<RpcSid>> = r.read_value()?;
        let accounts = if buffer.is_null() {
            None
        } else {
            Some(buffer.into_vec().into_iter().flatten().collect())
        };
        Ok(EnumerateAccountsResponse {
            accounts,
            status: r.read_value()?,
        })
    }
}
