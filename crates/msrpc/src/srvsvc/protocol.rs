//! SRVSVC wire protocol (MS-SRVS)
//!
//! The information calls answer with a union switched on the requested
//! level. Decoding starts from a placeholder of the requested level, so a
//! server answering at another level fails with `UnexpectedTag`.

use crate::call::RpcRequest;
use crate::interface::InterfaceId;
use crate::status::Win32Error;
use msrpc_ndr::{
    Alignment, CountedArray, Guid, NdrError, NdrMarshal, NdrReader, NdrType, NdrUnmarshal,
    NdrWriter, Result, WString,
};

/// srvsvc interface
pub const INTERFACE: InterfaceId = InterfaceId::new(
    Guid::new(0x4b32_4fc8, 0x1670, 0x01d3, [0x12, 0x78, 0x5a, 0x47, 0xbf, 0x6e, 0xe1, 0x88]),
    3,
    0,
    "\\pipe\\srvsvc",
);

/// Operation numbers for srvsvc
pub mod opnum {
    pub const SHARE_ENUM: u16 = 15;
    pub const SHARE_GET_INFO: u16 = 16;
    pub const SERVER_GET_INFO: u16 = 21;
}

/// `shi*_type` values
pub mod share_type {
    pub const DISKTREE: u32 = 0x0000_0000;
    pub const PRINTQ: u32 = 0x0000_0001;
    pub const DEVICE: u32 = 0x0000_0002;
    pub const IPC: u32 = 0x0000_0003;
    pub const CLUSTER_FS: u32 = 0x0200_0000;
    pub const TEMPORARY: u32 = 0x4000_0000;
    pub const SPECIAL: u32 = 0x8000_0000;

    /// Mask selecting the base type from the modifier bits
    pub const TYPE_MASK: u32 = 0x0000_00ff;
}

/// `PreferedMaximumLength` meaning "return everything"
pub const MAX_PREFERRED_LENGTH: u32 = 0xffff_ffff;

/// Share information levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShareLevel {
    /// Name only
    #[default]
    Level0,
    /// Name, type and remark
    Level1,
    /// Level 1 plus path and usage counts
    Level2,
}

impl ShareLevel {
    pub fn value(self) -> u32 {
        match self {
            Self::Level0 => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
        }
    }
}

/// Server information levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServerLevel {
    #[default]
    Level100,
    Level101,
}

impl ServerLevel {
    pub fn value(self) -> u32 {
        match self {
            Self::Level100 => 100,
            Self::Level101 => 101,
        }
    }
}

fn check_tag(expected: u32, actual: u32) -> Result<()> {
    if expected != actual {
        return Err(NdrError::UnexpectedTag { expected, actual });
    }
    Ok(())
}

ndr_struct! {
    /// `SHARE_INFO_0`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ShareInfo0 {
        pub netname: Option<WString>,
    }
}

ndr_struct! {
    /// `SHARE_INFO_1`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ShareInfo1 {
        pub netname: Option<WString>,
        pub share_type: u32,
        pub remark: Option<WString>,
    }
}

ndr_struct! {
    /// `SHARE_INFO_2`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ShareInfo2 {
        pub netname: Option<WString>,
        pub share_type: u32,
        pub remark: Option<WString>,
        pub permissions: u32,
        pub max_uses: u32,
        pub current_uses: u32,
        pub path: Option<WString>,
        pub passwd: Option<WString>,
    }
}

/// One share at any level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareInfo {
    Level0(ShareInfo0),
    Level1(ShareInfo1),
    Level2(ShareInfo2),
}

impl ShareInfo {
    /// Decode placeholder for `level`
    pub fn placeholder(level: ShareLevel) -> Self {
        match level {
            ShareLevel::Level0 => Self::Level0(ShareInfo0::default()),
            ShareLevel::Level1 => Self::Level1(ShareInfo1::default()),
            ShareLevel::Level2 => Self::Level2(ShareInfo2::default()),
        }
    }

    pub fn level(&self) -> ShareLevel {
        match self {
            Self::Level0(_) => ShareLevel::Level0,
            Self::Level1(_) => ShareLevel::Level1,
            Self::Level2(_) => ShareLevel::Level2,
        }
    }

    pub fn netname(&self) -> Option<&str> {
        let netname = match self {
            Self::Level0(info) => &info.netname,
            Self::Level1(info) => &info.netname,
            Self::Level2(info) => &info.netname,
        };
        netname.as_ref().map(WString::as_str)
    }

    /// Share type bits; level 0 carries none
    pub fn share_type(&self) -> Option<u32> {
        match self {
            Self::Level0(_) => None,
            Self::Level1(info) => Some(info.share_type),
            Self::Level2(info) => Some(info.share_type),
        }
    }

    fn read(r: &mut NdrReader, level: ShareLevel) -> Result<Self> {
        let mut info = Self::placeholder(level);
        match &mut info {
            Self::Level0(inner) => r.read_value_into(inner)?,
            Self::Level1(inner) => r.read_value_into(inner)?,
            Self::Level2(inner) => r.read_value_into(inner)?,
        }
        Ok(info)
    }
}

/// `SHARE_ENUM_STRUCT`: the level, then a level-switched container pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareEnum {
    Level0(Option<CountedArray<ShareInfo0>>),
    Level1(Option<CountedArray<ShareInfo1>>),
    Level2(Option<CountedArray<ShareInfo2>>),
}

impl ShareEnum {
    /// An empty container of `level`, as sent in a request
    pub fn empty(level: ShareLevel) -> Self {
        match level {
            ShareLevel::Level0 => Self::Level0(Some(CountedArray::null())),
            ShareLevel::Level1 => Self::Level1(Some(CountedArray::null())),
            ShareLevel::Level2 => Self::Level2(Some(CountedArray::null())),
        }
    }

    pub fn level(&self) -> ShareLevel {
        match self {
            Self::Level0(_) => ShareLevel::Level0,
            Self::Level1(_) => ShareLevel::Level1,
            Self::Level2(_) => ShareLevel::Level2,
        }
    }

    /// Shares in the container, treating a null container as empty
    pub fn into_shares(self) -> Vec<ShareInfo> {
        fn shares<S>(container: Option<CountedArray<S>>, wrap: fn(S) -> ShareInfo) -> Vec<ShareInfo> {
            container
                .map(CountedArray::into_vec)
                .unwrap_or_default()
                .into_iter()
                .map(wrap)
                .collect()
        }

        match self {
            Self::Level0(container) => shares(container, ShareInfo::Level0),
            Self::Level1(container) => shares(container, ShareInfo::Level1),
            Self::Level2(container) => shares(container, ShareInfo::Level2),
        }
    }
}

impl Default for ShareEnum {
    fn default() -> Self {
        Self::empty(ShareLevel::default())
    }
}

impl NdrType for ShareEnum {
    const ALIGNMENT: Alignment = Alignment::Four;
}

impl NdrMarshal for ShareEnum {
    fn marshal_entity(&self, w: &mut NdrWriter) -> Result<()> {
        let level = self.level().value();
        w.write_u32(level);
        w.write_u32(level); // union discriminant
        match self {
            Self::Level0(container) => container.marshal_entity(w),
            Self::Level1(container) => container.marshal_entity(w),
            Self::Level2(container) => container.marshal_entity(w),
        }
    }

    fn marshal_deferrals(&self, w: &mut NdrWriter) -> Result<()> {
        match self {
            Self::Level0(container) => container.marshal_deferrals(w),
            Self::Level1(container) => container.marshal_deferrals(w),
            Self::Level2(container) => container.marshal_deferrals(w),
        }
    }
}

impl NdrUnmarshal for ShareEnum {
    fn unmarshal_entity(&mut self, r: &mut NdrReader) -> Result<()> {
        let expected = self.level().value();
        check_tag(expected, r.read_u32()?)?;
        check_tag(expected, r.read_u32()?)?;
        match self {
            Self::Level0(container) => container.unmarshal_entity(r),
            Self::Level1(container) => container.unmarshal_entity(r),
            Self::Level2(container) => container.unmarshal_entity(r),
        }
    }

    fn unmarshal_deferrals(&mut self, r: &mut NdrReader) -> Result<()> {
        match self {
            Self::Level0(container) => container.unmarshal_deferrals(r),
            Self::Level1(container) => container.unmarshal_deferrals(r),
            Self::Level2(container) => container.unmarshal_deferrals(r),
        }
    }
}

/// NetrShareEnum
#[derive(Debug, Clone, Default)]
pub struct NetrShareEnum {
    pub server_name: Option<String>,
    pub level: ShareLevel,
    pub prefered_maximum_length: u32,
    pub resume_handle: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEnumResponse {
    pub info: ShareEnum,
    pub total_entries: u32,
    pub resume_handle: Option<u32>,
    /// `ERROR_MORE_DATA` while shares remain
    pub error: Win32Error,
}

impl RpcRequest for NetrShareEnum {
    const OPNUM: u16 = opnum::SHARE_ENUM;
    const NAME: &'static str = "NetrShareEnum";
    type Response = ShareEnumResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let server_name = self.server_name.as_deref().map(WString::from);
        w.write_unique(server_name.as_ref())?;
        w.write_value(&ShareEnum::empty(self.level))?;
        w.write_u32(self.prefered_maximum_length);
        w.write_unique(self.resume_handle.as_ref())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let mut info = ShareEnum::empty(self.level);
        r.read_value_into(&mut info)?;
        Ok(ShareEnumResponse {
            info,
            total_entries: r.read_u32()?,
            resume_handle: r.read_unique()?,
            error: r.read_value()?,
        })
    }
}

/// NetrShareGetInfo
#[derive(Debug, Clone)]
pub struct NetrShareGetInfo {
    pub server_name: Option<String>,
    pub net_name: String,
    pub level: ShareLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareGetInfoResponse {
    /// `None` when the server returned a null info pointer
    pub info: Option<ShareInfo>,
    pub error: Win32Error,
}

impl RpcRequest for NetrShareGetInfo {
    const OPNUM: u16 = opnum::SHARE_GET_INFO;
    const NAME: &'static str = "NetrShareGetInfo";
    type Response = ShareGetInfoResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let server_name = self.server_name.as_deref().map(WString::from);
        w.write_unique(server_name.as_ref())?;
        w.write_value(&WString::from(self.net_name.as_str()))?;
        w.write_u32(self.level.value());
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        check_tag(self.level.value(), r.read_u32()?)?;
        let info = if r.read_referent()? {
            Some(ShareInfo::read(r, self.level)?)
        } else {
            None
        };
        Ok(ShareGetInfoResponse {
            info,
            error: r.read_value()?,
        })
    }
}

ndr_struct! {
    /// `SERVER_INFO_100`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ServerInfo100 {
        pub platform_id: u32,
        pub name: Option<WString>,
    }
}

ndr_struct! {
    /// `SERVER_INFO_101`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ServerInfo101 {
        pub platform_id: u32,
        pub name: Option<WString>,
        pub version_major: u32,
        pub version_minor: u32,
        pub server_type: u32,
        pub comment: Option<WString>,
    }
}

/// Server information at any level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerInfo {
    Level100(ServerInfo100),
    Level101(ServerInfo101),
}

impl ServerInfo {
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            Self::Level100(info) => &info.name,
            Self::Level101(info) => &info.name,
        };
        name.as_ref().map(WString::as_str)
    }

    pub fn platform_id(&self) -> u32 {
        match self {
            Self::Level100(info) => info.platform_id,
            Self::Level101(info) => info.platform_id,
        }
    }
}

/// NetrServerGetInfo
#[derive(Debug, Clone, Default)]
pub struct NetrServerGetInfo {
    pub server_name: Option<String>,
    pub level: ServerLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerGetInfoResponse {
    pub info: Option<ServerInfo>,
    pub error: Win32Error,
}

impl RpcRequest for NetrServerGetInfo {
    const OPNUM: u16 = opnum::SERVER_GET_INFO;
    const NAME: &'static str = "NetrServerGetInfo";
    type Response = ServerGetInfoResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let server_name = self.server_name.as_deref().map(WString::from);
        w.write_unique(server_name.as_ref())?;
        w.write_u32(self.level.value());
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        check_tag(self.level.value(), r.read_u32()?)?;
        let info = if r.read_referent()? {
            Some(match self.level {
                ServerLevel::Level100 => ServerInfo::Level100(r.read_value()?),
                ServerLevel::Level101 => ServerInfo::Level101(r.read_value()?),
            })
        } else {
            None
        };
        Ok(ServerGetInfoResponse {
            info,
            error: r.read_value()?,
        })
    }
}
