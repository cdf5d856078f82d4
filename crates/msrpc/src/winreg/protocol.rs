//! WINREG wire protocol (MS-RRP)

use crate::call::{HandleResponse, RpcRequest};
use crate::interface::InterfaceId;
use crate::status::Win32Error;
use msrpc_ndr::{
    ConformantVaryingArray, ContextHandle, Guid, NdrError, NdrReader, NdrWriter, Result,
    TerminatedUnicodeString, UnicodeStringBuffer,
};
use std::fmt;

/// winreg interface
pub const INTERFACE: InterfaceId = InterfaceId::new(
    Guid::new(0x338c_d001, 0x2244, 0x31f1, [0xaa, 0xaa, 0x90, 0x00, 0x38, 0x00, 0x10, 0x03]),
    1,
    0,
    "\\pipe\\winreg",
);

/// Operation numbers for winreg
pub mod opnum {
    pub const OPEN_CLASSES_ROOT: u16 = 0;
    pub const OPEN_CURRENT_USER: u16 = 1;
    pub const OPEN_LOCAL_MACHINE: u16 = 2;
    pub const OPEN_USERS: u16 = 4;
    pub const BASE_REG_CLOSE_KEY: u16 = 5;
    pub const BASE_REG_ENUM_KEY: u16 = 9;
    pub const BASE_REG_ENUM_VALUE: u16 = 10;
    pub const BASE_REG_OPEN_KEY: u16 = 15;
    pub const BASE_REG_QUERY_INFO_KEY: u16 = 16;
    pub const BASE_REG_QUERY_VALUE: u16 = 17;
}

/// Key access rights (MS-RRP 2.2.3)
pub mod access {
    pub const KEY_QUERY_VALUE: u32 = 0x0000_0001;
    pub const KEY_SET_VALUE: u32 = 0x0000_0002;
    pub const KEY_CREATE_SUB_KEY: u32 = 0x0000_0004;
    pub const KEY_ENUMERATE_SUB_KEYS: u32 = 0x0000_0008;
    pub const KEY_NOTIFY: u32 = 0x0000_0010;
    pub const KEY_CREATE_LINK: u32 = 0x0000_0020;
    pub const KEY_WOW64_64KEY: u32 = 0x0000_0100;
    pub const KEY_WOW64_32KEY: u32 = 0x0000_0200;
    pub const KEY_READ: u32 = 0x0002_0019;
    pub const MAXIMUM_ALLOWED: u32 = 0x0200_0000;
}

/// Value types
pub mod value_type {
    pub const REG_NONE: u32 = 0;
    pub const REG_SZ: u32 = 1;
    pub const REG_EXPAND_SZ: u32 = 2;
    pub const REG_BINARY: u32 = 3;
    pub const REG_DWORD: u32 = 4;
    pub const REG_DWORD_BIG_ENDIAN: u32 = 5;
    pub const REG_LINK: u32 = 6;
    pub const REG_MULTI_SZ: u32 = 7;
    pub const REG_QWORD: u32 = 11;
}

/// Predefined root keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
}

impl Hive {
    /// Short name, as used in key paths (`HKLM\SOFTWARE`)
    pub fn short_name(self) -> &'static str {
        match self {
            Self::ClassesRoot => "HKCR",
            Self::CurrentUser => "HKCU",
            Self::LocalMachine => "HKLM",
            Self::Users => "HKU",
        }
    }

    /// Parse a short or long hive name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "HKCR" | "HKEY_CLASSES_ROOT" => Self::ClassesRoot,
            "HKCU" | "HKEY_CURRENT_USER" => Self::CurrentUser,
            "HKLM" | "HKEY_LOCAL_MACHINE" => Self::LocalMachine,
            "HKU" | "HKEY_USERS" => Self::Users,
            _ => return None,
        })
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

ndr_struct! {
    /// `FILETIME`: 100ns intervals since 1601-01-01
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileTime {
        pub low_date_time: u32,
        pub high_date_time: u32,
    }
}

impl FileTime {
    pub fn as_u64(&self) -> u64 {
        (u64::from(self.high_date_time) << 32) | u64::from(self.low_date_time)
    }
}

/// Decoded registry value data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    None,
    Sz(String),
    ExpandSz(String),
    Binary(Vec<u8>),
    Dword(u32),
    DwordBigEndian(u32),
    Link(String),
    MultiSz(Vec<String>),
    Qword(u64),
    Other { value_type: u32, data: Vec<u8> },
}

impl RegistryValue {
    /// Interpret raw value data according to its type
    pub fn from_raw(value_type: u32, data: Vec<u8>) -> Result<Self> {
        Ok(match value_type {
            value_type::REG_NONE => Self::None,
            value_type::REG_SZ => Self::Sz(utf16_string(&data)?),
            value_type::REG_EXPAND_SZ => Self::ExpandSz(utf16_string(&data)?),
            value_type::REG_BINARY => Self::Binary(data),
            value_type::REG_DWORD => Self::Dword(u32::from_le_bytes(fixed(&data, "REG_DWORD data")?)),
            value_type::REG_DWORD_BIG_ENDIAN => {
                Self::DwordBigEndian(u32::from_be_bytes(fixed(&data, "REG_DWORD_BIG_ENDIAN data")?))
            }
            value_type::REG_LINK => Self::Link(utf16_string(&data)?),
            value_type::REG_MULTI_SZ => Self::MultiSz(utf16_strings(&data)?),
            value_type::REG_QWORD => Self::Qword(u64::from_le_bytes(fixed(&data, "REG_QWORD data")?)),
            other => Self::Other {
                value_type: other,
                data,
            },
        })
    }

    pub fn value_type(&self) -> u32 {
        match self {
            Self::None => value_type::REG_NONE,
            Self::Sz(_) => value_type::REG_SZ,
            Self::ExpandSz(_) => value_type::REG_EXPAND_SZ,
            Self::Binary(_) => value_type::REG_BINARY,
            Self::Dword(_) => value_type::REG_DWORD,
            Self::DwordBigEndian(_) => value_type::REG_DWORD_BIG_ENDIAN,
            Self::Link(_) => value_type::REG_LINK,
            Self::MultiSz(_) => value_type::REG_MULTI_SZ,
            Self::Qword(_) => value_type::REG_QWORD,
            Self::Other { value_type, .. } => *value_type,
        }
    }
}

fn fixed<const N: usize>(data: &[u8], context: &'static str) -> Result<[u8; N]> {
    data.try_into().map_err(|_| NdrError::LengthMismatch {
        context,
        expected: N,
        actual: data.len(),
    })
}

fn utf16_units(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// String data; servers do not always include the terminator
fn utf16_string(data: &[u8]) -> Result<String> {
    let mut units = utf16_units(data);
    while units.last() == Some(&0) {
        units.pop();
    }
    Ok(String::from_utf16(&units)?)
}

/// NUL-separated strings ending with an empty string
fn utf16_strings(data: &[u8]) -> Result<Vec<String>> {
    let units = utf16_units(data);
    let mut strings = Vec::new();
    for part in units.split(|unit| *unit == 0) {
        if part.is_empty() {
            break;
        }
        strings.push(String::from_utf16(part)?);
    }
    Ok(strings)
}

/// OpenClassesRoot, OpenCurrentUser, OpenLocalMachine and OpenUsers share one shape
macro_rules! open_hive {
    ($name:ident, $opnum:expr, $label:literal) => {
        #[doc = concat!("`", $label, "`")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub desired_access: u32,
        }

        impl RpcRequest for $name {
            const OPNUM: u16 = $opnum;
            const NAME: &'static str = $label;
            type Response = HandleResponse<Win32Error>;

            fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_referent(false); // ServerName
                w.write_u32(self.desired_access);
                Ok(())
            }

            fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
                HandleResponse::read(r)
            }
        }
    };
}

open_hive!(OpenClassesRoot, opnum::OPEN_CLASSES_ROOT, "OpenClassesRoot");
open_hive!(OpenCurrentUser, opnum::OPEN_CURRENT_USER, "OpenCurrentUser");
open_hive!(OpenLocalMachine, opnum::OPEN_LOCAL_MACHINE, "OpenLocalMachine");
open_hive!(OpenUsers, opnum::OPEN_USERS, "OpenUsers");

/// BaseRegCloseKey
#[derive(Debug, Clone, Copy)]
pub struct BaseRegCloseKey {
    pub key: ContextHandle,
}

impl RpcRequest for BaseRegCloseKey {
    const OPNUM: u16 = opnum::BASE_REG_CLOSE_KEY;
    const NAME: &'static str = "BaseRegCloseKey";
    type Response = HandleResponse<Win32Error>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// BaseRegOpenKey
#[derive(Debug, Clone)]
pub struct BaseRegOpenKey {
    pub key: ContextHandle,
    /// Path relative to `key`, backslash separated
    pub sub_key: String,
    pub options: u32,
    pub desired_access: u32,
}

impl RpcRequest for BaseRegOpenKey {
    const OPNUM: u16 = opnum::BASE_REG_OPEN_KEY;
    const NAME: &'static str = "BaseRegOpenKey";
    type Response = HandleResponse<Win32Error>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)?;
        w.write_value(&TerminatedUnicodeString::new(self.sub_key.as_str()))?;
        w.write_u32(self.options);
        w.write_u32(self.desired_access);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// BaseRegEnumKey
#[derive(Debug, Clone, Copy)]
pub struct BaseRegEnumKey {
    pub key: ContextHandle,
    pub index: u32,
    /// Name buffer offered to the server, in UTF-16 code units
    pub name_capacity: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumKeyResponse {
    pub name: String,
    pub class: Option<String>,
    pub last_write_time: Option<FileTime>,
    /// `ERROR_NO_MORE_ITEMS` past the last subkey
    pub error: Win32Error,
}

impl RpcRequest for BaseRegEnumKey {
    const OPNUM: u16 = opnum::BASE_REG_ENUM_KEY;
    const NAME: &'static str = "BaseRegEnumKey";
    type Response = EnumKeyResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)?;
        w.write_u32(self.index);
        w.write_value(&UnicodeStringBuffer::new(self.name_capacity))?;
        w.write_unique::<UnicodeStringBuffer>(None)?; // lpClassIn
        w.write_unique(Some(&FileTime::default()))
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let name: TerminatedUnicodeString = r.read_value()?;
        let class: Option<TerminatedUnicodeString> = r.read_unique()?;
        Ok(EnumKeyResponse {
            name: name.into_string(),
            class: class.and_then(|class| class.value),
            last_write_time: r.read_unique()?,
            error: r.read_value()?,
        })
    }
}

/// The `lpType`, `lpData`, `lpcbData`, `lpcbLen` group shared by the value calls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueData {
    pub value_type: Option<u32>,
    pub data: Option<Vec<u8>>,
    /// Buffer size; on `ERROR_MORE_DATA`, the size the value needs
    pub data_size: Option<u32>,
    /// Bytes of data returned
    pub data_length: Option<u32>,
}

impl ValueData {
    fn write_request(w: &mut NdrWriter, capacity: u32) -> Result<()> {
        let buffer: ConformantVaryingArray<u8> = ConformantVaryingArray::with_max_count(capacity, Vec::new());
        w.write_unique(Some(&0u32))?;
        w.write_unique(Some(&buffer))?;
        w.write_unique(Some(&capacity))?;
        w.write_unique(Some(&0u32))
    }

    fn read(r: &mut NdrReader) -> Result<Self> {
        let value_type = r.read_unique()?;
        let data: Option<ConformantVaryingArray<u8>> = r.read_unique()?;
        Ok(Self {
            value_type,
            data: data.map(ConformantVaryingArray::into_vec),
            data_size: r.read_unique()?,
            data_length: r.read_unique()?,
        })
    }

    /// The data array must hold exactly `lpcbLen` bytes
    fn check_length(&self) -> Result<()> {
        if let (Some(data), Some(length)) = (&self.data, self.data_length) {
            if data.len() != length as usize {
                return Err(NdrError::LengthMismatch {
                    context: "registry value data",
                    expected: length as usize,
                    actual: data.len(),
                });
            }
        }
        Ok(())
    }

    /// Decode the returned data according to its type
    pub fn value(&self) -> Result<RegistryValue> {
        RegistryValue::from_raw(
            self.value_type.unwrap_or(value_type::REG_NONE),
            self.data.clone().unwrap_or_default(),
        )
    }
}

/// Read the value group and trailing error, checking the data length unless
/// the server only reported the size it needs
fn read_value_response(r: &mut NdrReader) -> Result<(ValueData, Win32Error)> {
    let data = ValueData::read(r)?;
    let error: Win32Error = r.read_value()?;
    if error != Win32Error::MORE_DATA {
        data.check_length()?;
    }
    Ok((data, error))
}

/// BaseRegEnumValue
#[derive(Debug, Clone, Copy)]
pub struct BaseRegEnumValue {
    pub key: ContextHandle,
    pub index: u32,
    pub name_capacity: u16,
    /// Data buffer offered to the server, in bytes
    pub data_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumValueResponse {
    pub name: String,
    pub data: ValueData,
    pub error: Win32Error,
}

impl RpcRequest for BaseRegEnumValue {
    const OPNUM: u16 = opnum::BASE_REG_ENUM_VALUE;
    const NAME: &'static str = "BaseRegEnumValue";
    type Response = EnumValueResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)?;
        w.write_u32(self.index);
        w.write_value(&UnicodeStringBuffer::new(self.name_capacity))?;
        ValueData::write_request(w, self.data_capacity)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let name: TerminatedUnicodeString = r.read_value()?;
        let (data, error) = read_value_response(r)?;
        Ok(EnumValueResponse {
            name: name.into_string(),
            data,
            error,
        })
    }
}

/// BaseRegQueryValue
#[derive(Debug, Clone)]
pub struct BaseRegQueryValue {
    pub key: ContextHandle,
    /// Empty for the key's default value
    pub value_name: String,
    pub data_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryValueResponse {
    pub data: ValueData,
    pub error: Win32Error,
}

impl RpcRequest for BaseRegQueryValue {
    const OPNUM: u16 = opnum::BASE_REG_QUERY_VALUE;
    const NAME: &'static str = "BaseRegQueryValue";
    type Response = QueryValueResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)?;
        w.write_value(&TerminatedUnicodeString::new(self.value_name.as_str()))?;
        ValueData::write_request(w, self.data_capacity)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let (data, error) = read_value_response(r)?;
        Ok(QueryValueResponse { data, error })
    }
}

/// BaseRegQueryInfoKey
#[derive(Debug, Clone, Copy)]
pub struct BaseRegQueryInfoKey {
    pub key: ContextHandle,
    pub class_capacity: u16,
}

/// Key metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyInfo {
    pub class: String,
    pub sub_keys: u32,
    pub max_sub_key_len: u32,
    pub max_class_len: u32,
    pub values: u32,
    pub max_value_name_len: u32,
    pub max_value_len: u32,
    pub security_descriptor_len: u32,
    pub last_write_time: FileTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryInfoKeyResponse {
    pub info: KeyInfo,
    pub error: Win32Error,
}

impl RpcRequest for BaseRegQueryInfoKey {
    const OPNUM: u16 = opnum::BASE_REG_QUERY_INFO_KEY;
    const NAME: &'static str = "BaseRegQueryInfoKey";
    type Response = QueryInfoKeyResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.key)?;
        w.write_value(&UnicodeStringBuffer::new(self.class_capacity))
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        let class: TerminatedUnicodeString = r.read_value()?;
        let info = KeyInfo {
            class: class.into_string(),
            sub_keys: r.read_u32()?,
            max_sub_key_len: r.read_u32()?,
            max_class_len: r.read_u32()?,
            values: r.read_u32()?,
            max_value_name_len: r.read_u32()?,
            max_value_len: r.read_u32()?,
            security_descriptor_len: r.read_u32()?,
            last_write_time: r.read_value()?,
        };
        Ok(QueryInfoKeyResponse {
            info,
            error: r.read_value()?,
        })
    }
}
