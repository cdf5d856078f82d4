//! SVCCTL wire protocol (MS-SCMR)

use crate::call::{HandleResponse, RpcRequest};
use crate::interface::InterfaceId;
use crate::status::Win32Error;
use msrpc_ndr::{ConformantArray, ContextHandle, Guid, NdrReader, NdrWriter, Result, WString};

/// svcctl interface
pub const INTERFACE: InterfaceId = InterfaceId::new(
    Guid::new(0x367a_bb81, 0x9844, 0x35f1, [0xad, 0x32, 0x98, 0xf0, 0x38, 0x00, 0x10, 0x03]),
    2,
    0,
    "\\pipe\\svcctl",
);

/// Operation numbers for svcctl
pub mod opnum {
    pub const CLOSE_SERVICE_HANDLE: u16 = 0;
    pub const CONTROL_SERVICE: u16 = 1;
    pub const QUERY_SERVICE_STATUS: u16 = 6;
    pub const OPEN_SC_MANAGER_W: u16 = 15;
    pub const OPEN_SERVICE_W: u16 = 16;
    pub const QUERY_SERVICE_CONFIG_W: u16 = 17;
    pub const START_SERVICE_W: u16 = 19;
}

/// Access rights (MS-SCMR 3.1.4)
pub mod access {
    pub const SC_MANAGER_CONNECT: u32 = 0x0001;
    pub const SC_MANAGER_CREATE_SERVICE: u32 = 0x0002;
    pub const SC_MANAGER_ENUMERATE_SERVICE: u32 = 0x0004;
    pub const SC_MANAGER_LOCK: u32 = 0x0008;
    pub const SC_MANAGER_QUERY_LOCK_STATUS: u32 = 0x0010;
    pub const SC_MANAGER_ALL_ACCESS: u32 = 0x000f_003f;

    pub const SERVICE_QUERY_CONFIG: u32 = 0x0001;
    pub const SERVICE_CHANGE_CONFIG: u32 = 0x0002;
    pub const SERVICE_QUERY_STATUS: u32 = 0x0004;
    pub const SERVICE_ENUMERATE_DEPENDENTS: u32 = 0x0008;
    pub const SERVICE_START: u32 = 0x0010;
    pub const SERVICE_STOP: u32 = 0x0020;
    pub const SERVICE_PAUSE_CONTINUE: u32 = 0x0040;
    pub const SERVICE_INTERROGATE: u32 = 0x0080;
    pub const SERVICE_ALL_ACCESS: u32 = 0x000f_01ff;
}

/// Control codes for RControlService
pub mod control {
    pub const STOP: u32 = 0x01;
    pub const PAUSE: u32 = 0x02;
    pub const CONTINUE: u32 = 0x03;
    pub const INTERROGATE: u32 = 0x04;
}

/// `dwCurrentState` values
pub mod state {
    pub const STOPPED: u32 = 0x01;
    pub const START_PENDING: u32 = 0x02;
    pub const STOP_PENDING: u32 = 0x03;
    pub const RUNNING: u32 = 0x04;
    pub const CONTINUE_PENDING: u32 = 0x05;
    pub const PAUSE_PENDING: u32 = 0x06;
    pub const PAUSED: u32 = 0x07;
}

/// Largest configuration buffer RQueryServiceConfigW accepts
pub const MAX_CONFIG_BUFFER: u32 = 8 * 1024;

ndr_struct! {
    /// `SERVICE_STATUS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ServiceStatus {
        pub service_type: u32,
        pub current_state: u32,
        pub controls_accepted: u32,
        pub win32_exit_code: u32,
        pub service_specific_exit_code: u32,
        pub check_point: u32,
        pub wait_hint: u32,
    }
}

impl ServiceStatus {
    pub fn is_running(&self) -> bool {
        self.current_state == state::RUNNING
    }

    pub fn is_stopped(&self) -> bool {
        self.current_state == state::STOPPED
    }
}

ndr_struct! {
    /// `QUERY_SERVICE_CONFIGW`
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct ServiceConfig {
        pub service_type: u32,
        pub start_type: u32,
        pub error_control: u32,
        pub binary_path_name: Option<WString>,
        pub load_order_group: Option<WString>,
        pub tag_id: u32,
        /// Dependencies as a double-NUL-separated list
        pub dependencies: Option<WString>,
        pub service_start_name: Option<WString>,
        pub display_name: Option<WString>,
    }
}

/// `SERVICE_STATUS` followed by the return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceStatusResponse {
    pub status: ServiceStatus,
    pub error: Win32Error,
}

impl ServiceStatusResponse {
    fn read(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            status: r.read_value()?,
            error: r.read_value()?,
        })
    }
}

/// RCloseServiceHandle
#[derive(Debug, Clone, Copy)]
pub struct RCloseServiceHandle {
    pub handle: ContextHandle,
}

impl RpcRequest for RCloseServiceHandle {
    const OPNUM: u16 = opnum::CLOSE_SERVICE_HANDLE;
    const NAME: &'static str = "RCloseServiceHandle";
    type Response = HandleResponse<Win32Error>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.handle)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// RControlService
#[derive(Debug, Clone, Copy)]
pub struct RControlService {
    pub service: ContextHandle,
    /// One of the [`control`] codes
    pub control: u32,
}

impl RpcRequest for RControlService {
    const OPNUM: u16 = opnum::CONTROL_SERVICE;
    const NAME: &'static str = "RControlService";
    type Response = ServiceStatusResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.service)?;
        w.write_u32(self.control);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        ServiceStatusResponse::read(r)
    }
}

/// RQueryServiceStatus
#[derive(Debug, Clone, Copy)]
pub struct RQueryServiceStatus {
    pub service: ContextHandle,
}

impl RpcRequest for RQueryServiceStatus {
    const OPNUM: u16 = opnum::QUERY_SERVICE_STATUS;
    const NAME: &'static str = "RQueryServiceStatus";
    type Response = ServiceStatusResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.service)
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        ServiceStatusResponse::read(r)
    }
}

/// ROpenSCManagerW
#[derive(Debug, Clone, Default)]
pub struct ROpenSCManagerW {
    pub machine_name: Option<String>,
    /// `None` selects the active database
    pub database_name: Option<String>,
    pub desired_access: u32,
}

impl RpcRequest for ROpenSCManagerW {
    const OPNUM: u16 = opnum::OPEN_SC_MANAGER_W;
    const NAME: &'static str = "ROpenSCManagerW";
    type Response = HandleResponse<Win32Error>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        let machine_name = self.machine_name.as_deref().map(WString::from);
        let database_name = self.database_name.as_deref().map(WString::from);
        w.write_unique(machine_name.as_ref())?;
        w.write_unique(database_name.as_ref())?;
        w.write_u32(self.desired_access);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// ROpenServiceW
#[derive(Debug, Clone)]
pub struct ROpenServiceW {
    pub sc_manager: ContextHandle,
    pub service_name: String,
    pub desired_access: u32,
}

impl RpcRequest for ROpenServiceW {
    const OPNUM: u16 = opnum::OPEN_SERVICE_W;
    const NAME: &'static str = "ROpenServiceW";
    type Response = HandleResponse<Win32Error>;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.sc_manager)?;
        w.write_value(&WString::from(self.service_name.as_str()))?;
        w.write_u32(self.desired_access);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        HandleResponse::read(r)
    }
}

/// RQueryServiceConfigW
#[derive(Debug, Clone, Copy)]
pub struct RQueryServiceConfigW {
    pub service: ContextHandle,
    /// Size of the buffer offered to the server, at most [`MAX_CONFIG_BUFFER`]
    pub buffer_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryServiceConfigResponse {
    pub config: ServiceConfig,
    /// Buffer size the server needs when `error` is `ERROR_INSUFFICIENT_BUFFER`
    pub bytes_needed: u32,
    pub error: Win32Error,
}

impl RpcRequest for RQueryServiceConfigW {
    const OPNUM: u16 = opnum::QUERY_SERVICE_CONFIG_W;
    const NAME: &'static str = "RQueryServiceConfigW";
    type Response = QueryServiceConfigResponse;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.service)?;
        w.write_u32(self.buffer_size);
        Ok(())
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        Ok(QueryServiceConfigResponse {
            config: r.read_value()?,
            bytes_needed: r.read_u32()?,
            error: r.read_value()?,
        })
    }
}

/// RStartServiceW
#[derive(Debug, Clone)]
pub struct RStartServiceW {
    pub service: ContextHandle,
    pub arguments: Vec<String>,
}

impl RpcRequest for RStartServiceW {
    const OPNUM: u16 = opnum::START_SERVICE_W;
    const NAME: &'static str = "RStartServiceW";
    type Response = Win32Error;

    fn marshal(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_value(&self.service)?;
        w.write_count(self.arguments.len())?;
        if self.arguments.is_empty() {
            return w.write_unique::<ConformantArray<Option<WString>>>(None);
        }
        let argv = ConformantArray::new(
            self.arguments
                .iter()
                .map(|arg| Some(WString::from(arg.as_str())))
                .collect(),
        );
        w.write_unique(Some(&argv))
    }

    fn unmarshal_response(&self, r: &mut NdrReader) -> Result<Self::Response> {
        r.read_value()
    }
}
