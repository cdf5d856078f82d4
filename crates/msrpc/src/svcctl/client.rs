//! Service Control Manager client

use super::protocol::*;
use crate::call::{call, RpcRequest};
use crate::error::Result;
use crate::status::Win32Error;
use crate::transport::RpcTransport;
use msrpc_ndr::{ContextHandle, WString};
use tracing::debug;

/// Decoded service configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceConfiguration {
    pub service_type: u32,
    pub start_type: u32,
    pub error_control: u32,
    pub binary_path_name: String,
    pub load_order_group: String,
    pub tag_id: u32,
    pub dependencies: Vec<String>,
    pub service_start_name: String,
    pub display_name: String,
}

impl From<ServiceConfig> for ServiceConfiguration {
    fn from(config: ServiceConfig) -> Self {
        fn text(value: Option<WString>) -> String {
            value.map(WString::into_string).unwrap_or_default()
        }

        // Dependencies arrive as one string with '/' or NUL separators
        let dependencies = text(config.dependencies)
            .split(['\0', '/'])
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        Self {
            service_type: config.service_type,
            start_type: config.start_type,
            error_control: config.error_control,
            binary_path_name: text(config.binary_path_name),
            load_order_group: text(config.load_order_group),
            tag_id: config.tag_id,
            dependencies,
            service_start_name: text(config.service_start_name),
            display_name: text(config.display_name),
        }
    }
}

/// Service Control Manager client
pub struct ServiceControlClient<T> {
    transport: T,
}

impl<T: RpcTransport> ServiceControlClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open the service control manager of `machine_name` (or the bound host)
    pub fn open_sc_manager(&self, machine_name: Option<&str>, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &ROpenSCManagerW {
                machine_name: machine_name.map(str::to_owned),
                database_name: None,
                desired_access,
            },
        )?;
        response.status.check(ROpenSCManagerW::NAME)?;
        debug!("Opened service control manager: access=0x{:08x}", desired_access);
        Ok(response.handle)
    }

    pub fn open_service(&self, sc_manager: &ContextHandle, service_name: &str, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &ROpenServiceW {
                sc_manager: *sc_manager,
                service_name: service_name.to_owned(),
                desired_access,
            },
        )?;
        response.status.check(ROpenServiceW::NAME)?;
        debug!("Opened service {}", service_name);
        Ok(response.handle)
    }

    /// Close a manager or service handle
    pub fn close(&self, handle: ContextHandle) -> Result<()> {
        let response = call(&self.transport, &RCloseServiceHandle { handle })?;
        response.status.check(RCloseServiceHandle::NAME)?;
        debug!("Closed service handle {:?}", handle);
        Ok(())
    }

    pub fn query_status(&self, service: &ContextHandle) -> Result<ServiceStatus> {
        let response = call(&self.transport, &RQueryServiceStatus { service: *service })?;
        response.error.check(RQueryServiceStatus::NAME)?;
        Ok(response.status)
    }

    /// Send a [`control`] code; returns the status the service reported
    pub fn control(&self, service: &ContextHandle, control: u32) -> Result<ServiceStatus> {
        let response = call(
            &self.transport,
            &RControlService {
                service: *service,
                control,
            },
        )?;
        response.error.check(RControlService::NAME)?;
        debug!("Sent control 0x{:x} to service", control);
        Ok(response.status)
    }

    pub fn stop(&self, service: &ContextHandle) -> Result<ServiceStatus> {
        self.control(service, control::STOP)
    }

    pub fn start(&self, service: &ContextHandle, arguments: &[&str]) -> Result<()> {
        let error = call(
            &self.transport,
            &RStartServiceW {
                service: *service,
                arguments: arguments.iter().map(|arg| arg.to_string()).collect(),
            },
        )?;
        error.check(RStartServiceW::NAME)?;
        debug!("Started service with {} arguments", arguments.len());
        Ok(())
    }

    /// Query the configuration, growing the buffer when the server asks for more
    pub fn query_config(&self, service: &ContextHandle) -> Result<ServiceConfiguration> {
        let mut buffer_size = 0;
        loop {
            let response = call(
                &self.transport,
                &RQueryServiceConfigW {
                    service: *service,
                    buffer_size,
                },
            )?;
            if response.error == Win32Error::INSUFFICIENT_BUFFER
                && buffer_size < response.bytes_needed
                && response.bytes_needed <= MAX_CONFIG_BUFFER
            {
                debug!(
                    "{} needs {} bytes, retrying",
                    RQueryServiceConfigW::NAME,
                    response.bytes_needed
                );
                buffer_size = response.bytes_needed;
                continue;
            }
            response.error.check(RQueryServiceConfigW::NAME)?;
            return Ok(response.config.into());
        }
    }

    /// Open a service by name, query its status and close both handles
    pub fn service_status(&self, service_name: &str) -> Result<ServiceStatus> {
        self.with_service(service_name, access::SERVICE_QUERY_STATUS, |service| {
            self.query_status(service)
        })
    }

    /// Open a service by name, query its configuration and close both handles
    pub fn service_config(&self, service_name: &str) -> Result<ServiceConfiguration> {
        self.with_service(service_name, access::SERVICE_QUERY_CONFIG, |service| {
            self.query_config(service)
        })
    }

    fn with_service<R, F>(&self, service_name: &str, desired_access: u32, f: F) -> Result<R>
    where
        F: FnOnce(&ContextHandle) -> Result<R>,
    {
        let sc_manager = self.open_sc_manager(None, access::SC_MANAGER_CONNECT)?;
        let result = self
            .open_service(&sc_manager, service_name, desired_access)
            .and_then(|service| {
                let result = f(&service);
                let closed = self.close(service);
                result.and_then(|value| closed.map(|()| value))
            });
        let closed = self.close(sc_manager);
        result.and_then(|value| closed.map(|()| value))
    }
}
