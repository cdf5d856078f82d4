//! Shared test fixtures
//!
//! - [`ScriptedTransport`]: records every request stub and answers with
//!   queued response stubs, in order
//! - [`StubBuilder`]: assembles response stubs by hand, with NDR alignment
//! - [`init_logging`]: routes `tracing` output to the test harness

#![allow(dead_code)]

use std::collections::VecDeque;

use bytes::Bytes;
use msrpc::{RpcTransport, StubRequest, TransportError};
use msrpc_ndr::{ContextHandle, NdrMarshal, NdrWriter};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once per test binary
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// A handle whose bytes are all `fill`
pub fn handle(fill: u8) -> ContextHandle {
    ContextHandle::from_bytes([fill; 20])
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<Bytes, TransportError>>,
    requests: Vec<StubRequest>,
}

/// In-memory transport replaying a fixed conversation
///
/// Running out of responses is reported as `ConnectionClosed`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response stub
    pub fn respond(&self, stub: Bytes) -> &Self {
        self.script.lock().responses.push_back(Ok(stub));
        self
    }

    /// Queue a transport failure
    pub fn fail(&self, error: TransportError) -> &Self {
        self.script.lock().responses.push_back(Err(error));
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<StubRequest> {
        self.script.lock().requests.clone()
    }

    pub fn opnums(&self) -> Vec<u16> {
        self.script.lock().requests.iter().map(|r| r.opnum).collect()
    }

    /// Responses not yet consumed
    pub fn pending(&self) -> usize {
        self.script.lock().responses.len()
    }
}

impl RpcTransport for ScriptedTransport {
    fn call(&self, request: &StubRequest) -> Result<Bytes, TransportError> {
        let mut script = self.script.lock();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .unwrap_or(Err(TransportError::ConnectionClosed))
    }
}

/// Hand-assembled NDR stub
///
/// Fields are aligned as NDR requires; referent IDs are whatever the caller
/// writes.
#[derive(Default)]
pub struct StubBuilder {
    w: NdrWriter,
}

impl StubBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.w.write_u16(value);
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.w.write_u32(value);
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.w.write_i32(value);
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.w.write_bytes(bytes);
        self
    }

    pub fn handle(self, handle: &ContextHandle) -> Self {
        self.bytes(handle.as_bytes())
    }

    /// A raw referent ID; 0 for null
    pub fn referent(self, id: u32) -> Self {
        self.u32(id)
    }

    /// Conformant varying UTF-16 string body with a terminator
    pub fn wstring(mut self, value: &str) -> Self {
        let mut units: Vec<u16> = value.encode_utf16().collect();
        units.push(0);
        self.w.write_u32(units.len() as u32);
        self.w.write_u32(0);
        self.w.write_u32(units.len() as u32);
        self.w.write_utf16(&units);
        self
    }

    /// `RPC_SID` as a pointee: conformance count, then the body
    pub fn sid(mut self, authority: u8, sub_authorities: &[u32]) -> Self {
        self.w.write_u32(sub_authorities.len() as u32);
        self.w.write_u8(1);
        self.w.write_u8(sub_authorities.len() as u8);
        self.w.write_bytes(&[0, 0, 0, 0, 0, authority]);
        for sub_authority in sub_authorities {
            self.w.write_u32(*sub_authority);
        }
        self
    }

    /// Encode a value with the codec itself
    pub fn value<T: NdrMarshal>(mut self, value: &T) -> Self {
        self.w.write_value(value).expect("encodable test value");
        self
    }

    pub fn unique<T: NdrMarshal>(mut self, value: Option<&T>) -> Self {
        self.w.write_unique(value).expect("encodable test value");
        self
    }

    pub fn build(self) -> Bytes {
        self.w.into_bytes()
    }
}

/// Response of an open or close call
pub fn handle_response(handle: &ContextHandle, status: u32) -> Bytes {
    StubBuilder::new().handle(handle).u32(status).build()
}
