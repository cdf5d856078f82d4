//! Transport seam
//!
//! Connection setup, binding, PDU framing, fragmentation and authentication
//! all live behind [`RpcTransport`]. This crate only produces and consumes
//! stub data.

use crate::error::TransportError;
use bytes::Bytes;
use std::sync::Arc;

/// Request stub handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRequest {
    /// Operation number placed in the request PDU header
    pub opnum: u16,
    /// NDR-encoded input parameters
    pub stub: Bytes,
}

impl StubRequest {
    pub fn new(opnum: u16, stub: Bytes) -> Self {
        Self { opnum, stub }
    }
}

/// A bound connection to one RPC interface
///
/// `call` is one blocking request/response exchange and returns the response
/// stub data. Implementations shared between threads must serialize calls
/// themselves.
pub trait RpcTransport {
    fn call(&self, request: &StubRequest) -> Result<Bytes, TransportError>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for &T {
    fn call(&self, request: &StubRequest) -> Result<Bytes, TransportError> {
        (**self).call(request)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    fn call(&self, request: &StubRequest) -> Result<Bytes, TransportError> {
        (**self).call(request)
    }
}

impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    fn call(&self, request: &StubRequest) -> Result<Bytes, TransportError> {
        (**self).call(request)
    }
}
