//! RPC call framing
//!
//! An [`RpcCall`] binds an operation number to an encode closure and a
//! decode closure. It produces the request stub, dispatches it through a
//! transport and decodes the response stub. The PDU header, fragmentation
//! and the opnum field placement are the transport's business.
//!
//! Most callers implement [`RpcRequest`] on a message struct and use
//! [`call`].

use crate::error::Result;
use crate::transport::{RpcTransport, StubRequest};
use bytes::Bytes;
use msrpc_ndr::{ContextHandle, NdrLimits, NdrReader, NdrUnmarshal, NdrWriter};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// One request message of an RPC interface
///
/// The request decodes its own response so that request parameters, such as
/// an information class, can steer decoding.
pub trait RpcRequest {
    /// Operation number within the interface
    const OPNUM: u16;

    /// Operation name, used in logs and errors
    const NAME: &'static str;

    type Response;

    /// Encode the input parameters in declaration order
    fn marshal(&self, w: &mut NdrWriter) -> msrpc_ndr::Result<()>;

    /// Decode the output parameters and the trailing return value
    fn unmarshal_response(&self, r: &mut NdrReader) -> msrpc_ndr::Result<Self::Response>;
}

/// A single request/response exchange
pub struct RpcCall<E, D, T> {
    opnum: u16,
    name: &'static str,
    encode: E,
    decode: D,
    limits: NdrLimits,
    _response: PhantomData<fn() -> T>,
}

impl<E, D, T> RpcCall<E, D, T>
where
    E: Fn(&mut NdrWriter) -> msrpc_ndr::Result<()>,
    D: Fn(&mut NdrReader) -> msrpc_ndr::Result<T>,
{
    /// Create a call for `opnum` from its encode and decode closures
    pub fn new(opnum: u16, encode: E, decode: D) -> Self {
        Self {
            opnum,
            name: "rpc call",
            encode,
            decode,
            limits: NdrLimits::default(),
            _response: PhantomData,
        }
    }

    /// Name the call in log output
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Replace the decode limits applied to the response
    pub fn with_limits(mut self, limits: NdrLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn opnum(&self) -> u16 {
        self.opnum
    }

    /// Encode the request stub
    pub fn build_request(&self) -> Result<StubRequest> {
        let mut w = NdrWriter::new();
        (self.encode)(&mut w)?;
        Ok(StubRequest::new(self.opnum, w.into_bytes()))
    }

    /// Decode a response stub
    ///
    /// Bytes left over after the decoder finishes are ignored.
    pub fn parse_response(&self, stub: Bytes) -> Result<T> {
        let mut r = NdrReader::new(stub).with_limits(self.limits);
        let response = (self.decode)(&mut r)?;
        if r.remaining() > 0 {
            trace!(
                "{}: {} trailing bytes after response",
                self.name,
                r.remaining()
            );
        }
        Ok(response)
    }

    /// Encode, send, and decode
    pub fn invoke<X: RpcTransport + ?Sized>(&self, transport: &X) -> Result<T> {
        let request = self.build_request()?;
        debug!(
            "Sending {}: opnum={}, stub_len={}",
            self.name,
            request.opnum,
            request.stub.len()
        );

        let response = transport.call(&request)?;
        trace!("{} response: {} bytes", self.name, response.len());

        self.parse_response(response)
    }
}

/// Output of the open and close calls: a context handle and the return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleResponse<S> {
    pub handle: ContextHandle,
    pub status: S,
}

impl<S: NdrUnmarshal + Default> HandleResponse<S> {
    pub fn read(r: &mut NdrReader) -> msrpc_ndr::Result<Self> {
        Ok(Self {
            handle: r.read_value()?,
            status: r.read_value()?,
        })
    }
}

/// Build the [`RpcCall`] for a request message
pub fn request_call<R: RpcRequest>(
    request: &R,
) -> RpcCall<
    impl Fn(&mut NdrWriter) -> msrpc_ndr::Result<()> + '_,
    impl Fn(&mut NdrReader) -> msrpc_ndr::Result<R::Response> + '_,
    R::Response,
> {
    RpcCall::new(
        R::OPNUM,
        move |w: &mut NdrWriter| request.marshal(w),
        move |r: &mut NdrReader| request.unmarshal_response(r),
    )
    .named(R::NAME)
}

/// Send a request message and decode its response
pub fn call<X, R>(transport: &X, request: &R) -> Result<R::Response>
where
    X: RpcTransport + ?Sized,
    R: RpcRequest,
{
    request_call(request).invoke(transport)
}
