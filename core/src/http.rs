//! Request and response descriptors for the execution pipeline.
//!
//! # Design
//! These types describe HTTP traffic as plain data. The request factory
//! builds `HttpRequest` values and the service template consumes
//! `HttpResponse` values; the only place actual I/O happens is behind the
//! `Transport` trait. Keeping both sides as owned, inert data makes every
//! stage of the pipeline testable without a network.
//!
//! All fields use owned types (`String`, `Vec`) so descriptors can be moved
//! freely between threads and logged after the fact.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// An encoded request body together with its declared content kind.
///
/// Produced by [`Codec::encode`](crate::codec::Codec::encode); the codec, not
/// the caller, decides the content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub body: String,
    pub content_type: &'static str,
}

/// An HTTP request described as plain data. Immutable once built.
///
/// Built by [`RequestFactory`](crate::request::RequestFactory) and executed
/// by a [`Transport`](crate::transport::Transport) implementation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Payload>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after a round trip, then handed to the
/// service template for status triage and decoding. An empty `body` string
/// means the server sent no body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
