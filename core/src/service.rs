//! The execution pipeline: one chokepoint for every typed request.
//!
//! # Design
//! `Service` composes a boxed transport with a codec chosen at construction
//! time and drives a strictly ordered pipeline: dispatch on the request's
//! verb, triage the status code, then decode — or map the failure into the
//! error taxonomy. The pipeline holds no per-call state and its methods take
//! `&self`, so one instance serves unlimited concurrent callers.
//!
//! Failure mapping, in order:
//! - any transport fault becomes [`Error::Communication`], never a panic;
//! - a >=400 response with a parsable [`ApiError`](crate::error::ApiError)
//!   body becomes [`Error::Api`];
//! - a >=400 response whose body is empty or unparsable degrades to
//!   [`Error::Communication`] carrying the raw status and body;
//! - an empty body where a result was expected is [`Error::Decoding`], never
//!   a silently absent value;
//! - codec decode failures surface unchanged.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::Codec;
use crate::error::{ApiError, Error};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Executes request descriptors against a transport and decodes the results.
pub struct Service<C> {
    transport: Box<dyn Transport>,
    codec: C,
}

impl<C: Codec> Service<C> {
    pub fn new(transport: impl Transport + 'static, codec: C) -> Self {
        Self {
            transport: Box::new(transport),
            codec,
        }
    }

    /// Execute a request and decode the response body into `R`.
    pub fn execute<R: DeserializeOwned>(&self, request: &HttpRequest) -> Result<R, Error> {
        let response = self.dispatch(request)?;
        self.check_status(&response)?;
        if response.body.is_empty() {
            return Err(Error::Decoding("expected a response body, got none".to_string()));
        }
        self.codec.decode(&response.body)
    }

    /// Execute a request whose result is not consumed (health probes, calls
    /// where only success matters). Any body content is ignored.
    pub fn execute_unit(&self, request: &HttpRequest) -> Result<(), Error> {
        let response = self.dispatch(request)?;
        self.check_status(&response)
    }

    /// Execute a request and return the raw body text without decoding.
    pub fn execute_text(&self, request: &HttpRequest) -> Result<String, Error> {
        let response = self.dispatch(request)?;
        self.check_status(&response)?;
        Ok(response.body)
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        debug!(method = ?request.method, path = %request.path, "dispatching request");
        let result = match request.method {
            HttpMethod::Get => self.transport.get(request),
            HttpMethod::Post => self.transport.post(request),
            HttpMethod::Put => self.transport.put(request),
            HttpMethod::Delete => self.transport.delete(request),
        };
        let response = result.map_err(|e| Error::Communication(e.to_string()))?;
        debug!(status = response.status, path = %request.path, "received response");
        Ok(response)
    }

    /// Triage a completed round trip. Below 400 the response proceeds to
    /// decoding; at or above it, a parsable error body wins over the raw
    /// status, and an unparsable one degrades to a communication failure
    /// instead of leaking an unrelated decode error.
    fn check_status(&self, response: &HttpResponse) -> Result<(), Error> {
        if response.status < 400 {
            return Ok(());
        }
        match self.codec.decode::<ApiError>(&response.body) {
            Ok(api_error) => Err(Error::Api(api_error)),
            Err(_) => Err(Error::Communication(format!(
                "unexpected status {}: {}",
                response.status, response.body
            ))),
        }
    }
}
