//! Transport contract and the shipped ureq backend.
//!
//! # Design
//! The pipeline consumes four verb operations, each turning a request
//! descriptor into a response descriptor. A transport never interprets
//! status codes — 4xx/5xx responses come back as data, and only genuine
//! transport-level faults (connection refused, DNS failure, timeout,
//! malformed target, I/O mid-body) are errors. Timeout configuration lives
//! entirely inside the transport; the pipeline has none of its own.

use std::time::Duration;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// A transport-level fault, carrying the original diagnostic text.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends request descriptors over the network, one operation per verb.
pub trait Transport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
    fn put(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
    fn delete(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a ureq agent.
///
/// The agent is built with `http_status_as_error(false)` so non-2xx
/// responses are returned as data rather than `Err`, leaving status
/// interpretation to the service template.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// A transport whose calls fail after `timeout`, covering the whole
    /// round trip. A timed-out call surfaces as a [`TransportError`].
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.get(&request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        read_response(builder.call().map_err(fault)?)
    }

    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(&request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = match &request.body {
            Some(payload) => builder
                .content_type(payload.content_type)
                .send(payload.body.as_bytes()),
            None => builder.send_empty(),
        };
        read_response(response.map_err(fault)?)
    }

    fn put(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.put(&request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = match &request.body {
            Some(payload) => builder
                .content_type(payload.content_type)
                .send(payload.body.as_bytes()),
            None => builder.send_empty(),
        };
        read_response(response.map_err(fault)?)
    }

    fn delete(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.delete(&request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        read_response(builder.call().map_err(fault)?)
    }
}

fn fault(error: ureq::Error) -> TransportError {
    TransportError::new(error.to_string())
}

fn read_response(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(fault)?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
