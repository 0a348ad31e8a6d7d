//! Error taxonomy for the client.
//!
//! # Design
//! Every failure the pipeline can surface is one of four kinds, each carrying
//! the data a caller needs to act on it. `Api` gets the structured error body
//! the service returned, so callers branch on `code` rather than on prose.
//! All other non-success outcomes land in `Communication` with the raw status
//! and body for debugging.
//!
//! Filterable-attribute validation failures originate inside the serde
//! boundary, so they arrive as `Encoding` or `Decoding` values carrying one
//! of two fixed literal messages; [`Error::is_filter_validation`] matches
//! them so calling code never hard-codes the literals.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::filterable::{NO_FILTER_METHODS, PATTERNS_NOT_SPECIFIED};

/// Structured error body returned by the search service.
///
/// Error bodies are not guaranteed complete; any subset of fields may be
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code.as_deref().unwrap_or("unknown");
        let message = self.message.as_deref().unwrap_or("no message");
        write!(f, "{code}: {message}")
    }
}

/// Errors surfaced by the execution pipeline and its collaborators.
///
/// No kind is retried internally; every failure is returned synchronously
/// from the call that triggered it.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be serialized to its wire form.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A response body could not be parsed into the requested type, or a
    /// body was required but absent.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// A transport-level fault, or a >=400 response whose body is not a
    /// parsable [`ApiError`].
    #[error("communication failed: {0}")]
    Communication(String),

    /// A >=400 response with a parsable [`ApiError`] body.
    #[error("api error: {0}")]
    Api(ApiError),
}

impl Error {
    /// True when this failure was raised by filterable-attribute validation
    /// (empty pattern list, or a feature map with no enabled method).
    pub fn is_filter_validation(&self) -> bool {
        match self {
            Error::Encoding(msg) | Error::Decoding(msg) => {
                msg.contains(PATTERNS_NOT_SPECIFIED) || msg.contains(NO_FILTER_METHODS)
            }
            _ => false,
        }
    }
}
