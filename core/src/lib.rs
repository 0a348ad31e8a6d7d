//! Synchronous client core for the fathom document-search service.
//!
//! # Overview
//! Every typed call flows through one pipeline: the request factory encodes
//! the payload with a pluggable [`Codec`], a [`Transport`] performs the HTTP
//! round trip, and the [`Service`] template triages the response — decoding
//! successes and mapping every failure mode (transport fault, structured API
//! error, malformed body) into the [`Error`] taxonomy.
//!
//! # Design
//! - `Service` and `RequestFactory` are generic over `C: Codec`; the wire
//!   format is a construction-time choice, never a pipeline change.
//! - The `Transport` trait returns responses as plain data — 4xx/5xx are not
//!   transport errors — so status interpretation happens in exactly one
//!   place. A ureq-backed implementation ships in [`transport`].
//! - [`FilterableAttributes`] carries the string-or-object polymorphic wire
//!   shape through hand-written serde impls, validating its invariants on
//!   both encode and decode with one shared message vocabulary.
//! - `Client` is thin glue: one method per endpoint, each building a path
//!   and delegating. It holds no mutable state and is safe to share.

pub mod client;
pub mod codec;
pub mod error;
pub mod filterable;
pub mod http;
pub mod request;
pub mod service;
pub mod transport;
pub mod types;

pub use client::Client;
pub use codec::{Codec, JsonCodec};
pub use error::{ApiError, Error};
pub use filterable::FilterableAttributes;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Payload};
pub use request::RequestFactory;
pub use service::Service;
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Health, IndexConfig, IndexInfo, SearchQuery, SearchResults, Settings, Task, TaskRef, Version,
};
