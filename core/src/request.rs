//! Request factory: typed values in, request descriptors out.
//!
//! # Design
//! A pure function of its inputs — no I/O, no retries, no state beyond the
//! codec it encodes with. A `None` body skips encoding entirely and leaves
//! the descriptor body absent; encoding failures propagate as-is, never
//! reinterpreted.

use serde::Serialize;

use crate::codec::Codec;
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest};

/// Builds transport-agnostic request descriptors.
#[derive(Debug, Clone)]
pub struct RequestFactory<C> {
    codec: C,
}

impl<C: Codec> RequestFactory<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Build a request descriptor, encoding `body` through the codec.
    pub fn create<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Option<&T>,
    ) -> Result<HttpRequest, Error> {
        let body = match body {
            Some(value) => Some(self.codec.encode(value)?),
            None => None,
        };
        Ok(HttpRequest {
            method,
            path: path.into(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use std::collections::HashMap;

    fn factory() -> RequestFactory<JsonCodec> {
        RequestFactory::new(JsonCodec)
    }

    #[test]
    fn body_is_encoded_with_content_type() {
        let mut doc = HashMap::new();
        doc.insert("title", "Carol");
        let req = factory()
            .create(
                HttpMethod::Post,
                "http://localhost:7700/indexes",
                Vec::new(),
                Some(&doc),
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        let payload = req.body.unwrap();
        assert_eq!(payload.content_type, "application/json");
        assert_eq!(payload.body, r#"{"title":"Carol"}"#);
    }

    #[test]
    fn absent_body_skips_encoding() {
        let req = factory()
            .create::<()>(
                HttpMethod::Get,
                "http://localhost:7700/health",
                Vec::new(),
                None,
            )
            .unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn headers_pass_through_unchanged() {
        let headers = vec![("Authorization".to_string(), "Bearer key".to_string())];
        let req = factory()
            .create::<()>(HttpMethod::Delete, "/indexes/movies", headers.clone(), None)
            .unwrap();
        assert_eq!(req.headers, headers);
    }

    #[test]
    fn encoding_failure_propagates_unchanged() {
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let err = factory()
            .create(HttpMethod::Post, "/indexes", Vec::new(), Some(&bad))
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
