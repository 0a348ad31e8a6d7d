//! Pluggable codec between typed values and wire payloads.
//!
//! # Design
//! The service template and request factory are generic over `C: Codec`, so a
//! different wire format is a construction-time choice, never a pipeline
//! change. Shape information for decoding is supplied at the call site as a
//! type parameter (`decode::<Vec<IndexInfo>>(..)`), which covers concrete
//! records and generic containers alike.
//!
//! Implementations must round-trip any value they can encode, but are not
//! required to produce byte-identical output — field ordering and whitespace
//! may differ between implementations.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::http::Payload;

/// Encodes typed values into wire payloads and decodes wire text back.
pub trait Codec: Send + Sync {
    /// Content kind declared on payloads this codec produces.
    fn content_type(&self) -> &'static str;

    /// Encode a value into a wire payload.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Payload, Error>;

    /// Decode wire text into a value of the requested type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, Error>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Payload, Error> {
        let body = serde_json::to_string(value).map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(Payload {
            body,
            content_type: self.content_type(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, Error> {
        serde_json::from_str(text).map_err(|e| Error::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Movie {
        id: u32,
        title: String,
    }

    #[test]
    fn record_roundtrips() {
        let movie = Movie {
            id: 7,
            title: "Carol".to_string(),
        };
        let payload = JsonCodec.encode(&movie).unwrap();
        assert_eq!(payload.content_type, "application/json");
        let decoded: Movie = JsonCodec.decode(&payload.body).unwrap();
        assert_eq!(decoded, movie);
    }

    #[test]
    fn generic_containers_decode_with_call_site_types() {
        let list: Vec<Movie> = JsonCodec
            .decode(r#"[{"id":1,"title":"a"},{"id":2,"title":"b"}]"#)
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].title, "b");

        let map: HashMap<String, u32> = JsonCodec.decode(r#"{"one":1,"two":2}"#).unwrap();
        assert_eq!(map["two"], 2);
    }

    #[test]
    fn unparsable_text_is_a_decoding_error() {
        let err = JsonCodec.decode::<Movie>("not json").unwrap_err();
        assert!(matches!(err, Error::Decoding(_)));
    }

    #[test]
    fn empty_text_is_a_decoding_error() {
        let err = JsonCodec.decode::<Movie>("").unwrap_err();
        assert!(matches!(err, Error::Decoding(_)));
    }

    #[test]
    fn unserializable_value_is_an_encoding_error() {
        // serde_json rejects maps with non-string keys at serialization time.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], "x");
        let err = JsonCodec.encode(&bad).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
