//! Client facade over the execution pipeline.
//!
//! # Design
//! `Client` holds only a base URL, an optional API key, and the two core
//! collaborators (request factory and service). Every method is thin
//! pass-through glue: build a path, create a descriptor, execute. All design
//! weight lives in the codec, the filterable-attribute representation, and
//! the service template; nothing here retries, branches on status codes, or
//! touches JSON directly.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Codec, JsonCodec};
use crate::error::Error;
use crate::filterable::FilterableAttributes;
use crate::http::HttpMethod;
use crate::request::RequestFactory;
use crate::service::Service;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Health, IndexConfig, IndexInfo, SearchQuery, SearchResults, Settings, Task, TaskRef, Version,
};

/// Synchronous client for a fathom search service.
pub struct Client<C: Codec = JsonCodec> {
    base_url: String,
    api_key: Option<String>,
    factory: RequestFactory<C>,
    service: Service<C>,
}

impl Client<JsonCodec> {
    /// Client with the default JSON codec and ureq transport.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self::with_parts(base_url, api_key, UreqTransport::new(), JsonCodec)
    }
}

impl<C: Codec + Clone> Client<C> {
    /// Client with a caller-chosen transport and codec.
    pub fn with_parts(
        base_url: &str,
        api_key: Option<&str>,
        transport: impl Transport + 'static,
        codec: C,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            factory: RequestFactory::new(codec.clone()),
            service: Service::new(transport, codec),
        }
    }
}

impl<C: Codec> Client<C> {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn headers(&self) -> Vec<(String, String)> {
        match &self.api_key {
            Some(key) => vec![("Authorization".to_string(), format!("Bearer {key}"))],
            None => Vec::new(),
        }
    }

    fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, Error> {
        let request =
            self.factory
                .create::<()>(HttpMethod::Get, self.url(path), self.headers(), None)?;
        self.service.execute(&request)
    }

    fn send<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &T,
    ) -> Result<R, Error> {
        let request = self
            .factory
            .create(method, self.url(path), self.headers(), Some(body))?;
        self.service.execute(&request)
    }

    /// Probe service availability. Succeeds on any healthy response.
    pub fn health(&self) -> Result<(), Error> {
        let request =
            self.factory
                .create::<()>(HttpMethod::Get, self.url("/health"), self.headers(), None)?;
        self.service.execute_unit(&request)
    }

    /// Health with the response body decoded, for callers that display it.
    pub fn health_status(&self) -> Result<Health, Error> {
        self.get("/health")
    }

    pub fn version(&self) -> Result<Version, Error> {
        self.get("/version")
    }

    pub fn list_indexes(&self) -> Result<Vec<IndexInfo>, Error> {
        self.get("/indexes")
    }

    pub fn create_index(&self, uid: &str, primary_key: Option<&str>) -> Result<TaskRef, Error> {
        let body = IndexConfig {
            uid: uid.to_string(),
            primary_key: primary_key.map(str::to_string),
        };
        self.send(HttpMethod::Post, "/indexes", &body)
    }

    pub fn get_index(&self, uid: &str) -> Result<IndexInfo, Error> {
        self.get(&format!("/indexes/{uid}"))
    }

    pub fn delete_index(&self, uid: &str) -> Result<TaskRef, Error> {
        let request = self.factory.create::<()>(
            HttpMethod::Delete,
            self.url(&format!("/indexes/{uid}")),
            self.headers(),
            None,
        )?;
        self.service.execute(&request)
    }

    /// Add or replace documents. Documents are upserted by the index's
    /// primary key.
    pub fn add_documents<T: Serialize>(
        &self,
        index_uid: &str,
        documents: &[T],
    ) -> Result<TaskRef, Error> {
        self.send(
            HttpMethod::Post,
            &format!("/indexes/{index_uid}/documents"),
            documents,
        )
    }

    pub fn get_document<T: DeserializeOwned>(
        &self,
        index_uid: &str,
        document_id: &str,
    ) -> Result<T, Error> {
        self.get(&format!("/indexes/{index_uid}/documents/{document_id}"))
    }

    pub fn search<T: DeserializeOwned>(
        &self,
        index_uid: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults<T>, Error> {
        self.send(HttpMethod::Post, &format!("/indexes/{index_uid}/search"), query)
    }

    pub fn get_settings(&self, index_uid: &str) -> Result<Settings, Error> {
        self.get(&format!("/indexes/{index_uid}/settings"))
    }

    pub fn update_settings(&self, index_uid: &str, settings: &Settings) -> Result<TaskRef, Error> {
        self.send(
            HttpMethod::Put,
            &format!("/indexes/{index_uid}/settings"),
            settings,
        )
    }

    pub fn get_filterable_attributes(
        &self,
        index_uid: &str,
    ) -> Result<Vec<FilterableAttributes>, Error> {
        self.get(&format!("/indexes/{index_uid}/settings/filterable-attributes"))
    }

    pub fn update_filterable_attributes(
        &self,
        index_uid: &str,
        attributes: &[FilterableAttributes],
    ) -> Result<TaskRef, Error> {
        self.send(
            HttpMethod::Put,
            &format!("/indexes/{index_uid}/settings/filterable-attributes"),
            attributes,
        )
    }

    pub fn get_task(&self, task_uid: u32) -> Result<Task, Error> {
        self.get(&format!("/tasks/{task_uid}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::transport::TransportError;
    use std::sync::{Arc, Mutex};

    /// Transport that records every request and answers with a canned body.
    struct RecordingTransport {
        seen: Arc<Mutex<Vec<HttpRequest>>>,
        status: u16,
        body: &'static str,
    }

    impl RecordingTransport {
        fn record(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.to_string(),
            })
        }
    }

    impl Transport for RecordingTransport {
        fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.record(request)
        }
        fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.record(request)
        }
        fn put(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.record(request)
        }
        fn delete(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.record(request)
        }
    }

    fn client_with(
        api_key: Option<&str>,
        status: u16,
        body: &'static str,
    ) -> (Client, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = RecordingTransport {
            seen: Arc::clone(&seen),
            status,
            body,
        };
        let client = Client::with_parts("http://localhost:7700/", api_key, transport, JsonCodec);
        (client, seen)
    }

    const TASK_BODY: &str =
        r#"{"taskUid":1,"indexUid":"movies","status":"succeeded","type":"indexCreation"}"#;

    #[test]
    fn trailing_slash_is_stripped() {
        let (client, seen) = client_with(None, 200, "{\"status\":\"available\"}");
        client.health().unwrap();
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].path, "http://localhost:7700/health");
    }

    #[test]
    fn api_key_becomes_bearer_header() {
        let (client, seen) = client_with(Some("masterKey"), 200, "{\"status\":\"available\"}");
        client.health().unwrap();
        let requests = seen.lock().unwrap();
        assert_eq!(
            requests[0].headers,
            vec![("Authorization".to_string(), "Bearer masterKey".to_string())]
        );
    }

    #[test]
    fn no_api_key_means_no_headers() {
        let (client, seen) = client_with(None, 200, "{\"status\":\"available\"}");
        client.health().unwrap();
        assert!(seen.lock().unwrap()[0].headers.is_empty());
    }

    #[test]
    fn create_index_posts_config_body() {
        let (client, seen) = client_with(None, 202, TASK_BODY);
        client.create_index("movies", Some("id")).unwrap();
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "http://localhost:7700/indexes");
        let body: serde_json::Value =
            serde_json::from_str(&requests[0].body.as_ref().unwrap().body).unwrap();
        assert_eq!(body, serde_json::json!({"uid": "movies", "primaryKey": "id"}));
    }

    #[test]
    fn delete_index_sends_no_body() {
        let (client, seen) = client_with(None, 202, TASK_BODY);
        client.delete_index("movies").unwrap();
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert_eq!(requests[0].path, "http://localhost:7700/indexes/movies");
        assert!(requests[0].body.is_none());
    }

    #[test]
    fn search_posts_query_body() {
        let (client, seen) = client_with(
            None,
            200,
            r#"{"hits":[],"query":"carol","processingTimeMs":1,"limit":20,"offset":0,"estimatedTotalHits":0}"#,
        );
        let results: SearchResults<serde_json::Value> = client
            .search("movies", &SearchQuery::new("carol").limit(20))
            .unwrap();
        assert!(results.hits.is_empty());
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].path, "http://localhost:7700/indexes/movies/search");
        let body: serde_json::Value =
            serde_json::from_str(&requests[0].body.as_ref().unwrap().body).unwrap();
        assert_eq!(body, serde_json::json!({"q": "carol", "limit": 20}));
    }

    #[test]
    fn update_filterable_attributes_puts_encoded_array() {
        let (client, seen) = client_with(None, 202, TASK_BODY);
        let attributes = vec![
            FilterableAttributes::new("genre"),
            FilterableAttributes::with_patterns(["release_*"]).facet_search(true),
        ];
        client
            .update_filterable_attributes("movies", &attributes)
            .unwrap();
        let requests = seen.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(
            requests[0].path,
            "http://localhost:7700/indexes/movies/settings/filterable-attributes"
        );
        let body: serde_json::Value =
            serde_json::from_str(&requests[0].body.as_ref().unwrap().body).unwrap();
        assert_eq!(
            body,
            serde_json::json!([
                "genre",
                {"attributePatterns": ["release_*"], "features": {"facetSearch": true}}
            ])
        );
    }

    #[test]
    fn invalid_filterable_attributes_fail_before_any_request() {
        let (client, seen) = client_with(None, 202, TASK_BODY);
        let attributes = vec![FilterableAttributes::with_patterns(Vec::<String>::new())];
        let err = client
            .update_filterable_attributes("movies", &attributes)
            .unwrap_err();
        assert!(err.is_filter_validation());
        assert!(matches!(err, Error::Encoding(_)));
        assert!(seen.lock().unwrap().is_empty(), "nothing should reach the wire");
    }

    #[test]
    fn get_task_builds_task_path() {
        let (client, seen) = client_with(
            None,
            200,
            r#"{"uid":9,"indexUid":"movies","status":"succeeded","type":"settingsUpdate"}"#,
        );
        let task = client.get_task(9).unwrap();
        assert_eq!(task.uid, 9);
        assert_eq!(seen.lock().unwrap()[0].path, "http://localhost:7700/tasks/9");
    }
}
