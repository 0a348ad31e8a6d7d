//! In-memory fathom search service for integration tests.
//!
//! Implements the HTTP surface the client core talks to: index CRUD,
//! document add/get, substring search with a single-equality filter,
//! settings with structural validation, and a task log. Write operations
//! apply immediately and return an already-succeeded task summary.
//!
//! DTOs here are defined independently from the client crate on purpose;
//! integration tests catch schema drift between the two.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndex {
    pub uid: String,
    pub primary_key: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub uid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_uid: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The shape returned when an operation is accepted (`taskUid`, not `uid`).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub task_uid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_uid: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            task_uid: task.uid,
            index_uid: task.index_uid.clone(),
            status: task.status.clone(),
            kind: task.kind.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
}

type ApiFailure = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<T, ApiFailure>;

fn api_error(status: StatusCode, code: &str, message: String) -> ApiFailure {
    (
        status,
        Json(ErrorBody {
            message,
            code: code.to_string(),
            kind: "invalid_request".to_string(),
            link: format!("https://docs.fathom.dev/errors#{code}"),
        }),
    )
}

fn index_not_found(uid: &str) -> ApiFailure {
    api_error(
        StatusCode::NOT_FOUND,
        "index_not_found",
        format!("Index `{uid}` not found."),
    )
}

pub struct IndexState {
    pub info: Index,
    pub documents: Vec<Value>,
    pub settings: Value,
}

fn default_settings() -> Value {
    json!({
        "displayedAttributes": ["*"],
        "searchableAttributes": ["*"],
        "filterableAttributes": [],
        "sortableAttributes": [],
        "rankingRules": ["words", "typo", "proximity", "attribute", "sort", "exactness"],
    })
}

#[derive(Default)]
pub struct ServerState {
    pub indexes: HashMap<String, IndexState>,
    pub tasks: HashMap<u32, Task>,
    next_task_uid: u32,
}

impl ServerState {
    fn enqueue_task(&mut self, index_uid: Option<String>, kind: &str) -> TaskSummary {
        let task = Task {
            uid: self.next_task_uid,
            index_uid,
            status: "succeeded".to_string(),
            kind: kind.to_string(),
        };
        self.next_task_uid += 1;
        self.tasks.insert(task.uid, task.clone());
        TaskSummary::from(&task)
    }
}

pub type Db = Arc<RwLock<ServerState>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(ServerState::default()));
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/indexes", get(list_indexes).post(create_index))
        .route("/indexes/{uid}", get(get_index).delete(delete_index))
        .route("/indexes/{uid}/documents", post(add_documents))
        .route("/indexes/{uid}/documents/{doc_id}", get(get_document))
        .route("/indexes/{uid}/search", post(search))
        .route("/indexes/{uid}/settings", get(get_settings).put(update_settings))
        .route(
            "/indexes/{uid}/settings/filterable-attributes",
            get(get_filterable_attributes).put(update_filterable_attributes),
        )
        .route("/tasks/{uid}", get(get_task))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "available"}))
}

async fn version() -> Json<Value> {
    Json(json!({"pkgVersion": env!("CARGO_PKG_VERSION")}))
}

async fn list_indexes(State(db): State<Db>) -> Json<Vec<Index>> {
    let state = db.read().await;
    let mut indexes: Vec<Index> = state.indexes.values().map(|ix| ix.info.clone()).collect();
    indexes.sort_by(|a, b| a.uid.cmp(&b.uid));
    Json(indexes)
}

async fn create_index(
    State(db): State<Db>,
    Json(input): Json<CreateIndex>,
) -> ApiResult<(StatusCode, Json<TaskSummary>)> {
    let mut state = db.write().await;
    if state.indexes.contains_key(&input.uid) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "index_already_exists",
            format!("Index `{}` already exists.", input.uid),
        ));
    }
    let info = Index {
        uid: input.uid.clone(),
        primary_key: input.primary_key,
    };
    state.indexes.insert(
        input.uid.clone(),
        IndexState {
            info,
            documents: Vec::new(),
            settings: default_settings(),
        },
    );
    let task = state.enqueue_task(Some(input.uid), "indexCreation");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_index(State(db): State<Db>, Path(uid): Path<String>) -> ApiResult<Json<Index>> {
    let state = db.read().await;
    state
        .indexes
        .get(&uid)
        .map(|ix| Json(ix.info.clone()))
        .ok_or_else(|| index_not_found(&uid))
}

async fn delete_index(
    State(db): State<Db>,
    Path(uid): Path<String>,
) -> ApiResult<(StatusCode, Json<TaskSummary>)> {
    let mut state = db.write().await;
    if state.indexes.remove(&uid).is_none() {
        return Err(index_not_found(&uid));
    }
    let task = state.enqueue_task(Some(uid), "indexDeletion");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn add_documents(
    State(db): State<Db>,
    Path(uid): Path<String>,
    Json(documents): Json<Vec<Value>>,
) -> ApiResult<(StatusCode, Json<TaskSummary>)> {
    let mut state = db.write().await;
    let index = state.indexes.get_mut(&uid).ok_or_else(|| index_not_found(&uid))?;
    let primary_key = index
        .info
        .primary_key
        .clone()
        .unwrap_or_else(|| "id".to_string());

    for document in documents {
        let Some(doc_id) = document.get(&primary_key).map(key_as_string) else {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "missing_document_id",
                format!("Document is missing its `{primary_key}` field."),
            ));
        };
        // Upsert by primary key.
        match index
            .documents
            .iter_mut()
            .find(|existing| existing.get(&primary_key).map(key_as_string) == Some(doc_id.clone()))
        {
            Some(existing) => *existing = document,
            None => index.documents.push(document),
        }
    }
    let task = state.enqueue_task(Some(uid), "documentAdditionOrUpdate");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_document(
    State(db): State<Db>,
    Path((uid, doc_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    let index = state.indexes.get(&uid).ok_or_else(|| index_not_found(&uid))?;
    let primary_key = index.info.primary_key.as_deref().unwrap_or("id");
    index
        .documents
        .iter()
        .find(|doc| doc.get(primary_key).map(key_as_string) == Some(doc_id.clone()))
        .map(|doc| Json(doc.clone()))
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "document_not_found",
                format!("Document `{doc_id}` not found."),
            )
        })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub attributes_to_retrieve: Option<Vec<String>>,
}

async fn search(
    State(db): State<Db>,
    Path(uid): Path<String>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    let index = state.indexes.get(&uid).ok_or_else(|| index_not_found(&uid))?;

    let filter = match &request.filter {
        Some(raw) => {
            let Some((field, value)) = parse_filter(raw) else {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_search_filter",
                    format!("Could not parse filter `{raw}`."),
                ));
            };
            if !field_is_filterable(&index.settings, &field) {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_search_filter",
                    format!("Attribute `{field}` is not filterable."),
                ));
            }
            Some((field, value))
        }
        None => None,
    };

    let needle = request.q.as_deref().unwrap_or("").to_lowercase();
    let matches: Vec<&Value> = index
        .documents
        .iter()
        .filter(|doc| needle.is_empty() || value_matches(doc, &needle))
        .filter(|doc| match &filter {
            Some((field, value)) => doc.get(field).map(key_as_string) == Some(value.clone()),
            None => true,
        })
        .collect();

    let limit = request.limit.unwrap_or(20);
    let offset = request.offset.unwrap_or(0);
    let total = matches.len();
    let hits: Vec<Value> = matches
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|doc| project(doc, request.attributes_to_retrieve.as_deref()))
        .collect();

    Ok(Json(json!({
        "hits": hits,
        "query": request.q.unwrap_or_default(),
        "processingTimeMs": 0,
        "limit": limit,
        "offset": offset,
        "estimatedTotalHits": total,
    })))
}

async fn get_settings(State(db): State<Db>, Path(uid): Path<String>) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    state
        .indexes
        .get(&uid)
        .map(|ix| Json(ix.settings.clone()))
        .ok_or_else(|| index_not_found(&uid))
}

async fn update_settings(
    State(db): State<Db>,
    Path(uid): Path<String>,
    Json(update): Json<Value>,
) -> ApiResult<(StatusCode, Json<TaskSummary>)> {
    let Value::Object(sections) = update else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "invalid_settings",
            "Settings must be an object.".to_string(),
        ));
    };
    if let Some(filterable) = sections.get("filterableAttributes") {
        validate_filterable(filterable)
            .map_err(|msg| api_error(StatusCode::BAD_REQUEST, "invalid_settings", msg))?;
    }

    let mut state = db.write().await;
    let index = state.indexes.get_mut(&uid).ok_or_else(|| index_not_found(&uid))?;
    // Present sections replace; absent sections stay untouched.
    for (section, value) in sections {
        index.settings[section] = value;
    }
    let task = state.enqueue_task(Some(uid), "settingsUpdate");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_filterable_attributes(
    State(db): State<Db>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    state
        .indexes
        .get(&uid)
        .map(|ix| Json(ix.settings["filterableAttributes"].clone()))
        .ok_or_else(|| index_not_found(&uid))
}

async fn update_filterable_attributes(
    State(db): State<Db>,
    Path(uid): Path<String>,
    Json(update): Json<Value>,
) -> ApiResult<(StatusCode, Json<TaskSummary>)> {
    validate_filterable(&update)
        .map_err(|msg| api_error(StatusCode::BAD_REQUEST, "invalid_settings", msg))?;
    let mut state = db.write().await;
    let index = state.indexes.get_mut(&uid).ok_or_else(|| index_not_found(&uid))?;
    index.settings["filterableAttributes"] = update;
    let task = state.enqueue_task(Some(uid), "settingsUpdate");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_task(State(db): State<Db>, Path(uid): Path<u32>) -> ApiResult<Json<Task>> {
    let state = db.read().await;
    state
        .tasks
        .get(&uid)
        .map(|task| Json(task.clone()))
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "task_not_found",
                format!("Task `{uid}` not found."),
            )
        })
}

/// Primary-key values may be strings or numbers; compare them as strings.
fn key_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_matches(item, needle)),
        Value::Object(map) => map.values().any(|item| value_matches(item, needle)),
        _ => false,
    }
}

/// Parse a `field = value` equality filter.
fn parse_filter(raw: &str) -> Option<(String, String)> {
    let (field, value) = raw.split_once('=')?;
    let field = field.trim();
    let value = value.trim().trim_matches('"').trim_matches('\'');
    if field.is_empty() || value.is_empty() {
        return None;
    }
    Some((field.to_string(), value.to_string()))
}

/// A field is filterable when some configured pattern names it, either
/// exactly or via a trailing-`*` prefix wildcard.
fn field_is_filterable(settings: &Value, field: &str) -> bool {
    let Some(attributes) = settings["filterableAttributes"].as_array() else {
        return false;
    };
    attributes.iter().any(|attribute| {
        let patterns: Vec<&str> = match attribute {
            Value::String(s) => vec![s.as_str()],
            Value::Object(map) => map
                .get("attributePatterns")
                .and_then(Value::as_array)
                .map(|patterns| patterns.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => field.starts_with(prefix),
            None => *pattern == field,
        })
    })
}

/// Structural validation of a filterable-attributes payload.
fn validate_filterable(value: &Value) -> Result<(), String> {
    let Some(items) = value.as_array() else {
        return Err("`filterableAttributes` must be an array.".to_string());
    };
    for item in items {
        match item {
            Value::String(_) => {}
            Value::Object(map) => {
                match map.get("attributePatterns").and_then(Value::as_array) {
                    Some(patterns) if !patterns.is_empty() => {}
                    _ => return Err("Patterns to filter for were not specified".to_string()),
                }
                if let Some(filter) = map
                    .get("features")
                    .and_then(|features| features.get("filter"))
                    .and_then(Value::as_object)
                {
                    if !filter.values().any(|flag| flag.as_bool() == Some(true)) {
                        return Err("No filtration methods were allowed".to_string());
                    }
                }
            }
            _ => {
                return Err(
                    "`filterableAttributes` entries must be strings or objects.".to_string(),
                )
            }
        }
    }
    Ok(())
}

fn project(document: &Value, attributes: Option<&[String]>) -> Value {
    match (document, attributes) {
        (Value::Object(map), Some(wanted)) if !wanted.iter().any(|a| a == "*") => Value::Object(
            map.iter()
                .filter(|(key, _)| wanted.iter().any(|a| a == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        _ => document.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_serializes_with_camel_case_key() {
        let index = Index {
            uid: "movies".to_string(),
            primary_key: Some("id".to_string()),
        };
        let wire = serde_json::to_value(&index).unwrap();
        assert_eq!(wire, json!({"uid": "movies", "primaryKey": "id"}));
    }

    #[test]
    fn task_summary_uses_task_uid_key() {
        let task = Task {
            uid: 4,
            index_uid: Some("movies".to_string()),
            status: "succeeded".to_string(),
            kind: "settingsUpdate".to_string(),
        };
        let wire = serde_json::to_value(TaskSummary::from(&task)).unwrap();
        assert_eq!(wire["taskUid"], 4);
        assert_eq!(wire["type"], "settingsUpdate");
    }

    #[test]
    fn validate_filterable_accepts_both_wire_shapes() {
        let value = json!([
            "genre",
            {"attributePatterns": ["release_*"], "features": {"facetSearch": true}}
        ]);
        assert!(validate_filterable(&value).is_ok());
    }

    #[test]
    fn validate_filterable_rejects_missing_patterns() {
        let value = json!([{"features": {"facetSearch": true}}]);
        let msg = validate_filterable(&value).unwrap_err();
        assert!(msg.contains("Patterns to filter for were not specified"));
    }

    #[test]
    fn validate_filterable_rejects_all_disabled_filters() {
        let value = json!([
            {"attributePatterns": ["a"], "features": {"filter": {"equality": false}}}
        ]);
        let msg = validate_filterable(&value).unwrap_err();
        assert!(msg.contains("No filtration methods were allowed"));
    }

    #[test]
    fn filterable_patterns_match_exact_and_prefix() {
        let settings = json!({"filterableAttributes": ["genre", {"attributePatterns": ["release_*"]}]});
        assert!(field_is_filterable(&settings, "genre"));
        assert!(field_is_filterable(&settings, "release_year"));
        assert!(!field_is_filterable(&settings, "title"));
    }

    #[test]
    fn equality_filter_parses_quoted_values() {
        assert_eq!(
            parse_filter("genre = \"drama\""),
            Some(("genre".to_string(), "drama".to_string()))
        );
        assert!(parse_filter("genre").is_none());
    }
}
