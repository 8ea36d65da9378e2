//! Shared fixtures for avrobus integration tests
//!
//! - [`Metric`]: a self-describing record type
//! - [`MockRegistry`]: a Confluent-compatible registry served by axum on a
//!   random local port, counting the requests it receives

#![allow(dead_code)]

use apache_avro::Schema;
use async_trait::async_trait;
use avrobus::{AvroRecord, RegistryError, RegistryResult, SchemaId, SchemaRegistryClient};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Once};
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize test logging (idempotent)
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("avrobus=debug".parse().unwrap()),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const METRIC_SCHEMA: &str = r#"{
    "namespace": "metrics",
    "type": "record",
    "name": "Timings",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "timings", "type": {"type": "array", "items": "long"}}
    ]
}"#;

static METRIC: LazyLock<Schema> = LazyLock::new(|| Schema::parse_str(METRIC_SCHEMA).unwrap());

/// Timings reported by one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub timings: Vec<i64>,
}

impl Metric {
    pub fn new(id: i64, timings: Vec<i64>) -> Self {
        Self { id, timings }
    }
}

impl AvroRecord for Metric {
    fn schema(&self) -> &Schema {
        &METRIC
    }
}

pub const NOTE_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Note",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "text", "type": ["string", "null"]}
    ]
}"#;

static NOTE: LazyLock<Schema> = LazyLock::new(|| Schema::parse_str(NOTE_SCHEMA).unwrap());

/// Record with an optional field whose union lists `null` second
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub text: Option<String>,
}

impl AvroRecord for Note {
    fn schema(&self) -> &Schema {
        &NOTE
    }
}

/// Registry whose every call fails with a fixed error
pub struct FailingRegistry {
    pub calls: AtomicUsize,
    make_error: fn() -> RegistryError,
}

impl FailingRegistry {
    pub fn new(make_error: fn() -> RegistryError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            make_error,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaRegistryClient for FailingRegistry {
    async fn register(&self, _subject: &str, _schema: &Schema) -> RegistryResult<SchemaId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make_error)())
    }

    async fn get_by_id(&self, _id: SchemaId) -> RegistryResult<Arc<Schema>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make_error)())
    }
}

/// Counters and stored schemas of a [`MockRegistry`]
#[derive(Default)]
pub struct MockState {
    /// Schema text by id - 1
    schemas: Mutex<Vec<String>>,
    pub register_hits: AtomicUsize,
    pub lookup_hits: AtomicUsize,
    /// Delay applied to every lookup
    pub lookup_delay_ms: AtomicU64,
    pub last_authorization: Mutex<Option<String>>,
}

impl MockState {
    pub fn register_hits(&self) -> usize {
        self.register_hits.load(Ordering::SeqCst)
    }

    pub fn lookup_hits(&self) -> usize {
        self.lookup_hits.load(Ordering::SeqCst)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.lock().len()
    }
}

/// Confluent-compatible registry running in the test process
pub struct MockRegistry {
    pub url: String,
    pub state: Arc<MockState>,
}

#[derive(Deserialize)]
struct RegisterRequest {
    schema: String,
}

type ApiError = (StatusCode, Json<JsonValue>);

fn api_error(status: StatusCode, error_code: u32, message: String) -> ApiError {
    (
        status,
        Json(json!({"error_code": error_code, "message": message})),
    )
}

async fn register_schema(
    State(state): State<Arc<MockState>>,
    Path(subject): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    state.register_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_authorization.lock() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Subjects starting with "broken" simulate a failing backend
    if subject.starts_with("broken") {
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            50001,
            "Error in the backend data store".to_string(),
        ));
    }
    if Schema::parse_str(&req.schema).is_err() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            42201,
            "Invalid schema".to_string(),
        ));
    }

    let mut schemas = state.schemas.lock();
    let index = match schemas.iter().position(|s| *s == req.schema) {
        Some(index) => index,
        None => {
            schemas.push(req.schema);
            schemas.len() - 1
        }
    };
    Ok(Json(json!({"id": index + 1})))
}

async fn get_schema_by_id(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> Result<Json<JsonValue>, ApiError> {
    state.lookup_hits.fetch_add(1, Ordering::SeqCst);

    let delay = state.lookup_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let schema = usize::try_from(id - 1)
        .ok()
        .and_then(|index| state.schemas.lock().get(index).cloned());

    match schema {
        Some(schema) => Ok(Json(json!({"schema": schema}))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            40403,
            "Schema not found".to_string(),
        )),
    }
}

/// Start a mock registry on a random local port
pub async fn spawn_mock_registry() -> MockRegistry {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/subjects/:subject/versions", post(register_schema))
        .route("/schemas/ids/:id", get(get_schema_by_id))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockRegistry {
        url: format!("http://{}", addr),
        state,
    }
}
