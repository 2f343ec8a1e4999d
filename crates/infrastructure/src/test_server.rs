use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use outpost_domain::EndpointAddress;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use zip::write::SimpleFileOptions;

/// In-process coordinator speaking the worker protocol.
#[derive(Default)]
pub(crate) struct CoordinatorState {
    pub(crate) tokens_to_issue: VecDeque<String>,
    pub(crate) valid_token: Option<String>,
    pub(crate) pending_jobs: VecDeque<String>,
    pub(crate) archives: HashMap<String, Vec<u8>>,
    pub(crate) registrations: Vec<Value>,
    pub(crate) uploads: Vec<(String, String, Vec<u8>, Option<String>)>,
    pub(crate) results: Vec<(String, Value)>,
    pub(crate) errors: Vec<(String, Value)>,
    pub(crate) seen_tokens: Vec<(String, String)>,
}

type SharedState = Arc<Mutex<CoordinatorState>>;

pub(crate) struct TestCoordinator {
    pub(crate) state: SharedState,
    pub(crate) address: SocketAddr,
}

impl TestCoordinator {
    pub(crate) async fn start() -> Self {
        let state: SharedState = Arc::default();
        let app = Router::new()
            .route("/workers", post(register))
            .route("/random_job", get(random_job))
            .route("/jobs/{id}/experiment.zip", get(archive))
            .route("/jobs/{id}/binaryfiles/{name}", post(binary_file))
            .route("/jobs/{id}/results", put(results))
            .route("/jobs/{id}/error", put(error))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|_| unreachable!());
        let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { state, address }
    }

    pub(crate) fn endpoint(&self) -> EndpointAddress {
        EndpointAddress::parse(self.address.to_string().as_str()).unwrap_or_else(|_| unreachable!())
    }
}

/// Builds an in-memory zip archive.
pub(crate) fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        let started = writer.start_file(*name, SimpleFileOptions::default());
        assert!(started.is_ok());
        assert!(writer.write_all(contents.as_bytes()).is_ok());
    }
    writer
        .finish()
        .map(Cursor::into_inner)
        .unwrap_or_else(|_| unreachable!())
}

async fn authorize(state: &SharedState, headers: &HeaderMap, path: &str) -> bool {
    let token = headers
        .get("Worker-Token")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let mut state = state.lock().await;
    state.seen_tokens.push((path.to_owned(), token.clone()));
    state
        .valid_token
        .as_ref()
        .is_none_or(|valid_token| *valid_token == token)
}

async fn register(State(state): State<SharedState>, body: axum::Json<Value>) -> Response {
    let mut state = state.lock().await;
    state.registrations.push(body.0);
    let token = state
        .tokens_to_issue
        .pop_front()
        .unwrap_or_else(|| "server-token".to_owned());
    state.valid_token = Some(token.clone());
    (StatusCode::CREATED, axum::Json(json!({"Token": token}))).into_response()
}

async fn random_job(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if !authorize(&state, &headers, "/random_job").await {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match state.lock().await.pending_jobs.pop_front() {
        Some(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn archive(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.lock().await.archives.get(&id) {
        Some(archive) => archive.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn binary_file(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((id, name)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    state
        .lock()
        .await
        .uploads
        .push((id, name, body.to_vec(), content_type));
    StatusCode::OK.into_response()
}

async fn results(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: axum::Json<Value>,
) -> Response {
    if !authorize(&state, &headers, "results").await {
        return StatusCode::FORBIDDEN.into_response();
    }
    state.lock().await.results.push((id, body.0));
    StatusCode::OK.into_response()
}

async fn error(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: axum::Json<Value>,
) -> Response {
    if !authorize(&state, &headers, "error").await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.lock().await.errors.push((id, body.0));
    StatusCode::OK.into_response()
}
