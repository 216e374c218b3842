use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/synthetics/api/v3";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const FREQUENCIES: [u32; 9] = [1, 5, 10, 15, 30, 60, 360, 720, 1440];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
const DEFAULT_PAGE: usize = 20;
const MAX_PAGE: usize = 100;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(rename = "validationString", skip_serializing_if = "Option::is_none")]
    pub validation_string: Option<String>,
    #[serde(rename = "verifySSL", skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,
    #[serde(rename = "bypassHEADRequest", skip_serializing_if = "Option::is_none")]
    pub bypass_head_request: Option<bool>,
    #[serde(rename = "treatRedirectAsFailure", skip_serializing_if = "Option::is_none")]
    pub treat_redirect_as_failure: Option<bool>,
}

impl Options {
    fn merge(&mut self, patch: Options) {
        if patch.validation_string.is_some() {
            self.validation_string = patch.validation_string;
        }
        if patch.verify_ssl.is_some() {
            self.verify_ssl = patch.verify_ssl;
        }
        if patch.bypass_head_request.is_some() {
            self.bypass_head_request = patch.bypass_head_request;
        }
        if patch.treat_redirect_as_failure.is_some() {
            self.treat_redirect_as_failure = patch.treat_redirect_as_failure;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub frequency: u32,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: String,
    #[serde(rename = "slaThreshold")]
    pub sla_threshold: f64,
    pub options: Options,
    #[serde(rename = "userId")]
    pub user_id: u64,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "modifiedAt")]
    pub modified_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMonitor {
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub frequency: u32,
    #[serde(default)]
    pub uri: String,
    pub locations: Vec<String>,
    pub status: String,
    #[serde(rename = "slaThreshold", default)]
    pub sla_threshold: f64,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMonitor {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub monitor_type: Option<String>,
    pub frequency: Option<u32>,
    pub uri: Option<String>,
    pub locations: Option<Vec<String>>,
    pub status: Option<String>,
    #[serde(rename = "slaThreshold")]
    pub sla_threshold: Option<f64>,
    pub options: Option<Options>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptLocation {
    pub name: String,
    pub hmac: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "scriptText")]
    pub script_text: String,
    #[serde(rename = "scriptLocations", default, skip_serializing_if = "Vec::is_empty")]
    pub script_locations: Vec<ScriptLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonitorList {
    pub monitors: Vec<Monitor>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// Monitors in creation order, decoded script content keyed by monitor id.
/// Script locations are accepted on upload but never stored: the API does
/// not return them.
#[derive(Debug, Default)]
pub struct Store {
    pub monitors: Vec<Monitor>,
    pub scripts: HashMap<String, String>,
}

impl Store {
    fn monitor_mut(&mut self, id: &str) -> Option<&mut Monitor> {
        self.monitors.iter_mut().find(|m| m.id == id)
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// When set, only this key is accepted; otherwise any non-empty key is.
    pub api_key: Option<String>,
}

pub fn app() -> Router {
    app_with_key(None)
}

pub fn app_with_key(api_key: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        api_key,
    };
    let monitors = Router::new()
        .route("/monitors", get(list_monitors).post(create_monitor))
        .route(
            "/monitors/{id}",
            get(get_monitor).patch(update_monitor).delete(delete_monitor),
        )
        .route("/monitors/{id}/script", get(get_script).put(update_script))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest(API_PREFIX, monitors)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let accepted = match &state.api_key {
        Some(key) => provided == key,
        None => !provided.is_empty(),
    };
    if !accepted {
        tracing::warn!(path = %request.uri().path(), "rejected request without valid api key");
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    next.run(request).await
}

fn now() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

fn validate(frequency: u32, locations: &[String], status: &str) -> Result<(), (StatusCode, String)> {
    if !FREQUENCIES.contains(&frequency) {
        return Err((StatusCode::BAD_REQUEST, format!("invalid frequency {frequency}")));
    }
    if locations.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "locations must not be empty".to_string()));
    }
    if !matches!(status, "ENABLED" | "MUTED" | "DISABLED") {
        return Err((StatusCode::BAD_REQUEST, format!("invalid status {status}")));
    }
    Ok(())
}

async fn list_monitors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<MonitorList> {
    let store = state.db.read().await;
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);
    Json(MonitorList {
        monitors: store.monitors.iter().skip(offset).take(limit).cloned().collect(),
        count: store.monitors.len(),
    })
}

async fn create_monitor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateMonitor>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate(input.frequency, &input.locations, &input.status)?;
    if !matches!(
        input.monitor_type.as_str(),
        "SIMPLE" | "BROWSER" | "SCRIPT_API" | "SCRIPT_BROWSER"
    ) {
        return Err((StatusCode::BAD_REQUEST, format!("invalid type {}", input.monitor_type)));
    }

    let timestamp = now();
    let monitor = Monitor {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        monitor_type: input.monitor_type,
        frequency: input.frequency,
        uri: input.uri,
        locations: input.locations,
        status: input.status,
        sla_threshold: input.sla_threshold,
        options: input.options,
        user_id: 1,
        api_version: "0.2.0".to_string(),
        created_at: timestamp.clone(),
        modified_at: timestamp,
    };
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let location = format!("http://{host}{API_PREFIX}/monitors/{}", monitor.id);
    tracing::info!(id = %monitor.id, "created monitor");
    state.db.write().await.monitors.push(monitor);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
}

async fn get_monitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Monitor>, StatusCode> {
    let store = state.db.read().await;
    store
        .monitors
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_monitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateMonitor>,
) -> Result<StatusCode, (StatusCode, String)> {
    if input.monitor_type.is_some() {
        return Err((StatusCode::BAD_REQUEST, "type cannot be changed".to_string()));
    }
    let mut store = state.db.write().await;
    let monitor = store
        .monitor_mut(&id)
        .ok_or((StatusCode::NOT_FOUND, String::new()))?;

    let frequency = input.frequency.unwrap_or(monitor.frequency);
    let locations = input.locations.unwrap_or_else(|| monitor.locations.clone());
    let status = input.status.unwrap_or_else(|| monitor.status.clone());
    validate(frequency, &locations, &status)?;

    monitor.frequency = frequency;
    monitor.locations = locations;
    monitor.status = status;
    if let Some(name) = input.name {
        monitor.name = name;
    }
    if let Some(uri) = input.uri {
        monitor.uri = uri;
    }
    if let Some(sla_threshold) = input.sla_threshold {
        monitor.sla_threshold = sla_threshold;
    }
    if let Some(options) = input.options {
        monitor.options.merge(options);
    }
    monitor.modified_at = now();
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_monitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = state.db.write().await;
    let before = store.monitors.len();
    store.monitors.retain(|m| m.id != id);
    if store.monitors.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    store.scripts.remove(&id);
    tracing::info!(%id, "deleted monitor");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Script>, StatusCode> {
    let store = state.db.read().await;
    let script = store.scripts.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(Script {
        script_text: BASE64.encode(script.as_bytes()),
        script_locations: Vec::new(),
    }))
}

async fn update_script(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Script>,
) -> Result<StatusCode, (StatusCode, String)> {
    let bytes = BASE64
        .decode(input.script_text.as_bytes())
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("scriptText is not base64: {e}")))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("scriptText is not UTF-8: {e}")))?;

    let mut store = state.db.write().await;
    if store.monitor_mut(&id).is_none() {
        return Err((StatusCode::NOT_FOUND, String::new()));
    }
    if content.is_empty() {
        store.scripts.remove(&id);
        tracing::info!(%id, "detached script");
    } else {
        store.scripts.insert(id, content);
    }
    Ok(StatusCode::NO_CONTENT)
}
