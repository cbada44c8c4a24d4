use crate::controller::{dropdowns, ChartUpdate, Controller, Dropdown, SelectionState};
use crate::dashboard::Dashboard;
use crate::error::DashError;
use crate::graph::{self, ExportOptions, OutputFormat};
use crate::ir::ChartPayload;
use crate::page::render_page;
use crate::table::{render_table, Grid};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Per-session controllers, evicting the least recently used once full.
pub struct SessionStore {
    sessions: Mutex<LruCache<Uuid, Controller>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn insert(&self, controller: Controller) -> Uuid {
        let id = Uuid::new_v4();
        if let Some((evicted, _)) = self.sessions.lock().push(id, controller) {
            debug!(session_id = %evicted, "session evicted");
        }
        id
    }

    /// Run `f` against a session's controller; `None` if the session is unknown.
    pub fn with<R>(&self, id: &Uuid, f: impl FnOnce(&mut Controller) -> R) -> Option<R> {
        self.sessions.lock().get_mut(id).map(f)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.lock().pop(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, max_sessions: usize) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            sessions: Arc::new(SessionStore::new(max_sessions)),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Dash(DashError),
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        ApiError::Dash(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Dash(err @ (DashError::InvalidField(_) | DashError::UnknownControl(_))) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Dash(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err)),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        } else {
            debug!(status = status.as_u16(), %message, "request rejected");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/table", get(table))
        .route("/api/controls", get(controls))
        .route("/api/figures/scatter", get(scatter_figure))
        .route("/api/figures/bar", get(bar_figure))
        .route("/api/export/:chart", get(export))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", axum::routing::delete(delete_session))
        .route("/api/sessions/:id/controls/:control", post(change_control))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let server = axum::Server::try_bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "listening");

    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c");
        return;
    }
    info!("shutdown signal received");
}

fn default_field() -> String {
    "sex".to_string()
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(state.dashboard.title(), state.dashboard.table()))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct TableQuery {
    max_rows: Option<i64>,
}

async fn table(State(state): State<AppState>, Query(query): Query<TableQuery>) -> Json<Grid> {
    match query.max_rows {
        Some(max_rows) => Json(render_table(state.dashboard.dataset().records(), max_rows)),
        None => Json(state.dashboard.table().clone()),
    }
}

async fn controls() -> Json<Vec<Dropdown>> {
    Json(dropdowns(&SelectionState::default()))
}

#[derive(Debug, Deserialize)]
struct ScatterQuery {
    #[serde(default = "default_field")]
    hue: String,
}

#[derive(Debug, Deserialize)]
struct BarQuery {
    #[serde(default = "default_field")]
    x: String,
    #[serde(default = "default_field")]
    text: String,
}

async fn scatter_figure(
    State(state): State<AppState>,
    Query(query): Query<ScatterQuery>,
) -> Result<Json<ChartPayload>, ApiError> {
    Ok(Json(state.dashboard.charts().scatter(&query.hue)?))
}

async fn bar_figure(
    State(state): State<AppState>,
    Query(query): Query<BarQuery>,
) -> Result<Json<ChartPayload>, ApiError> {
    Ok(Json(state.dashboard.charts().bar(&query.x, &query.text)?))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default = "default_field")]
    hue: String,
    #[serde(default = "default_field")]
    x: String,
    #[serde(default = "default_field")]
    text: String,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(rename = "type")]
    format: Option<OutputFormat>,
}

async fn export(
    State(state): State<AppState>,
    Path(chart): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let charts = state.dashboard.charts();
    let payload = match chart.as_str() {
        "scatter" => charts.scatter(&query.hue)?,
        "bar" => charts.bar(&query.x, &query.text)?,
        other => return Err(ApiError::NotFound(format!("unknown chart '{}'", other))),
    };

    let defaults = ExportOptions::default();
    let options = ExportOptions {
        width: query.width.unwrap_or(defaults.width),
        height: query.height.unwrap_or(defaults.height),
        format: query.format.unwrap_or(defaults.format),
    };
    options
        .validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let format = options.format;
    let bytes = tokio::task::spawn_blocking(move || graph::render(&payload, &options))
        .await
        .context("Export task panicked")
        .map_err(ApiError::Internal)?
        .map_err(ApiError::Internal)?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], bytes).into_response())
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: Uuid,
    selection: SelectionState,
    figures: Vec<ChartUpdate>,
}

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionCreated>, ApiError> {
    let controller = state.dashboard.new_session()?;
    let selection = controller.selection();
    let figures = controller.figures();
    let session_id = state.sessions.insert(controller);
    info!(%session_id, sessions = state.sessions.len(), "session created");

    Ok(Json(SessionCreated {
        session_id,
        selection,
        figures,
    }))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id) {
        info!(session_id = %id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("session {} not found", id)))
    }
}

#[derive(Debug, Deserialize)]
struct ControlChange {
    value: String,
}

#[derive(Debug, Serialize)]
struct ControlChanged {
    selection: SelectionState,
    updates: Vec<ChartUpdate>,
}

async fn change_control(
    State(state): State<AppState>,
    Path((id, control)): Path<(Uuid, String)>,
    Json(change): Json<ControlChange>,
) -> Result<Json<ControlChanged>, ApiError> {
    let changed = state
        .sessions
        .with(&id, |ctl| {
            let updates = ctl.dispatch(&control, &change.value)?;
            Ok::<_, DashError>(ControlChanged {
                selection: ctl.selection(),
                updates,
            })
        })
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", id)))??;

    Ok(Json(changed))
}
