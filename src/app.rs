use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{debug, error, info};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::backend::TableClient;
use crate::config::ServerArgs;
use crate::dashboard::{Dashboard, ImportTally, StatsSource, TallyingClient};
use crate::error::ImportError;
use crate::upload::{self, FormSnapshot, SelectedFile, SharedForm, UploadForm};

const CARDS_PLACEHOLDER: &str = "<!-- STAT_CARDS -->";

pub struct AppState {
    form: SharedForm,
    dashboard: Arc<Mutex<Dashboard>>,
    client: Arc<dyn TableClient>,
    table: String,
}

impl AppState {
    pub fn new(
        client: Arc<dyn TableClient>,
        stats: Arc<dyn StatsSource>,
        table: impl Into<String>,
    ) -> Self {
        AppState {
            form: UploadForm::shared(),
            dashboard: Arc::new(Mutex::new(Dashboard::new(stats))),
            client,
            table: table.into(),
        }
    }

    pub fn form(&self) -> &SharedForm {
        &self.form
    }

    fn dashboard(&self) -> MutexGuard<'_, Dashboard> {
        lock_dashboard(&self.dashboard)
    }
}

fn lock_dashboard(dashboard: &Mutex<Dashboard>) -> MutexGuard<'_, Dashboard> {
    dashboard.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Serialize)]
struct CardResponse {
    title: String,
    value: f64,
    formatted: String,
}

#[derive(Serialize)]
struct StatsResponse {
    version: u64,
    cards: Vec<CardResponse>,
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    form: FormSnapshot,
    stats_version: u64,
}

#[derive(Serialize)]
struct MessageResponse {
    status: String,
    message: Option<String>,
}

/// Start the dashboard server
///
/// Builds the backend client from the settings, wires the import tally into
/// the dashboard and serves until the listener fails.
///
/// # Arguments
/// * `args` - Parsed server settings
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
pub async fn run(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tally = Arc::new(ImportTally::new());
    let client = TallyingClient::new(args.backend.client()?, tally.clone());

    // Setup app state
    let state = Arc::new(AppState::new(
        Arc::new(client),
        tally,
        args.backend.table.clone(),
    ));

    let app = router(state, &args.static_dir, args.max_upload_bytes());

    // Start server
    let listener = TcpListener::bind(args.bind).await?;
    info!("Listening on http://{}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the dashboard router around `state`.
pub fn router(state: Arc<AppState>, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/stats", get(get_stats))
        .route("/api/upload/file", post(select_file))
        .route("/api/upload/start", post(start_upload))
        .route("/api/upload/status", get(upload_status))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed = started.elapsed().as_millis();
    if method == Method::GET {
        debug!("{} {} -> {} ({} ms)", method, path, response.status().as_u16(), elapsed);
    } else {
        info!("{} {} -> {} ({} ms)", method, path, response.status().as_u16(), elapsed);
    }
    response
}

async fn serve_dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    let cards = state.dashboard().render_cards();
    Html(include_str!("./static/dashboard.html").replace(CARDS_PLACEHOLDER, &cards))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let dashboard = state.dashboard();
    let cards = dashboard
        .cards()
        .iter()
        .map(|card| CardResponse {
            title: card.title.clone(),
            value: card.value,
            formatted: card.formatted(),
        })
        .collect();

    Json(StatsResponse {
        version: dashboard.version(),
        cards,
    })
}

async fn upload_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let form = upload::lock(&state.form).snapshot();
    Json(StatusResponse {
        form,
        stats_version: state.dashboard().version(),
    })
}

async fn select_file(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };

        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("planilha").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };

        let file = match SelectedFile::from_bytes(name, &bytes) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to spool upload: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        };
        info!("Selected '{}' ({} bytes)", file.name(), bytes.len());

        let snapshot = {
            let mut form = upload::lock(&state.form);
            form.select_file(file);
            form.snapshot()
        };
        return Json(snapshot).into_response();
    }

    error_response(StatusCode::BAD_REQUEST, "No file data received".to_string())
}

async fn start_upload(State(state): State<Arc<AppState>>) -> Response {
    let begun = upload::lock(&state.form).begin();
    let file = match begun {
        Ok(file) => file,
        Err(err) => {
            let status = match err {
                ImportError::NoFileSelected => StatusCode::BAD_REQUEST,
                _ => StatusCode::CONFLICT,
            };
            return error_response(status, err.user_message());
        }
    };

    let task_state = state.clone();
    tokio::spawn(async move {
        let dashboard = task_state.dashboard.clone();
        let _ = upload::drive_upload(
            &task_state.form,
            file,
            task_state.client.as_ref(),
            &task_state.table,
            move || lock_dashboard(&dashboard).import_completed(),
        )
        .await;
    });

    let snapshot = upload::lock(&state.form).snapshot();
    (StatusCode::ACCEPTED, Json(snapshot)).into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(MessageResponse {
            status: "error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}
