//! # sweeper-server
//!
//! HTTP front end for data-sweeper. Holds one in-memory session; uploads,
//! commands and downloads all act on it.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use sweeper_core::{
    Command, FileFormat, FileView, Session, SessionView, Status, SweepError, UploadReport,
    UploadedFile, DEFAULT_PREVIEW_ROWS,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Session shared by all handlers.
pub type SharedSession = Arc<Mutex<Session>>;

/// sweeper-server - HTTP API for data-sweeper
#[derive(Parser)]
#[command(name = "sweeper-server")]
#[command(author, version, about = "HTTP API for cleaning and converting CSV/XLSX files", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Maximum request body size in megabytes
    #[arg(long, default_value_t = 64)]
    max_upload_mb: usize,
}

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    /// Server status ("ok" when healthy).
    pub status: String,
    /// Server version from Cargo.toml.
    pub version: String,
}

/// JSON body of every error response.
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Sweep(SweepError),
    Multipart(MultipartError),
    MissingFileName,
    ChartDisabled(String),
}

impl From<SweepError> for ApiError {
    fn from(err: SweepError) -> Self {
        Self::Sweep(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Sweep(err) => {
                let status = match &err {
                    SweepError::FileNotFound(_) => StatusCode::NOT_FOUND,
                    SweepError::UnsupportedFileType { .. } | SweepError::Sheet(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    SweepError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            Self::Multipart(err) => (err.status(), err.body_text()),
            Self::MissingFileName => (
                StatusCode::BAD_REQUEST,
                "file part is missing a file name".to_string(),
            ),
            Self::ChartDisabled(name) => (
                StatusCode::NOT_FOUND,
                format!("Chart is not enabled for {name}"),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{message}");
        } else {
            tracing::debug!(%status, "{message}");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    /// Preview rows per file
    rows: Option<usize>,
}

impl ViewQuery {
    fn rows(&self) -> usize {
        self.rows.unwrap_or(DEFAULT_PREVIEW_ROWS)
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Target format; the file's selected format when absent
    format: Option<FileFormat>,
}

/// Health check endpoint handler.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept every `file` part of a multipart form.
pub async fn upload_files(
    State(session): State<SharedSession>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReport>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(ApiError::MissingFileName)?;
        let bytes = field.bytes().await?;
        files.push(UploadedFile::new(name, bytes.to_vec()));
    }

    let report = session.lock().await.upload(files)?;
    tracing::info!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "upload processed"
    );
    Ok(Json(report))
}

pub async fn list_files(
    State(session): State<SharedSession>,
    Query(query): Query<ViewQuery>,
) -> Json<SessionView> {
    Json(session.lock().await.view(query.rows()))
}

pub async fn get_file(
    State(session): State<SharedSession>,
    Path(name): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<FileView>> {
    Ok(Json(session.lock().await.get(&name)?.view(query.rows())))
}

pub async fn apply_command(
    State(session): State<SharedSession>,
    Path(name): Path<String>,
    Json(command): Json<Command>,
) -> ApiResult<Json<Status>> {
    Ok(Json(session.lock().await.apply(&name, command)?))
}

/// Serialized file as an attachment.
pub async fn download_file(
    State(session): State<SharedSession>,
    Path(name): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let download = session.lock().await.download(&name, query.format)?;
    let disposition = content_disposition(&download.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, download.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

/// Attachment header with a quoted ASCII `filename` and an RFC 5987 `filename*`.
fn content_disposition(file_name: &str) -> String {
    let mut fallback = String::with_capacity(file_name.len());
    for c in file_name.chars() {
        match c {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => fallback.push(c),
            _ => fallback.push('_'),
        }
    }
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

pub async fn chart_page(
    State(session): State<SharedSession>,
    Path(name): Path<String>,
) -> ApiResult<Html<String>> {
    let session = session.lock().await;
    let chart = session
        .get(&name)?
        .chart()
        .ok_or_else(|| ApiError::ChartDisabled(name.clone()))?;
    Ok(Html(chart.to_html()))
}

pub async fn clear_files(State(session): State<SharedSession>) -> StatusCode {
    session.lock().await.clear();
    tracing::info!("session cleared");
    StatusCode::NO_CONTENT
}

/// Create the application router.
///
/// This is separated from `main()` to allow testing.
pub fn create_router(session: SharedSession, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/files",
            get(list_files).post(upload_files).delete(clear_files),
        )
        .route("/files/:name", get(get_file))
        .route("/files/:name/commands", post(apply_command))
        .route("/files/:name/download", get(download_file))
        .route("/files/:name/chart", get(chart_page))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session = SharedSession::default();
    let app = create_router(session, args.max_upload_mb.saturating_mul(1024 * 1024));

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    tracing::info!(addr = %args.addr, "sweeper-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
