//! HTTP service exposing the media pipeline.
//!
//! Provides REST endpoints for search, download-and-convert, pitch
//! modification, and serving the stored assets.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::SalvadorError;
use crate::pipeline::MediaPipeline;
use crate::tools::TrackCandidate;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
pub struct AppState {
    pipeline: MediaPipeline,
    base_url: String,
}

impl AppState {
    pub fn new(pipeline: MediaPipeline, base_url: String) -> Self {
        Self { pipeline, base_url }
    }
}

/// Run the HTTP service.
pub async fn run_serve(
    host: Option<&str>,
    port: Option<u16>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.server.host = host.to_string();
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let base_url = settings.server.base_url();
    let pipeline = MediaPipeline::new(&settings)?;
    let state = Arc::new(AppState::new(pipeline, base_url));

    let app = router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Salvador");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "GET  /search?query=...");
    Output::kv("Download", "POST /download-and-convert");
    Output::kv("Modify Pitch", "POST /modify-pitch");
    Output::kv("Audio", "GET  /converted/:filename");
    Output::kv("Thumbnails", "GET  /thumbnails/:filename");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/download-and-convert", post(download_and_convert))
        .route("/modify-pitch", post(modify_pitch))
        .route("/converted/{filename}", get(serve_converted))
        .route("/thumbnails/{filename}", get(serve_thumbnail))
        // Uploaded tracks routinely exceed axum's default 2 MB body limit.
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    status: &'static str,
    video_info: Vec<TrackCandidate>,
}

#[derive(Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct AssetResponse {
    status: &'static str,
    mp3_url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn client_error(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Map a pipeline error to a response: bad client input is 400, everything
/// else is an opaque 500 with a descriptive message.
fn pipeline_error(e: &SalvadorError, fallback: &str) -> axum::response::Response {
    if e.is_client_error() {
        return client_error(&e.to_string());
    }
    error!("{}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: fallback.to_string(),
        }),
    )
        .into_response()
}

/// Absolute URL for a stored audio file.
fn converted_url(base_url: &str, filename: &str) -> String {
    format!("{}/converted/{}", base_url, filename)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = match params.query.as_deref() {
        Some(q) if !q.trim().is_empty() => q,
        _ => return client_error("Query is required"),
    };

    match state.pipeline.search(query).await {
        Ok(video_info) => Json(SearchResponse {
            status: "success",
            video_info,
        })
        .into_response(),
        Err(e) => pipeline_error(&e, "Failed to find videos"),
    }
}

async fn download_and_convert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> impl IntoResponse {
    let url = match req.url.as_deref() {
        Some(u) if !u.trim().is_empty() => u,
        _ => return client_error("URL is required"),
    };

    match state.pipeline.download_and_store(url).await {
        Ok(asset) => Json(AssetResponse {
            status: "success",
            mp3_url: converted_url(&state.base_url, &asset.filename),
        })
        .into_response(),
        Err(e) => pipeline_error(&e, "Failed to download video"),
    }
}

async fn modify_pitch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut pitch_text: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return client_error(&format!("Malformed multipart body: {e}")),
        };

        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.mp3").to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => return client_error(&format!("Failed to read upload: {e}")),
                }
            }
            Some("pitch") => match field.text().await {
                Ok(text) => pitch_text = Some(text),
                Err(e) => return client_error(&format!("Failed to read pitch: {e}")),
            },
            _ => {}
        }
    }

    let (filename, bytes, pitch_text) = match (file, pitch_text) {
        (Some((filename, bytes)), Some(pitch)) => (filename, bytes, pitch),
        _ => return client_error("File and pitch factor are required"),
    };

    let pitch: f64 = match pitch_text.trim().parse() {
        Ok(p) => p,
        Err(_) => return client_error("Pitch factor must be a number"),
    };

    match state.pipeline.shift_pitch(&bytes, pitch, &filename).await {
        Ok(asset) => Json(AssetResponse {
            status: "success",
            mp3_url: converted_url(&state.base_url, &asset.filename),
        })
        .into_response(),
        Err(e) => pipeline_error(&e, "Failed to modify pitch"),
    }
}

async fn serve_converted(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    serve_file(state.pipeline.store().lookup_audio(&filename), "audio/mpeg").await
}

async fn serve_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    serve_file(
        state.pipeline.store().lookup_thumbnail(&filename),
        "image/jpeg",
    )
    .await
}

async fn serve_file(
    path: Option<std::path::PathBuf>,
    content_type: &'static str,
) -> axum::response::Response {
    let Some(path) = path else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.storage.audio_dir = dir.path().join("musiche").display().to_string();
        settings.storage.thumbnail_dir = dir.path().join("copertine").display().to_string();
        settings.tools.ytdlp_bin = "false".to_string();
        settings.tools.ffmpeg_bin = "false".to_string();
        let pipeline = MediaPipeline::new(&settings).unwrap();
        let state = AppState::new(pipeline, "http://127.0.0.1:8080".to_string());
        (dir, Arc::new(state))
    }

    #[test]
    fn test_converted_url() {
        assert_eq!(
            converted_url("http://127.0.0.1:8080", "Test_Song.mp3"),
            "http://127.0.0.1:8080/converted/Test_Song.mp3"
        );
    }

    #[tokio::test]
    async fn test_search_missing_query_is_400() {
        let (_dir, state) = state();
        let response = search(State(state.clone()), Query(SearchParams { query: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = search(
            State(state),
            Query(SearchParams {
                query: Some("".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_tool_failure_is_500() {
        let (_dir, state) = state();
        let response = search(
            State(state),
            Query(SearchParams {
                query: Some("some song".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_download_missing_url_is_400() {
        let (_dir, state) = state();
        let response = download_and_convert(State(state), Json(DownloadRequest { url: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_converted_missing_file_is_404() {
        let (_dir, state) = state();
        let response = serve_converted(
            State(state),
            Path("does-not-exist.mp3".to_string()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_converted_rejects_traversal() {
        let (_dir, state) = state();
        let response = serve_converted(State(state), Path("../secret.mp3".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_converted_existing_file() {
        let (_dir, state) = state();
        let path = state.pipeline.store().audio_path("Song.mp3");
        std::fs::write(&path, b"mp3bytes").unwrap();

        let response = serve_converted(State(state), Path("Song.mp3".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "audio/mpeg"
        );
    }
}
