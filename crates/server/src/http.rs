//! HTTP Endpoints

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::twiml;
use crate::websocket::MediaStreamHandler;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let call_control_path = server.call_control_path.clone();
    let media_stream_path = server.media_stream_path.clone();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        // GET also answers HEAD
        .route(&call_control_path, get(incoming_call).post(incoming_call))
        .route(&media_stream_path, get(MediaStreamHandler::handle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Voice relay media stream server is running"
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Answer the provider's incoming-call webhook with a document that
/// connects the call to the media-stream websocket
async fn incoming_call(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let server = &state.config.server;
    let host = match server.public_host.as_deref() {
        Some(host) => host.to_string(),
        None => headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(twiml::hostname)
            .map(str::to_owned)
            .ok_or_else(|| ServerError::InvalidRequest("missing Host header".into()))?,
    };

    let stream_url = twiml::stream_url(&host, &server.media_stream_path);
    tracing::info!(stream_url = %stream_url, "Answering incoming call");

    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        twiml::render(&state.config.call, &stream_url),
    ))
}
