//! HTTP surface.
//!
//! Serves the rendered page and its assets, and exposes the session API the
//! page script talks to. Client messages arrive as JSON bodies on
//! `POST /api/sessions/{id}/events` and are answered with the resulting
//! view state; typewriter frames stream back as Server-Sent Events on
//! `GET /api/sessions/{id}/typewriter`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    ClientMessage, DEFAULT_MAX_MESSAGE_SIZE, Result, ServerMessage, TransportType, env_or,
    sanitize_for_log,
};
use crate::error::{SessionError, TransportError};
use crate::observability::metrics;
use crate::render::assets;
use crate::session::SessionRegistry;
use crate::view::ViewSnapshot;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to, e.g. `"127.0.0.1:8080"`.
    pub bind_addr: String,
    /// Maximum allowed request body size in bytes.
    pub max_message_size: usize,
    /// Directory project images are served from.
    pub media_dir: PathBuf,
}

impl HttpConfig {
    /// Creates a configuration with the message size limit taken from
    /// `FOLIO_MAX_MESSAGE_SIZE` (default 64 KB).
    #[must_use]
    pub fn new(bind_addr: String, media_dir: PathBuf) -> Self {
        Self {
            bind_addr,
            max_message_size: env_or("FOLIO_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE),
            media_dir,
        }
    }
}

/// Response body of `POST /api/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    /// Id to use in later requests.
    pub session_id: Uuid,
    /// Initial view state.
    pub state: ViewSnapshot,
}

/// State shared by all handlers.
struct HttpSharedState {
    page: String,
    sessions: Arc<SessionRegistry>,
    media_dir: PathBuf,
    max_message_size: usize,
}

/// Running HTTP server.
pub struct HttpServer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl HttpServer {
    /// Binds the server and starts serving `page`.
    ///
    /// Returns the server and the actual bound address (useful when binding
    /// to port 0 in tests). The server stops accepting connections when
    /// `cancel` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the TCP listener
    /// cannot bind.
    pub async fn bind(
        config: HttpConfig,
        page: String,
        sessions: Arc<SessionRegistry>,
        cancel: CancellationToken,
    ) -> Result<(Self, SocketAddr)> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("bind failed: {e}")))?;

        let bound_addr = listener
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(format!("local_addr failed: {e}")))?;

        let shared = Arc::new(HttpSharedState {
            page,
            sessions,
            media_dir: config.media_dir,
            max_message_size: config.max_message_size,
        });

        let service = build_router(shared).into_make_service_with_connect_info::<SocketAddr>();

        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            info!(%bound_addr, transport = %TransportType::Http, "HTTP server listening");
            if let Err(e) = axum::serve(listener, service)
                .with_graceful_shutdown(async move {
                    server_cancel.cancelled().await;
                })
                .await
            {
                warn!(error = %e, "HTTP server error");
            }
            debug!("HTTP server shut down");
        });

        Ok((Self { cancel, handle }, bound_addr))
    }

    /// Stops accepting connections.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Waits until the server has shut down.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "HTTP server task failed");
        }
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn build_router(shared: Arc<HttpSharedState>) -> Router {
    // axum's default body limit is 2 MB; use the configured limit instead.
    let body_limit = axum::extract::DefaultBodyLimit::max(shared.max_message_size);

    Router::new()
        .route("/", get(handle_index))
        .route(assets::CSS_PATH, get(handle_css))
        .route(assets::JS_PATH, get(handle_js))
        .route("/healthz", get(handle_health))
        .route("/media/{file}", get(handle_media))
        .route("/api/sessions", post(handle_open_session))
        .route("/api/sessions/{id}", axum::routing::delete(handle_close_session))
        .route("/api/sessions/{id}/events", post(handle_event))
        .route("/api/sessions/{id}/typewriter", get(handle_typewriter))
        .layer(body_limit)
        .with_state(shared)
}

// ============================================================================
// Page and assets
// ============================================================================

async fn handle_index(State(shared): State<Arc<HttpSharedState>>) -> Html<String> {
    metrics::record_page_view();
    Html(shared.page.clone())
}

async fn handle_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], assets::CSS)
}

async fn handle_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        assets::JS,
    )
}

async fn handle_health(State(shared): State<Arc<HttpSharedState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": shared.sessions.len(),
    }))
}

/// `GET /media/{file}` handler.
///
/// Only plain image file names are served; anything else is a 404.
async fn handle_media(
    State(shared): State<Arc<HttpSharedState>>,
    Path(file): Path<String>,
) -> Response {
    let Some(content_type) = assets::media_content_type(&file)
        .filter(|_| assets::is_media_file_name(&file))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(shared.media_dir.join(&file)).await {
        Ok(data) => ([(header::CONTENT_TYPE, content_type)], Bytes::from(data)).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(file = %sanitize_for_log(&file, 100), "media file not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            warn!(error = %e, "media read failed");
            metrics::record_error("media");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================================
// Session API
// ============================================================================

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ServerMessage::Error {
            message: message.into(),
        }),
    )
        .into_response()
}

fn session_error_response(error: &SessionError) -> Response {
    match error {
        SessionError::NotFound(_) => error_response(StatusCode::NOT_FOUND, error.to_string()),
        SessionError::LimitReached { .. } => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, error.to_string())
        }
    }
}

fn parse_session_id(raw: &str) -> std::result::Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("session not found: {}", sanitize_for_log(raw, 64)),
        )
    })
}

/// `POST /api/sessions` handler.
async fn handle_open_session(
    State(shared): State<Arc<HttpSharedState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    match shared.sessions.open() {
        Ok((session_id, state)) => {
            debug!(%session_id, remote = %addr, "session opened over HTTP");
            (StatusCode::CREATED, Json(OpenSessionResponse { session_id, state })).into_response()
        }
        Err(e) => {
            warn!(error = %e, remote = %addr, "session rejected");
            session_error_response(&e)
        }
    }
}

/// `POST /api/sessions/{id}/events` handler.
///
/// Applies one client message and answers with `ServerMessage::State`.
async fn handle_event(
    State(shared): State<Arc<HttpSharedState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty request body");
    }

    if body.len() > shared.max_message_size {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "message too large: {} bytes (limit: {})",
                body.len(),
                shared.max_message_size
            ),
        );
    }

    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let message: ClientMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            metrics::record_error("protocol");
            return error_response(StatusCode::BAD_REQUEST, format!("invalid message: {e}"));
        }
    };

    match shared.sessions.dispatch(id, message) {
        Ok(state) => Json(ServerMessage::State(state)).into_response(),
        Err(e) => session_error_response(&e),
    }
}

/// `GET /api/sessions/{id}/typewriter` handler.
///
/// Streams every typewriter frame as an SSE event named `typewriter`. The
/// stream ends when the session is torn down; while it is open the session
/// is not idle.
async fn handle_typewriter(
    State(shared): State<Arc<HttpSharedState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (frames, lease) = match shared.sessions.frames(id) {
        Ok(subscription) => subscription,
        Err(e) => return session_error_response(&e),
    };

    // The lease lives as long as the stream and keeps the session from
    // being swept as idle.
    let stream = WatchStream::new(frames).map(move |frame| {
        let _lease = &lease;
        SseEvent::default()
            .event("typewriter")
            .json_data(ServerMessage::Typewriter(frame))
    });
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// `DELETE /api/sessions/{id}` handler.
async fn handle_close_session(
    State(shared): State<Arc<HttpSharedState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match shared.sessions.close(id, "teardown") {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => session_error_response(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:8080` → `0.0.0.0:8080`
/// - `8080` → `0.0.0.0:8080`
/// - `1.2.3.4:8080` → as-is
///
/// # Errors
///
/// Returns [`TransportError::ConnectionFailed`] if the result cannot be
/// parsed as a valid socket address.
pub fn parse_bind_addr(input: &str) -> std::result::Result<String, TransportError> {
    let addr = if input.starts_with(':') {
        format!("0.0.0.0{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("0.0.0.0:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>().map_err(|e| {
        TransportError::ConnectionFailed(format!("invalid bind address \"{input}\": {e}"))
    })?;
    Ok(addr)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::observability::EventEmitter;
    use crate::session::RegistryOptions;
    use crate::view::ViewOptions;
    use axum::body::{Body, to_bytes};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn registry(max_sessions: usize, typewriter: bool) -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(
            RegistryOptions {
                view: ViewOptions {
                    typewriter_text: "Debi".to_string(),
                    ..ViewOptions::default()
                },
                max_sessions,
                idle_timeout: Duration::from_secs(60),
                typewriter,
            },
            Arc::new(EventEmitter::noop()),
            CancellationToken::new(),
        ))
    }

    fn shared_with(
        sessions: Arc<SessionRegistry>,
        media_dir: PathBuf,
        max_message_size: usize,
    ) -> Arc<HttpSharedState> {
        Arc::new(HttpSharedState {
            page: "<html>folio</html>".to_string(),
            sessions,
            media_dir,
            max_message_size,
        })
    }

    fn test_router(shared: Arc<HttpSharedState>) -> Router {
        build_router(shared).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9999))))
    }

    fn app(sessions: Arc<SessionRegistry>) -> Router {
        test_router(shared_with(
            sessions,
            PathBuf::from("media"),
            DEFAULT_MAX_MESSAGE_SIZE,
        ))
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    // ------------------------------------------------------------------
    // parse_bind_addr
    // ------------------------------------------------------------------

    #[test]
    fn parse_bind_addr_colon_port() {
        assert_eq!(parse_bind_addr(":8080").unwrap(), "0.0.0.0:8080");
    }

    #[test]
    fn parse_bind_addr_port_only() {
        assert_eq!(parse_bind_addr("8080").unwrap(), "0.0.0.0:8080");
    }

    #[test]
    fn parse_bind_addr_full() {
        assert_eq!(parse_bind_addr("127.0.0.1:3000").unwrap(), "127.0.0.1:3000");
    }

    #[test]
    fn parse_bind_addr_invalid() {
        assert!(parse_bind_addr("not-an-address").is_err());
    }

    // ------------------------------------------------------------------
    // Page and assets
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn index_serves_page() {
        let resp = app(registry(4, false)).oneshot(get_req("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>folio</html>");
    }

    #[tokio::test]
    async fn assets_have_content_types() {
        let resp = app(registry(4, false))
            .oneshot(get_req("/assets/site.js"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );

        let resp = app(registry(4, false))
            .oneshot(get_req("/assets/site.css"))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn healthz_reports_sessions() {
        let sessions = registry(4, false);
        sessions.open().unwrap();
        let resp = app(sessions).oneshot(get_req("/healthz")).await.unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 1);
    }

    #[tokio::test]
    async fn media_is_served_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fillit.png"), b"\x89PNG").unwrap();
        let router = test_router(shared_with(
            registry(4, false),
            dir.path().to_path_buf(),
            DEFAULT_MAX_MESSAGE_SIZE,
        ));

        let resp = router
            .clone()
            .oneshot(get_req("/media/fillit.png"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");

        let resp = router
            .clone()
            .oneshot(get_req("/media/missing.png"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = router
            .oneshot(get_req("/media/..%2Fsecret.png"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // ------------------------------------------------------------------
    // Session API
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn open_session_returns_id_and_state() {
        let resp = app(registry(4, false))
            .oneshot(post("/api/sessions", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = json_body(resp).await;
        assert!(json["session_id"].is_string());
        assert_eq!(json["state"]["active_section"], "hero");
        assert_eq!(json["state"]["menu_open"], false);
    }

    #[tokio::test]
    async fn open_session_over_limit_returns_503() {
        let sessions = registry(1, false);
        sessions.open().unwrap();
        let resp = app(sessions)
            .oneshot(post("/api/sessions", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(resp).await["type"], "error");
    }

    #[tokio::test]
    async fn event_returns_state() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let router = app(Arc::clone(&sessions));

        let layout = r#"{"type":"layout","sections":[
            {"id":"hero","top":0,"height":800},
            {"id":"about","top":800,"height":800}]}"#;
        let resp = router
            .clone()
            .oneshot(post(&format!("/api/sessions/{id}/events"), layout))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router
            .oneshot(post(
                &format!("/api/sessions/{id}/events"),
                r#"{"type":"scroll","offset":750}"#,
            ))
            .await
            .unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["type"], "state");
        assert_eq!(json["active_section"], "about");
    }

    #[tokio::test]
    async fn event_empty_body_returns_400() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let resp = app(sessions)
            .oneshot(post(&format!("/api/sessions/{id}/events"), Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn event_invalid_json_returns_400() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let resp = app(sessions)
            .oneshot(post(&format!("/api/sessions/{id}/events"), "not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert_eq!(json["type"], "error");
    }

    #[tokio::test]
    async fn event_oversized_body_returns_413() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let router = test_router(shared_with(sessions, PathBuf::from("media"), 10));
        let resp = router
            .oneshot(post(
                &format!("/api/sessions/{id}/events"),
                r#"{"type":"scroll","offset":750}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn event_for_unknown_session_returns_404() {
        let router = app(registry(4, false));
        let resp = router
            .clone()
            .oneshot(post(
                &format!("/api/sessions/{}/events", Uuid::new_v4()),
                r#"{"type":"toggle_menu"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = router
            .oneshot(post("/api/sessions/not-a-uuid/events", r#"{"type":"toggle_menu"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_tears_session_down() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let router = app(Arc::clone(&sessions));

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{id}"))
                .body(Body::empty())
                .unwrap()
        };
        let resp = router.clone().oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(sessions.is_empty());

        let resp = router.oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn typewriter_stream_is_sse() {
        let sessions = registry(4, true);
        let (id, _) = sessions.open().unwrap();
        let resp = app(Arc::clone(&sessions))
            .oneshot(get_req(&format!("/api/sessions/{id}/typewriter")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
        sessions.close_all("test");
    }

    #[tokio::test(start_paused = true)]
    async fn open_typewriter_stream_survives_sweep() {
        let sessions = registry(4, true);
        let (id, _) = sessions.open().unwrap();
        let resp = app(Arc::clone(&sessions))
            .oneshot(get_req(&format!("/api/sessions/{id}/typewriter")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(sessions.sweep_idle(), 0);
        assert_eq!(sessions.len(), 1);

        drop(resp);
        assert_eq!(sessions.sweep_idle(), 1);
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn typewriter_without_ticker_returns_404() {
        let sessions = registry(4, false);
        let (id, _) = sessions.open().unwrap();
        let resp = app(sessions)
            .oneshot(get_req(&format!("/api/sessions/{id}/typewriter")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bind_serves_until_cancelled() {
        let cancel = CancellationToken::new();
        let (server, addr) = HttpServer::bind(
            HttpConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
                media_dir: PathBuf::from("media"),
            },
            "<html></html>".to_string(),
            registry(4, false),
            cancel.clone(),
        )
        .await
        .unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown();
        tokio::time::timeout(Duration::from_secs(5), server.wait())
            .await
            .unwrap();
    }
}
