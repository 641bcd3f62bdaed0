//! HTTP adapter for the memory service
//!
//! Exposes chat, store, query, snapshot and eviction endpoints as JSON, the
//! forgetting counters on `/api/stats`, and live [`MemoryEvent`]s as
//! Server-Sent Events on `/api/events`.
//!
//! [`MemoryEvent`]: crate::memory::events::MemoryEvent

pub mod error;
pub mod handlers;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ForgettingConfig, ServerConfig};
use crate::error::{ForgetError, Result};
use crate::memory::forgetting::Forgetter;
use crate::service::MemoryService;

pub use error::ApiError;

/// Shared application state for all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    pub service: Arc<MemoryService>,
    /// Forgetting process, read for its counters
    pub forgetter: Arc<Forgetter>,
    /// Cancelled once the server begins shutting down; ends open event streams
    pub shutdown: CancellationToken,
}

/// The daemon: HTTP server plus the background forgetting task
pub struct MemoryServer {
    config: ServerConfig,
    forgetting: ForgettingConfig,
    service: Arc<MemoryService>,
    forgetter: Arc<Forgetter>,
}

impl MemoryServer {
    pub fn new(
        config: ServerConfig,
        forgetting: ForgettingConfig,
        service: Arc<MemoryService>,
        forgetter: Arc<Forgetter>,
    ) -> Self {
        Self {
            config,
            forgetting,
            service,
            forgetter,
        }
    }

    fn state(&self, shutdown: CancellationToken) -> Arc<AppState> {
        Arc::new(AppState {
            config: self.config.clone(),
            service: self.service.clone(),
            forgetter: self.forgetter.clone(),
            shutdown,
        })
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn serve(&self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|e| ForgetError::Config(format!("Invalid listen address: {e}")))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ForgetError::Server(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!("Starting memory server on {addr}");
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The forgetting task, when enabled, lives exactly as long as the server.
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = if self.forgetting.enabled {
            let period = Duration::from_secs(self.forgetting.interval_secs);
            Some(self.forgetter.clone().start(period))
        } else {
            tracing::info!("Forgetting process disabled");
            None
        };

        // Graceful shutdown waits on open connections, so long-lived event
        // streams must end when the signal fires.
        let streams = CancellationToken::new();
        let app = create_router(self.state(streams.clone()));
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                streams.cancel();
            })
            .await
            .map_err(|e| ForgetError::Server(format!("Server error: {e}")));

        if let Some(handle) = handle {
            handle.stop().await;
        }

        result?;
        tracing::info!("Memory server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/chat", post(handlers::chat_handler))
        .route(
            "/api/memories",
            get(handlers::memories_handler).post(handlers::store_handler),
        )
        .route("/api/memories/search", get(handlers::search_handler))
        .route(
            "/api/memories/{key}",
            get(handlers::memory_handler).delete(handlers::forget_handler),
        )
        .route("/api/stats", get(handlers::stats_handler))
        .route("/api/events", get(handlers::events_handler))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::MemoryStore;
    use crate::testing::{ManualClock, SequenceRandom};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn create_test_state() -> Arc<AppState> {
        let store = Arc::new(
            MemoryStore::new()
                .with_clock(Arc::new(ManualClock::default()))
                .with_random(Arc::new(SequenceRandom::constant(0.5))),
        );
        let service = MemoryService::new(store.clone())
            .with_random(Arc::new(SequenceRandom::constant(0.0)));
        let forgetter = Forgetter::new(store).with_events(service.events());

        Arc::new(AppState {
            config: ServerConfig::default(),
            service: Arc::new(service),
            forgetter: Arc::new(forgetter),
            shutdown: CancellationToken::new(),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["type"], "invalid_body");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/memories/search")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["type"],
            "missing_parameter"
        );
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_found() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/memories/nothing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/chat")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );
    }

    #[tokio::test]
    async fn test_serve_on_stops_forgetting_with_server() {
        let state = create_test_state();
        let server = MemoryServer::new(
            ServerConfig::default(),
            ForgettingConfig::default(),
            state.service.clone(),
            state.forgetter.clone(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.serve_on(listener, async {}),
        )
        .await
        .expect("server should stop promptly");

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_with_open_event_stream() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let state = create_test_state();
        let server = MemoryServer::new(
            ServerConfig::default(),
            ForgettingConfig::default(),
            state.service.clone(),
            state.forgetter.clone(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let serving = tokio::spawn(async move {
            server
                .serve_on(listener, async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /api/events HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let mut buf = vec![0u8; 1024];
        let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("event stream should answer")
            .unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

        stop_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .expect("server should stop while a subscriber is connected")
            .unwrap();
        assert!(result.is_ok());
    }
}
