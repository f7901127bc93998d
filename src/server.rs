//! Router assembly and serving.
//!
//! Wires ports to handlers and handlers to routes. Used by the binary and by
//! the integration tests, which serve the same router on an ephemeral port.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::http::{auth_middleware, message_router, AuthState, MessageAppState};
use crate::adapters::websocket::{websocket_router, SessionRegistry, StreamingState};
use crate::application::handlers::{
    GetHistoryHandler, SendMessageHandler, StreamTurnConfig, StreamTurnHandler,
};
use crate::config::ServerConfig;
use crate::ports::{ConversationStore, MessageStore, ReplyGenerator, TokenVerifier};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Collaborators shared by every route.
#[derive(Clone)]
pub struct Services {
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub conversation_store: Arc<dyn ConversationStore>,
    pub message_store: Arc<dyn MessageStore>,
    pub reply_generator: Arc<dyn ReplyGenerator>,
    pub registry: Arc<SessionRegistry>,
    pub stream_config: StreamTurnConfig,
}

impl Services {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        conversation_store: Arc<dyn ConversationStore>,
        message_store: Arc<dyn MessageStore>,
        reply_generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            token_verifier,
            conversation_store,
            message_store,
            reply_generator,
            registry: Arc::new(SessionRegistry::new()),
            stream_config: StreamTurnConfig::default(),
        }
    }

    pub fn with_stream_config(mut self, stream_config: StreamTurnConfig) -> Self {
        self.stream_config = stream_config;
        self
    }
}

/// HTTP-level settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            cors_origins: config.cors_origins_list(),
            request_timeout: config.request_timeout(),
        }
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        if origins.is_empty() || self.cors_origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Build the Axum router with all routes.
///
/// - `GET /health`
/// - `POST /api/message/:conversation_id/send_message`
/// - `GET /api/message/:conversation_id/history`
/// - `GET /v1/ws/conversations/:conversation_id` (WebSocket)
pub fn build_router(services: &Services, settings: &HttpSettings) -> Router {
    let stream_handler = Arc::new(StreamTurnHandler::with_config(
        services.message_store.clone(),
        services.reply_generator.clone(),
        services.stream_config.clone(),
    ));
    let streaming_state = StreamingState::new(
        services.token_verifier.clone(),
        services.conversation_store.clone(),
        services.registry.clone(),
        stream_handler,
    );

    let message_state = MessageAppState::new(
        Arc::new(SendMessageHandler::new(
            services.conversation_store.clone(),
            services.message_store.clone(),
            services.reply_generator.clone(),
            services.stream_config.max_content_chars,
        )),
        Arc::new(GetHistoryHandler::new(
            services.conversation_store.clone(),
            services.message_store.clone(),
        )),
    );
    let auth_state: AuthState = services.token_verifier.clone();

    // Timeouts and compression only make sense for request/response routes.
    let api = message_router()
        .with_state(message_state)
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(settings.request_timeout));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(websocket_router().with_state(streaming_state))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .layer(settings.cors_layer())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Serves `router` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
