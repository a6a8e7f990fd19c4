//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, timeout, request logging, panic
//!   recovery, CORS, body limit)
//! - Serve plain HTTP on a listener or HTTPS via rustls
//! - Stop on the shutdown broadcast

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::config::{AppConfig, TlsConfig};
use crate::http::handlers::{health, index, not_found, version, websocket_placeholder};
use crate::http::middleware::request_logging::{self, RequestLogHandle};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::DRAIN_TIMEOUT;
use crate::net::tls::load_tls_config;
use crate::observability::Logger;
use crate::{fields, log_error, log_info};

/// Outer request deadline, applied before request logging runs.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the API.
pub struct ApiServer {
    router: Router,
    config: Arc<AppConfig>,
    logger: Logger,
}

impl ApiServer {
    /// Create a new server. `logger` is used by handlers and lifecycle
    /// messages; request records go to the logger inside `request_log`.
    pub fn new(config: AppConfig, logger: Logger, request_log: RequestLogHandle) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            logger: logger.clone(),
            config: config.clone(),
        };
        let router = Self::build_router(&config, state, request_log);
        Self {
            router,
            config,
            logger,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, request_log: RequestLogHandle) -> Router {
        let routes = Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/version", get(version))
            .route("/ws", any(websocket_placeholder))
            .fallback(not_found)
            .layer(cors_layer())
            .layer(DefaultBodyLimit::max(config.uploads.max_file_size_bytes()))
            .layer(CatchPanicLayer::new())
            .with_state(state);

        // Outermost first: the id exists before the deadline starts and
        // before the request is logged.
        request_logging::install(routes, request_log).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
    }

    /// Router with every layer applied, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `host:port` from the configuration.
    pub fn address(&self) -> String {
        self.config.server.address()
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        self.log_start(addr, false);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        log_info!(self.logger, "Server stopped gracefully");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires. In-flight connections
    /// get [`DRAIN_TIMEOUT`] to finish.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
            .await
            .inspect_err(|e| {
                log_error!(
                    self.logger,
                    "Failed to load TLS configuration",
                    fields! { "error" => e.to_string() }
                );
            })?;
        self.log_start(addr, true);

        let handle = axum_server::Handle::new();
        let signal = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            signal.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(app)
            .await?;

        log_info!(self.logger, "Server stopped gracefully");
        Ok(())
    }

    fn log_start(&self, addr: SocketAddr, tls: bool) {
        log_info!(
            self.logger,
            "Server starting",
            fields! {
                "address" => addr.to_string(),
                "tls" => tls,
                "request_timeout_secs" => REQUEST_TIMEOUT.as_secs(),
                "debug" => self.config.debug.enabled,
            }
        );
    }
}

/// Browser access from any origin, with credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::RequestLogConfig;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> ApiServer {
        let logger = Logger::default();
        ApiServer::new(
            AppConfig::default(),
            logger.clone(),
            RequestLogHandle::new(RequestLogConfig::simple(logger)),
        )
    }

    #[tokio::test]
    async fn test_cors_mirrors_origin() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "https://app.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://app.example"))
        );
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_address_from_config() {
        assert_eq!(server().address(), "localhost:8080");
    }
}
