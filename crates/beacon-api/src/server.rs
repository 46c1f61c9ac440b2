//! HTTP server configuration and request routing.
//!
//! Axum router assembly with the middleware stack: request-id injection,
//! request/response tracing and a request timeout. Ingestion and query
//! routes share one `AppState`; the retention scheduler runs outside the
//! router as its own background task.

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{handlers, AppState};

/// Creates the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(handlers::health_check));

    let api_routes = Router::new()
        .route("/events", post(handlers::create_event).get(handlers::list_events))
        .route("/ui-events", post(handlers::create_ui_event).get(handlers::list_ui_events))
        .route("/errors/ui", post(handlers::create_ui_error).get(handlers::list_ui_errors))
        .route(
            "/service-errors",
            post(handlers::create_service_error).get(handlers::list_service_errors),
        )
        .route(
            "/sessions/record",
            post(handlers::start_recorded_session).get(handlers::list_recorded_sessions),
        )
        .route("/sessions/record/{id}", get(handlers::get_recorded_session))
        .route("/sessions/record/{id}/end", post(handlers::end_recorded_session))
        .route("/analytics/summary", get(handlers::analytics_summary))
        .route("/stats", get(handlers::stats))
        .route("/cleanup", post(handlers::run_cleanup));

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Injects an `X-Request-Id` header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server, serving until the shutdown future resolves.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while running.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "collector API listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
