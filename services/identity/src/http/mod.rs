//! HTTP API (axum), mounted under `/api/v1`.

pub mod dto;
pub mod handlers;
pub mod middleware;

use crate::auth::AuthService;
use crate::server::Protocol;
use axum::routing::{get, post};
use axum::Router;
use futures::future::BoxFuture;
use rust_common::ShutdownSignal;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Auth service
    pub auth: Arc<AuthService>,
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    let user = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh));

    let admin = Router::new()
        .route("/user/all", get(handlers::list_users))
        .route("/user/:id", get(handlers::get_user_by_id))
        .route(
            "/user",
            get(handlers::get_user_by_email).post(handlers::create_user),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_access_token,
        ));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::render_metrics))
        .nest("/api/v1", Router::new().nest("/user", user).nest("/admin", admin))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves a router with axum.
#[derive(Debug)]
pub struct HttpProtocol {
    router: Router,
}

impl HttpProtocol {
    /// Wraps a router.
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self { router }
    }
}

impl Protocol for HttpProtocol {
    fn name(&self) -> &'static str {
        "http"
    }

    fn serve(
        self: Box<Self>,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> BoxFuture<'static, io::Result<()>> {
        Box::pin(async move {
            axum::serve(listener, self.router)
                .with_graceful_shutdown(shutdown.recv())
                .await
        })
    }
}
