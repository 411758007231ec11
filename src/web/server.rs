//! API server assembly

use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::TokenVerifier;
use crate::storage::DrinkStore;

use super::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

/// Build the router with all drink routes.
///
/// Exposed separately from [`ApiServer`] so tests can drive the router
/// directly without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(routes::list_drinks).post(routes::create_drink),
        )
        .route("/drinks-detail", get(routes::drink_details))
        .route(
            "/drinks/{id}",
            patch(routes::update_drink).delete(routes::delete_drink),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the drinks API
pub struct ApiServer {
    bind: String,
    state: AppState,
}

impl ApiServer {
    pub fn new(bind: impl Into<String>, store: Arc<dyn DrinkStore>, verifier: TokenVerifier) -> Self {
        Self {
            bind: bind.into(),
            state: AppState {
                store,
                verifier: Arc::new(verifier),
            },
        }
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(&self.bind).await?;

        tracing::info!(bind = %self.bind, "starting drinks API");

        axum::serve(listener, app).await?;

        Ok(())
    }
}
