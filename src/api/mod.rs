//! HTTP surface.
//!
//! Organization admin routes live under `/org` and identify the caller through the
//! `x-organization-id` and `x-actor-name` headers set by the upstream session layer.
//! Payer routes live under `/paypoint` and need no identity.

mod admin;
mod error;
mod public;

pub use error::ApiError;

use crate::core::locks::PageLocks;
use axum::{Json, Router, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    /// Store connection
    pub db: DatabaseConnection,
    /// Per-page mutual exclusion
    pub locks: PageLocks,
}

impl AppState {
    /// Wraps a connection with a fresh lock table.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            locks: PageLocks::new(),
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/org", admin::router())
        .merge(public::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    pub const ORG_HEADER: &str = "x-organization-id";
    pub const ACTOR_HEADER: &str = "x-actor-name";

    /// Sends one request and returns the status with the JSON body.
    pub async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        organization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(organization) = organization {
            request = request
                .header(ORG_HEADER, organization)
                .header(ACTOR_HEADER, "Akosua Mensah");
        }
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::send, *};
    use crate::{errors::Result, test_utils::setup_test_db};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let router = build_router(Arc::new(AppState::new(setup_test_db().await?)));
        let (status, body) = send(&router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }
}
