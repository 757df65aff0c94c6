//! Payer-facing endpoints: the public page and payment submission.

use super::{AppState, error::ApiError};
use crate::{
    core::{page::get_public_page, payment::submit_payment},
    errors::Error,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/paypoint/*slug", get(show).post(pay))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = get_public_page(&state.db, slug.trim_start_matches('/')).await?;
    Ok(Json(view))
}

/// Slugs contain a `/`, so payments are posted to `/paypoint/{slug}/pay` through the
/// same wildcard route.
async fn pay(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let path = path.trim_start_matches('/');
    let slug = path.strip_suffix("/pay").ok_or_else(|| Error::PageNotFound {
        reference: path.to_string(),
    })?;
    let receipt = submit_payment(&state.db, &state.locks, slug, &body).await?;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::super::{build_router, test_support::send};
    use super::*;
    use crate::{
        errors::Result,
        test_utils::{
            create_test_organization, create_test_page, payment_payload, setup_test_db,
            setup_with_published_page,
        },
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_public_page_and_payment() -> Result<()> {
        let (db, _locks, page) = setup_with_published_page().await?;
        let router = build_router(Arc::new(AppState::new(db)));

        let (status, body) = send(&router, "GET", &format!("/paypoint/{}", page.slug), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paypoint"]["id"], page.id.as_str());
        assert!(body["paypoint"]["builder"].get("automation").is_none());

        let (status, body) = send(
            &router,
            "POST",
            &format!("/paypoint/{}/pay", page.slug),
            None,
            Some(payment_payload("Ama Owusu")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageTitle"], page.title.as_str());
        assert_eq!(body["amount"].as_f64().unwrap(), page.amount);
        assert_eq!(body["method"], "mobile-money");

        let (_, body) = send(&router, "GET", &format!("/paypoint/{}", page.slug), None, None).await;
        assert_eq!(body["stats"]["transactions"], 1);
        assert_eq!(body["recentTransactions"][0]["memberName"], "Ama Owusu");
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_validation_is_bad_request() -> Result<()> {
        let (db, _locks, page) = setup_with_published_page().await?;
        let router = build_router(Arc::new(AppState::new(db)));

        let (status, body) = send(
            &router,
            "POST",
            &format!("/paypoint/{}/pay", page.slug),
            None,
            Some(json!({"method": "card", "responses": {"field-full-name": "Ama"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Missing required fields: Student ID, Department, Year Group."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_draft_page_is_forbidden() -> Result<()> {
        let db = setup_test_db().await?;
        let org = create_test_organization(&db).await?;
        let page = create_test_page(&db, &org, "Robotics Workshop Fee", None).await?;
        let router = build_router(Arc::new(AppState::new(db)));

        let (status, _) = send(&router, "GET", &format!("/paypoint/{}", page.slug), None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &router,
            "POST",
            &format!("/paypoint/{}/pay", page.slug),
            None,
            Some(payment_payload("Ama")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_slug_and_missing_pay_suffix() -> Result<()> {
        let router = build_router(Arc::new(AppState::new(setup_test_db().await?)));

        let (status, _) = send(&router, "GET", "/paypoint/nobody/nothing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            "POST",
            "/paypoint/nobody/nothing",
            None,
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
