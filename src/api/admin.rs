//! Organization admin endpoints.

use super::{AppState, error::ApiError};
use crate::core::{
    activity::recent_activity,
    library::builder_metadata,
    metrics::update_transaction_status,
    page::{
        NewPage, create_page, get_builder, list_pages, list_transactions, page_report,
        save_builder, set_page_status,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;

const ORGANIZATION_HEADER: &str = "x-organization-id";
const ACTOR_HEADER: &str = "x-actor-name";
const DEFAULT_ACTOR: &str = "Organization admin";

type ApiResult<T> = Result<T, ApiError>;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/paypoints", get(list).post(create))
        .route("/paypoints/builder/metadata", get(metadata))
        .route("/paypoints/:id/status", post(change_status))
        .route("/paypoints/:id/builder", get(builder).post(save))
        .route("/paypoints/:id/transactions", get(transactions))
        .route("/paypoints/:id/report", get(report))
        .route("/transactions/:id/status", post(change_transaction_status))
        .route("/activity", get(activity))
}

/// Caller identity supplied by the session layer.
struct Admin {
    organization_id: String,
    actor: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn admin(headers: &HeaderMap) -> ApiResult<Admin> {
    let organization_id = header(headers, ORGANIZATION_HEADER).ok_or(ApiError::Unauthenticated)?;
    Ok(Admin {
        organization_id: organization_id.to_string(),
        actor: header(headers, ACTOR_HEADER)
            .unwrap_or(DEFAULT_ACTOR)
            .to_string(),
    })
}

fn status_field(body: &Value) -> &str {
    body.get("status").and_then(Value::as_str).unwrap_or_default()
}

async fn metadata(headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    admin(&headers)?;
    Ok(Json(builder_metadata()))
}

async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let items = list_pages(&state.db, &admin.organization_id).await?;
    Ok(Json(json!({ "items": items })))
}

async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let page = create_page(
        &state.db,
        &admin.organization_id,
        &admin.actor,
        NewPage::from_payload(&body),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let page = set_page_status(
        &state.db,
        &state.locks,
        &admin.organization_id,
        &id,
        status_field(&body),
        &admin.actor,
    )
    .await?;
    Ok(Json(page))
}

async fn builder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let view = get_builder(&state.db, &state.locks, &admin.organization_id, &id).await?;
    Ok(Json(view))
}

async fn save(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let view = save_builder(
        &state.db,
        &state.locks,
        &admin.organization_id,
        &id,
        &admin.actor,
        &body,
    )
    .await?;
    Ok(Json(view))
}

async fn transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let listing = list_transactions(&state.db, &admin.organization_id, &id).await?;
    Ok(Json(listing))
}

async fn report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let report = page_report(&state.db, &admin.organization_id, &id).await?;
    Ok(Json(report))
}

async fn change_transaction_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let updated = update_transaction_status(
        &state.db,
        &state.locks,
        &admin.organization_id,
        id,
        status_field(&body),
    )
    .await?;
    Ok(Json(updated))
}

async fn activity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let admin = admin(&headers)?;
    let items = recent_activity(&state.db, &admin.organization_id).await?;
    Ok(Json(json!({ "items": items })))
}
