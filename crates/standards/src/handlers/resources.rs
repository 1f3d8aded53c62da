//! CRUD handlers shared by every entity kind.
//!
//! Each handler is generic over the entity type; `app::resource_routes`
//! instantiates them once per kind.

use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use standards_core::domain::{Entity, EntityKind, Record, ValidationErrors};
use standards_core::query::{Page, QueryParameters};

use crate::{handlers::AppError, service::RecordDetails, state::AppState};

/// Unwraps a JSON body, turning extractor rejections into 400s.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::bad_request(e.body_text()))
}

/// Deserializes a body into the entity. Type errors are reported like
/// validation failures so clients get one error shape.
fn entity_from<E: Entity>(value: Value) -> Result<E, AppError> {
    serde_json::from_value(value)
        .map_err(|e| ValidationErrors::single("body", e.to_string()).into())
}

/// List all records of a kind (GET /api/{path}).
pub async fn list<E: Entity>(
    State(state): State<AppState>,
) -> Result<Json<Vec<Record<E>>>, AppError> {
    Ok(Json(state.service::<E>().get_all().await?))
}

/// Filter, sort and paginate records (GET /api/{path}/search).
pub async fn search<E: Entity>(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<Record<E>>>, AppError> {
    let params = QueryParameters::parse(query.as_deref().unwrap_or_default())?;
    Ok(Json(state.service::<E>().search(&params).await?))
}

/// Get a single record by ID (GET /api/{path}/{id}).
pub async fn get<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Record<E>>, AppError> {
    Ok(Json(state.service::<E>().get_by_id(id).await?))
}

/// Get a record with its referenced records (GET /api/{path}/{id}/details).
pub async fn details<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordDetails<E>>, AppError> {
    Ok(Json(state.service::<E>().details(id).await?))
}

/// Create a record (POST /api/{path}).
pub async fn create<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let data = entity_from::<E>(json_body(body)?)?;
    let record = state.service::<E>().create(data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace a record's data (PUT /api/{path}/{id}).
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record<E>>, AppError> {
    let data = entity_from::<E>(json_body(body)?)?;
    Ok(Json(state.service::<E>().edit(id, data).await?))
}

/// Apply a JSON merge patch to a record (PATCH /api/{path}/{id}).
pub async fn patch<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record<E>>, AppError> {
    let patch = json_body(body)?;
    Ok(Json(state.service::<E>().patch(id, &patch).await?))
}

/// Delete a record (DELETE /api/{path}/{id}).
pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.service::<E>().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ResourceInfo {
    pub kind: EntityKind,
    pub name: &'static str,
    pub path: String,
}

/// List the exposed resource kinds (GET /api/resources).
pub async fn list_resources() -> Json<Vec<ResourceInfo>> {
    Json(
        EntityKind::ALL
            .into_iter()
            .map(|kind| ResourceInfo {
                kind,
                name: kind.display_name(),
                path: format!("/api/{}", kind.path()),
            })
            .collect(),
    )
}
