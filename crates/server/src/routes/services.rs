//! Catalog handlers: nearby search, listing, detail and the staff/admin
//! mutation endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use common::Envelope;
use service::{
    access::Principal,
    catalog::domain::{NearbyQuery, ServiceInput},
};
use uuid::Uuid;

use crate::auth::ServerState;
use crate::errors::ApiError;

const DEFAULT_RADIUS_KM: f64 = 5.0;

fn fetched_message(base: &str, cached: bool) -> String {
    if cached {
        format!("{} (cached)", base)
    } else {
        base.to_string()
    }
}

fn parse_nearby(params: &HashMap<String, String>) -> Result<NearbyQuery, ApiError> {
    let (Some(lat), Some(lng)) = (params.get("latitude"), params.get("longitude")) else {
        return Err(ApiError::MissingParam("latitude and longitude are required".into()));
    };
    let radius = params.get("radius").map(String::as_str).unwrap_or("");

    let parsed = (|| {
        let latitude: f64 = lat.parse().ok()?;
        let longitude: f64 = lng.parse().ok()?;
        let radius_km: f64 = if radius.is_empty() { DEFAULT_RADIUS_KM } else { radius.parse().ok()? };
        Some((latitude, longitude, radius_km))
    })();
    let Some((latitude, longitude, radius_km)) = parsed else {
        return Err(ApiError::MissingParam("Invalid latitude, longitude or radius".into()));
    };

    Ok(NearbyQuery {
        latitude,
        longitude,
        radius_km,
        category: params.get("category").cloned().unwrap_or_default(),
    })
}

pub async fn nearby(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let query = parse_nearby(&params)?;
    let out = state.catalog.nearby(&query).await?;
    let msg = fetched_message("Nearby services fetched successfully", out.cached);
    Ok((StatusCode::OK, Json(Envelope::success(msg, out.data))))
}

pub async fn list_services(
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let services = state.catalog.list().await?;
    let data = serde_json::to_value(services).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success("Services fetched successfully", data))))
}

pub async fn service_detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let out = state.catalog.detail(id).await?.ok_or_else(|| ApiError::not_found("Service"))?;
    let msg = fetched_message("Service details fetched successfully", out.cached);
    Ok((StatusCode::OK, Json(Envelope::success(msg, out.data))))
}

pub async fn create_service(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let created = state.catalog.create(principal.id, input).await?;
    let data = serde_json::to_value(created).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(Envelope::success("Service created successfully", data))))
}

pub async fn update_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let updated = state
        .catalog
        .update(id, input)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;
    let data = serde_json::to_value(updated).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success("Service updated successfully", data))))
}

pub async fn delete_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    if !state.catalog.delete(id).await? {
        return Err(ApiError::not_found("Service"));
    }
    Ok((
        StatusCode::OK,
        Json(Envelope::success("Service deleted successfully", serde_json::Value::String(String::new()))),
    ))
}
