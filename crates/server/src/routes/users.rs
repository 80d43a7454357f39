//! Account handlers: registration, login, and the admin-only user
//! management and audit endpoints.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use common::Envelope;
use serde::Deserialize;
use serde_json::{json, Value};
use service::{access::{Principal, Role}, accounts::domain::RegisterInput};
use uuid::Uuid;

use crate::auth::ServerState;
use crate::errors::ApiError;

pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let user = state.accounts.register(input).await?;
    let data = json!({"email": user.email, "username": user.username, "role": user.role});
    Ok((StatusCode::CREATED, Json(Envelope::success("User registered successfully", data))))
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::MissingParam("Email and password are required".into()));
    };
    let session = state.accounts.login(&email, &password).await?;
    let user = serde_json::to_value(&session.user).map_err(|e| ApiError::Internal(e.to_string()))?;
    let data = json!({"token": session.token, "user": user});
    Ok((StatusCode::OK, Json(Envelope::success("Login successful", data))))
}

pub async fn admin_create_user(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let user = state.accounts.admin_create_user(principal.id, input).await?;
    let data = serde_json::to_value(&user).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(Envelope::success("User created successfully", data))))
}

pub async fn list_users(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let id = match params.get("id") {
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| ApiError::InvalidValue("Invalid user id".into()))?,
        ),
        None => None,
    };
    let users = state.accounts.list_users(id).await?;
    let data = serde_json::to_value(users).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success("Users fetched successfully", data))))
}

pub async fn update_role(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let role = match body.get("role") {
        None | Some(Value::Null) => {
            return Err(ApiError::Validation("Role field is required".into()))
        }
        Some(v) => {
            let raw = v.as_str().unwrap_or_default();
            Role::from_str(raw).map_err(|_| ApiError::InvalidValue("Invalid role".into()))?
        }
    };
    let user = state.accounts.update_role(principal.id, id, role).await?;
    let data = serde_json::to_value(&user).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success("User role updated successfully", data))))
}

/// The flag is parsed before any service call so a malformed payload never
/// reaches the store.
fn parse_is_active(body: &Value) -> Result<bool, ApiError> {
    match body.get("is_active") {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ApiError::InvalidValue("Missing 'is_active' field in request".into())),
        },
        _ => Err(ApiError::InvalidValue("Missing 'is_active' field in request".into())),
    }
}

pub async fn toggle_status(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let is_active = parse_is_active(&body)?;
    let user = state.accounts.toggle_status(principal.id, id, is_active).await?;
    let msg = if is_active { "User enabled successfully" } else { "User disabled successfully" };
    let data = serde_json::to_value(&user).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success(msg, data))))
}

pub async fn activity_logs(
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let logs = state.accounts.activity_logs().await?;
    let data = serde_json::to_value(logs).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::OK, Json(Envelope::success("Activity logs fetched successfully", data))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_active_accepts_bool_and_string_forms() {
        assert!(parse_is_active(&json!({"is_active": true})).unwrap());
        assert!(!parse_is_active(&json!({"is_active": false})).unwrap());
        assert!(parse_is_active(&json!({"is_active": "true"})).unwrap());
        assert!(!parse_is_active(&json!({"is_active": "False"})).unwrap());
    }

    #[test]
    fn is_active_missing_or_malformed_is_rejected() {
        for body in [json!({}), json!({"is_active": "maybe"}), json!({"is_active": 1})] {
            let err = parse_is_active(&body).unwrap_err();
            assert!(matches!(err, ApiError::InvalidValue(_)));
        }
    }
}
