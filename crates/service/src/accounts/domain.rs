use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::Role;

/// Registration payload; everything optional so validation can report each
/// missing field. The same path serves self-registration and admin-driven
/// user creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Full account row as the business layer sees it, hash included. Never
/// serialized to clients — responses go through `UserSummary`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Client-facing view of an account. No password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&UserAccount> for UserSummary {
    fn from(u: &UserAccount) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            username: u.username.clone(),
            role: u.role,
            is_active: u.is_active,
            date_joined: u.date_joined,
        }
    }
}

/// Login result: the user plus a signed bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserSummary,
    pub token: String,
}

/// The closed set of audited admin actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CreateUser,
    UpdateRole,
    ToggleStatus,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateUser => "create_user",
            AuditAction::UpdateRole => "update_role",
            AuditAction::ToggleStatus => "toggle_status",
        }
    }
}

/// Inline performer/target summary on a listed audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// One immutable audit record, as listed (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub performed_by: Option<UserBrief>,
    pub target_user: Option<UserBrief>,
    pub timestamp: DateTime<Utc>,
    pub details: Value,
}
