//! Role-based access control.
//!
//! Roles form a closed enumeration; every check is an exhaustive match, not
//! a string comparison. A `Permission` is the predicate a route requires,
//! checked against the resolved principal (or its absence).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid role")]
pub struct InvalidRole;

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "user" => Ok(Role::User),
            _ => Err(InvalidRole),
        }
    }
}

/// The authenticated identity behind a request. Only active users resolve
/// to a principal; a disabled account is indistinguishable from an
/// unauthenticated request as far as permissions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    IsAuthenticated,
    IsStaffOrAdmin,
    IsAdmin,
}

impl Permission {
    /// Allow/deny. Unauthenticated requests are denied by every predicate;
    /// denial has no side effects.
    pub fn allows(&self, principal: Option<&Principal>) -> bool {
        let Some(p) = principal else { return false };
        match self {
            Permission::IsAuthenticated => true,
            Permission::IsStaffOrAdmin => matches!(p.role, Role::Admin | Role::Staff),
            Permission::IsAdmin => matches!(p.role, Role::Admin),
        }
    }
}
