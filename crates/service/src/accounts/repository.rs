use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::domain::{AuditAction, AuditEntry, UserAccount};
use crate::access::Role;
use crate::errors::ServiceError;

/// Repository abstraction for accounts and the audit trail.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// `Conflict` when the email is already registered.
    async fn insert_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserAccount, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, ServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, ServiceError>;
    /// `None` when the target does not exist.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<UserAccount>, ServiceError>;
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<UserAccount>, ServiceError>;
    /// All users, newest joiners first.
    async fn list_users(&self) -> Result<Vec<UserAccount>, ServiceError>;
    /// Append-only; the timestamp is assigned at insertion and never moves.
    async fn append_audit(
        &self,
        performed_by: Uuid,
        target_user: Option<Uuid>,
        action: AuditAction,
        details: Value,
    ) -> Result<(), ServiceError>;
    /// All entries newest first, with performer/target summarized inline.
    async fn list_audit(&self) -> Result<Vec<AuditEntry>, ServiceError>;
}

/// In-memory mock repository for tests and doc examples.
pub mod mock {
    use super::*;
    use crate::accounts::domain::UserBrief;
    use chrono::Utc;
    use std::sync::Mutex;

    struct LogRow {
        id: Uuid,
        performed_by: Uuid,
        target_user: Option<Uuid>,
        action: AuditAction,
        timestamp: chrono::DateTime<Utc>,
        details: Value,
    }

    #[derive(Default)]
    pub struct MockAccountRepository {
        users: Mutex<Vec<UserAccount>>,
        logs: Mutex<Vec<LogRow>>,
    }

    impl MockAccountRepository {
        pub fn audit_len(&self) -> usize {
            self.logs.lock().unwrap().len()
        }
    }

    fn brief(users: &[UserAccount], id: Uuid) -> Option<UserBrief> {
        users
            .iter()
            .find(|u| u.id == id)
            .map(|u| UserBrief { id: u.id, email: u.email.clone(), role: u.role })
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn insert_user(
            &self,
            email: &str,
            username: &str,
            password_hash: &str,
            role: Role,
        ) -> Result<UserAccount, ServiceError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == email) {
                return Err(ServiceError::Conflict("email already registered".into()));
            }
            let user = UserAccount {
                id: Uuid::new_v4(),
                email: email.to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
                is_active: true,
                date_joined: Utc::now(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, ServiceError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, ServiceError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<UserAccount>, ServiceError> {
            let mut users = self.users.lock().unwrap();
            let Some(user) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            user.role = role;
            Ok(Some(user.clone()))
        }

        async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<UserAccount>, ServiceError> {
            let mut users = self.users.lock().unwrap();
            let Some(user) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            user.is_active = is_active;
            Ok(Some(user.clone()))
        }

        async fn list_users(&self) -> Result<Vec<UserAccount>, ServiceError> {
            let mut users = self.users.lock().unwrap().clone();
            users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
            Ok(users)
        }

        async fn append_audit(
            &self,
            performed_by: Uuid,
            target_user: Option<Uuid>,
            action: AuditAction,
            details: Value,
        ) -> Result<(), ServiceError> {
            self.logs.lock().unwrap().push(LogRow {
                id: Uuid::new_v4(),
                performed_by,
                target_user,
                action,
                timestamp: Utc::now(),
                details,
            });
            Ok(())
        }

        async fn list_audit(&self) -> Result<Vec<AuditEntry>, ServiceError> {
            let users = self.users.lock().unwrap();
            let logs = self.logs.lock().unwrap();
            // insertion order is chronological; reverse for newest-first
            Ok(logs
                .iter()
                .rev()
                .map(|row| AuditEntry {
                    id: row.id,
                    action: row.action,
                    performed_by: brief(&users, row.performed_by),
                    target_user: row.target_user.and_then(|t| brief(&users, t)),
                    timestamp: row.timestamp,
                    details: row.details.clone(),
                })
                .collect())
        }
    }
}
