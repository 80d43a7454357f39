use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::Value;
use uuid::Uuid;

use crate::access::Role;
use crate::accounts::domain::{AuditAction, AuditEntry, UserAccount, UserBrief};
use crate::accounts::repository::AccountRepository;
use crate::errors::ServiceError;

/// SeaORM-backed accounts repository.
pub struct SeaOrmAccountRepository {
    pub db: DatabaseConnection,
}

fn to_account(m: models::user::Model) -> Result<UserAccount, ServiceError> {
    // A row with an unknown role string is data corruption, not a request
    // problem; surface it as a database error.
    let role = Role::from_str(&m.role)
        .map_err(|_| ServiceError::Db(format!("unknown role '{}' for user {}", m.role, m.id)))?;
    Ok(UserAccount {
        id: m.id,
        email: m.email,
        username: m.username,
        password_hash: m.password_hash,
        role,
        is_active: m.is_active,
        date_joined: m.date_joined.to_utc(),
    })
}

fn action_from_str(s: &str) -> Result<AuditAction, ServiceError> {
    match s {
        "create_user" => Ok(AuditAction::CreateUser),
        "update_role" => Ok(AuditAction::UpdateRole),
        "toggle_status" => Ok(AuditAction::ToggleStatus),
        other => Err(ServiceError::Db(format!("unknown audit action '{}'", other))),
    }
}

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn insert_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserAccount, ServiceError> {
        if models::user::find_by_email(&self.db, email).await?.is_some() {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        let created = models::user::create(&self.db, email, username, password_hash, role.as_str()).await?;
        to_account(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, ServiceError> {
        models::user::find_by_email(&self.db, email).await?.map(to_account).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, ServiceError> {
        models::user::find_by_id(&self.db, id).await?.map(to_account).transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<UserAccount>, ServiceError> {
        models::user::set_role(&self.db, id, role.as_str()).await?.map(to_account).transpose()
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<UserAccount>, ServiceError> {
        models::user::set_active(&self.db, id, is_active).await?.map(to_account).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, ServiceError> {
        models::user::list_by_join_date(&self.db)
            .await?
            .into_iter()
            .map(to_account)
            .collect()
    }

    async fn append_audit(
        &self,
        performed_by: Uuid,
        target_user: Option<Uuid>,
        action: AuditAction,
        details: Value,
    ) -> Result<(), ServiceError> {
        models::activity_log::append(&self.db, performed_by, target_user, action.as_str(), Some(details)).await?;
        Ok(())
    }

    async fn list_audit(&self) -> Result<Vec<AuditEntry>, ServiceError> {
        let rows = models::activity_log::list_desc(&self.db).await?;

        // Batch-load every referenced user in one query, then join in memory.
        let mut ids: Vec<Uuid> = Vec::new();
        for row in &rows {
            ids.push(row.performed_by);
            if let Some(t) = row.target_user {
                ids.push(t);
            }
        }
        ids.sort_unstable();
        ids.dedup();

        let users = models::user::Entity::find()
            .filter(models::user::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        let briefs: HashMap<Uuid, UserBrief> = users
            .into_iter()
            .filter_map(|u| {
                let role = Role::from_str(&u.role).ok()?;
                Some((u.id, UserBrief { id: u.id, email: u.email, role }))
            })
            .collect();

        rows.into_iter()
            .map(|row| {
                Ok(AuditEntry {
                    id: row.id,
                    action: action_from_str(&row.action)?,
                    performed_by: briefs.get(&row.performed_by).cloned(),
                    target_user: row.target_user.and_then(|t| briefs.get(&t).cloned()),
                    timestamp: row.timestamp.to_utc(),
                    details: row.details.unwrap_or(Value::Null),
                })
            })
            .collect()
    }
}
