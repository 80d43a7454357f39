use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub performed_by: Uuid,
    pub target_user: Option<Uuid>,
    pub action: String,
    pub timestamp: DateTimeWithTimeZone,
    pub details: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    PerformedBy,
    TargetUser,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::PerformedBy => Entity::belongs_to(user::Entity)
                .from(Column::PerformedBy)
                .to(user::Column::Id)
                .into(),
            Relation::TargetUser => Entity::belongs_to(user::Entity)
                .from(Column::TargetUser)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PerformedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Append one immutable entry. The timestamp is assigned here and never
/// mutated afterwards.
pub async fn append(
    db: &DatabaseConnection,
    performed_by: Uuid,
    target_user: Option<Uuid>,
    action: &str,
    details: Option<Json>,
) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        performed_by: Set(performed_by),
        target_user: Set(target_user),
        action: Set(action.to_string()),
        timestamp: Set(Utc::now().into()),
        details: Set(details),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// All entries, newest first.
pub async fn list_desc(db: &DatabaseConnection) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .order_by_desc(Column::Timestamp)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn performer_relation_joins_to_user() {
        let sql = Entity::find()
            .find_also_related(user::Entity)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("JOIN"), "expected a join in: {}", sql);
        assert!(sql.contains("\"user\""), "expected the user table in: {}", sql);
    }
}
