use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub metadata: Option<Json>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    CreatedBy,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::CreatedBy => Entity::belongs_to(user::Entity)
                .from(Column::CreatedBy)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewService {
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub metadata: Option<Json>,
    pub created_by: Uuid,
}

pub async fn create(db: &DatabaseConnection, new: NewService) -> Result<Model, errors::ModelError> {
    let now = Utc::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(new.name),
        category: Set(new.category),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        rating: Set(new.rating),
        metadata: Set(new.metadata),
        created_by: Set(new.created_by),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find().all(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Full replacement of the mutable fields; `updated_at` is server-assigned
/// and never moves backwards.
pub struct ServiceChanges {
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub metadata: Option<Json>,
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    changes: ServiceChanges,
) -> Result<Option<Model>, errors::ModelError> {
    let found = Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    let Some(found) = found else { return Ok(None) };
    let mut am: ActiveModel = found.into();
    am.name = Set(changes.name);
    am.category = Set(changes.category);
    am.latitude = Set(changes.latitude);
    am.longitude = Set(changes.longitude);
    am.rating = Set(changes.rating);
    am.metadata = Set(changes.metadata);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(Some(updated))
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}

/// Bounding-box candidate fetch for the nearby search. Exact distance
/// filtering happens in the service layer; this only narrows the scan.
/// A non-positive radius short-circuits to the exact-point match.
pub async fn find_in_bounds(
    db: &DatabaseConnection,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Latitude.between(min_lat, max_lat))
        .filter(Column::Longitude.between(min_lng, max_lng))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
