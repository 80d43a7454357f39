use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::catalog::domain::{ServiceRecord, ValidService};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::geo::BoundingBox;

/// SeaORM-backed catalog repository.
pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

fn to_record(m: models::service::Model) -> ServiceRecord {
    ServiceRecord {
        id: m.id,
        name: m.name,
        category: m.category,
        latitude: m.latitude,
        longitude: m.longitude,
        rating: m.rating,
        metadata: m.metadata,
        created_by: m.created_by,
        created_at: m.created_at.to_utc(),
        updated_at: m.updated_at.to_utc(),
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn insert(&self, created_by: Uuid, item: ValidService) -> Result<ServiceRecord, ServiceError> {
        let created = models::service::create(
            &self.db,
            models::service::NewService {
                name: item.name,
                category: item.category,
                latitude: item.latitude,
                longitude: item.longitude,
                rating: item.rating,
                metadata: item.metadata,
                created_by,
            },
        )
        .await?;
        Ok(to_record(created))
    }

    async fn get(&self, id: Uuid) -> Result<Option<ServiceRecord>, ServiceError> {
        Ok(models::service::find_by_id(&self.db, id).await?.map(to_record))
    }

    async fn list(&self) -> Result<Vec<ServiceRecord>, ServiceError> {
        Ok(models::service::list_all(&self.db).await?.into_iter().map(to_record).collect())
    }

    async fn update(&self, id: Uuid, changes: ValidService) -> Result<Option<ServiceRecord>, ServiceError> {
        let updated = models::service::update(
            &self.db,
            id,
            models::service::ServiceChanges {
                name: changes.name,
                category: changes.category,
                latitude: changes.latitude,
                longitude: changes.longitude,
                rating: changes.rating,
                metadata: changes.metadata,
            },
        )
        .await?;
        Ok(updated.map(to_record))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(models::service::delete(&self.db, id).await?)
    }

    async fn find_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<ServiceRecord>, ServiceError> {
        let rows = models::service::find_in_bounds(
            &self.db,
            bounds.min_lat,
            bounds.max_lat,
            bounds.min_lng,
            bounds.max_lng,
        )
        .await?;
        Ok(rows.into_iter().map(to_record).collect())
    }
}
