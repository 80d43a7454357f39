use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{ServiceRecord, ValidService};
use crate::errors::ServiceError;
use crate::geo::BoundingBox;

/// Repository abstraction for the service catalog. The spatial primitive is
/// candidate retrieval by bounding box; exact distance filtering and
/// ordering belong to the service layer.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert(&self, created_by: Uuid, item: ValidService) -> Result<ServiceRecord, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<ServiceRecord>, ServiceError>;
    async fn list(&self) -> Result<Vec<ServiceRecord>, ServiceError>;
    /// Full-replacement update; `None` when the record does not exist.
    async fn update(&self, id: Uuid, changes: ValidService) -> Result<Option<ServiceRecord>, ServiceError>;
    /// `false` when the record does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn find_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<ServiceRecord>, ServiceError>;
}

/// In-memory mock repository for tests and doc examples. Counts spatial
/// queries so cache-aside behavior is observable.
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCatalogRepository {
        items: Mutex<Vec<ServiceRecord>>,
        pub spatial_queries: AtomicUsize,
    }

    impl MockCatalogRepository {
        pub fn spatial_query_count(&self) -> usize {
            self.spatial_queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogRepository for MockCatalogRepository {
        async fn insert(&self, created_by: Uuid, item: ValidService) -> Result<ServiceRecord, ServiceError> {
            let now = Utc::now();
            let rec = ServiceRecord {
                id: Uuid::new_v4(),
                name: item.name,
                category: item.category,
                latitude: item.latitude,
                longitude: item.longitude,
                rating: item.rating,
                metadata: item.metadata,
                created_by,
                created_at: now,
                updated_at: now,
            };
            self.items.lock().unwrap().push(rec.clone());
            Ok(rec)
        }

        async fn get(&self, id: Uuid) -> Result<Option<ServiceRecord>, ServiceError> {
            Ok(self.items.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn list(&self) -> Result<Vec<ServiceRecord>, ServiceError> {
            Ok(self.items.lock().unwrap().clone())
        }

        async fn update(&self, id: Uuid, changes: ValidService) -> Result<Option<ServiceRecord>, ServiceError> {
            let mut items = self.items.lock().unwrap();
            let Some(rec) = items.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            rec.name = changes.name;
            rec.category = changes.category;
            rec.latitude = changes.latitude;
            rec.longitude = changes.longitude;
            rec.rating = changes.rating;
            rec.metadata = changes.metadata;
            rec.updated_at = Utc::now();
            Ok(Some(rec.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|r| r.id != id);
            Ok(items.len() < before)
        }

        async fn find_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<ServiceRecord>, ServiceError> {
            self.spatial_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    r.latitude >= bounds.min_lat
                        && r.latitude <= bounds.max_lat
                        && r.longitude >= bounds.min_lng
                        && r.longitude <= bounds.max_lng
                })
                .cloned()
                .collect())
        }
    }
}
