use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NearbyHit, NearbyQuery, ServiceInput, ServiceRecord};
use super::repository::CatalogRepository;
use crate::cache::{self, ApiCache};
use crate::errors::ServiceError;
use crate::geo;

/// Read result carrying whether it was served from cache. Cached payloads
/// are stored pre-serialized, so a hit is byte-identical to the response
/// that populated it.
#[derive(Debug, Clone)]
pub struct CachedRead {
    pub data: Value,
    pub cached: bool,
}

/// Catalog business service: nearby search (cache-aside) and the service
/// mutation pipeline with its invalidation rules.
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    cache: Arc<ApiCache>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>, cache: Arc<ApiCache>) -> Self {
        Self { repo, cache }
    }

    /// Cache-aside nearby search.
    ///
    /// Miss path: fetch candidates within the radius bounding box, compute
    /// the exact haversine distance per candidate, drop anything beyond the
    /// radius or outside the category filter, sort ascending by distance
    /// (nearest-first is a contract, not incidental), then populate the
    /// cache before returning. Zero matches is a success with an empty
    /// list. The radius is applied literally; zero or negative values fall
    /// out as point-only or empty result sets.
    #[instrument(skip(self), fields(lat = q.latitude, lng = q.longitude, radius = q.radius_km))]
    pub async fn nearby(&self, q: &NearbyQuery) -> Result<CachedRead, ServiceError> {
        let key = cache::nearby_key(q.latitude, q.longitude, q.radius_km, &q.category);

        if let Some(raw) = self.cache.get(&key).await {
            let data = serde_json::from_str(&raw).map_err(|e| ServiceError::Serialization(e.to_string()))?;
            return Ok(CachedRead { data, cached: true });
        }

        let bounds = geo::bounding_box(q.latitude, q.longitude, q.radius_km);
        let candidates = self.repo.find_in_bounds(bounds).await?;

        let mut hits: Vec<NearbyHit> = candidates
            .into_iter()
            .filter_map(|s| {
                let distance_km = geo::haversine_km(q.latitude, q.longitude, s.latitude, s.longitude);
                if distance_km > q.radius_km {
                    return None;
                }
                if !q.category.is_empty() && s.category != q.category {
                    return None;
                }
                Some(NearbyHit { service: s, distance_km })
            })
            .collect();
        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let data = serde_json::to_value(&hits).map_err(|e| ServiceError::Serialization(e.to_string()))?;
        self.cache.set(key, data.to_string()).await;
        Ok(CachedRead { data, cached: false })
    }

    pub async fn list(&self) -> Result<Vec<ServiceRecord>, ServiceError> {
        self.repo.list().await
    }

    /// Cache-aside single-record read under `service_detail:<id>`.
    pub async fn detail(&self, id: Uuid) -> Result<Option<CachedRead>, ServiceError> {
        let key = cache::detail_key(id);
        if let Some(raw) = self.cache.get(&key).await {
            let data = serde_json::from_str(&raw).map_err(|e| ServiceError::Serialization(e.to_string()))?;
            return Ok(Some(CachedRead { data, cached: true }));
        }
        let Some(record) = self.repo.get(id).await? else {
            return Ok(None);
        };
        let data = serde_json::to_value(&record).map_err(|e| ServiceError::Serialization(e.to_string()))?;
        self.cache.set(key, data.to_string()).await;
        Ok(Some(CachedRead { data, cached: false }))
    }

    /// Create a service and wipe both cache families. Nearby keys are not
    /// indexed by which services they contain, so targeted invalidation is
    /// infeasible without a secondary index; a new point can change any
    /// radius query's result set. Coarse invalidation trades post-write
    /// miss rate for correctness.
    #[instrument(skip(self, input), fields(created_by = %created_by))]
    pub async fn create(&self, created_by: Uuid, input: ServiceInput) -> Result<ServiceRecord, ServiceError> {
        let valid = input.validate()?;
        let created = self.repo.insert(created_by, valid).await?;
        self.cache.invalidate_family(cache::NEARBY_FAMILY);
        self.cache.invalidate_family(cache::DETAIL_FAMILY);
        info!(service_id = %created.id, "service_created");
        Ok(created)
    }

    /// Update a service; invalidates its own detail entry and every nearby
    /// result (an update can move the point or change its category).
    /// `None` when the target does not exist.
    #[instrument(skip(self, input), fields(service_id = %id))]
    pub async fn update(&self, id: Uuid, input: ServiceInput) -> Result<Option<ServiceRecord>, ServiceError> {
        let valid = input.validate()?;
        let Some(updated) = self.repo.update(id, valid).await? else {
            return Ok(None);
        };
        self.cache.delete(&cache::detail_key(id)).await;
        self.cache.invalidate_family(cache::NEARBY_FAMILY);
        info!(service_id = %id, "service_updated");
        Ok(Some(updated))
    }

    /// Delete a service; same invalidation rule as update. `false` when
    /// the target does not exist.
    #[instrument(skip(self), fields(service_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        if !self.repo.delete(id).await? {
            return Ok(false);
        }
        self.cache.delete(&cache::detail_key(id)).await;
        self.cache.invalidate_family(cache::NEARBY_FAMILY);
        info!(service_id = %id, "service_deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::mock::MockCatalogRepository;
    use std::time::Duration;

    fn input(name: &str, category: &str, lat: f64, lng: f64) -> ServiceInput {
        ServiceInput {
            name: Some(name.into()),
            category: Some(category.into()),
            latitude: Some(lat),
            longitude: Some(lng),
            rating: None,
            metadata: None,
        }
    }

    fn svc() -> (CatalogService, Arc<MockCatalogRepository>, Arc<ApiCache>) {
        let repo = Arc::new(MockCatalogRepository::default());
        let cache = Arc::new(ApiCache::new(Duration::from_secs(60), 1_000));
        (CatalogService::new(repo.clone(), cache.clone()), repo, cache)
    }

    fn query(lat: f64, lng: f64, radius: f64, category: &str) -> NearbyQuery {
        NearbyQuery { latitude: lat, longitude: lng, radius_km: radius, category: category.into() }
    }

    #[tokio::test]
    async fn nearby_orders_by_ascending_distance() {
        let (catalog, _, _) = svc();
        let who = Uuid::new_v4();
        // ~1.1 km, ~2.2 km and ~0.55 km north of the query point
        catalog.create(who, input("mid", "cafe", 12.910, 77.6)).await.unwrap();
        catalog.create(who, input("far", "cafe", 12.920, 77.6)).await.unwrap();
        catalog.create(who, input("near", "cafe", 12.905, 77.6)).await.unwrap();

        let out = catalog.nearby(&query(12.9, 77.6, 5.0, "")).await.unwrap();
        let names: Vec<&str> = out
            .data
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["near", "mid", "far"]);
        let dists: Vec<f64> = out
            .data
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["distance_km"].as_f64().unwrap())
            .collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn nearby_second_call_is_cached_and_identical() {
        let (catalog, repo, _) = svc();
        catalog.create(Uuid::new_v4(), input("a", "cafe", 12.901, 77.6)).await.unwrap();

        let q = query(12.9, 77.6, 2.0, "cafe");
        let first = catalog.nearby(&q).await.unwrap();
        assert!(!first.cached);
        let queries_after_first = repo.spatial_query_count();

        let second = catalog.nearby(&q).await.unwrap();
        assert!(second.cached);
        assert_eq!(repo.spatial_query_count(), queries_after_first);
        assert_eq!(first.data.to_string(), second.data.to_string());
    }

    #[tokio::test]
    async fn nearby_empty_is_success() {
        let (catalog, _, _) = svc();
        let out = catalog.nearby(&query(12.9, 77.6, 2.0, "cafe")).await.unwrap();
        assert_eq!(out.data, serde_json::json!([]));
        assert!(!out.cached);
    }

    #[tokio::test]
    async fn nearby_category_filter_is_exact() {
        let (catalog, _, _) = svc();
        let who = Uuid::new_v4();
        catalog.create(who, input("a", "cafe", 12.901, 77.6)).await.unwrap();
        catalog.create(who, input("b", "bar", 12.902, 77.6)).await.unwrap();

        let out = catalog.nearby(&query(12.9, 77.6, 5.0, "cafe")).await.unwrap();
        let arr = out.data.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["name"], "a");

        // empty category: no filter
        let out = catalog.nearby(&query(12.9, 77.6, 5.0, "")).await.unwrap();
        assert_eq!(out.data.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn nearby_radius_is_literal() {
        let (catalog, _, _) = svc();
        let who = Uuid::new_v4();
        catalog.create(who, input("exact", "cafe", 12.9, 77.6)).await.unwrap();
        catalog.create(who, input("close", "cafe", 12.901, 77.6)).await.unwrap();

        // zero radius: only the coincident point
        let out = catalog.nearby(&query(12.9, 77.6, 0.0, "")).await.unwrap();
        let arr = out.data.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["name"], "exact");

        // negative radius: nothing, still success
        let out = catalog.nearby(&query(12.9, 77.6, -1.0, "")).await.unwrap();
        assert_eq!(out.data.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_invalidates_all_nearby_entries() {
        let (catalog, repo, _) = svc();
        let who = Uuid::new_v4();
        catalog.create(who, input("a", "cafe", 12.901, 77.6)).await.unwrap();

        let q = query(12.9, 77.6, 5.0, "");
        let _ = catalog.nearby(&q).await.unwrap();
        let baseline = repo.spatial_query_count();

        // second service lands inside the cached query's radius
        catalog.create(who, input("b", "cafe", 12.902, 77.6)).await.unwrap();

        let out = catalog.nearby(&q).await.unwrap();
        assert!(!out.cached, "create must force a recompute");
        assert_eq!(repo.spatial_query_count(), baseline + 1);
        assert_eq!(out.data.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_invalidates_detail_and_nearby() {
        let (catalog, _, _) = svc();
        let who = Uuid::new_v4();
        let created = catalog.create(who, input("a", "cafe", 12.901, 77.6)).await.unwrap();

        let q = query(12.9, 77.6, 5.0, "cafe");
        let _ = catalog.nearby(&q).await.unwrap();
        let _ = catalog.detail(created.id).await.unwrap().unwrap();

        // recategorize: the cached cafe query must not keep serving it
        let mut changed = input("a", "bar", 12.901, 77.6);
        changed.rating = Some(3.0);
        catalog.update(created.id, changed).await.unwrap().unwrap();

        let out = catalog.nearby(&q).await.unwrap();
        assert!(!out.cached);
        assert_eq!(out.data.as_array().unwrap().len(), 0);

        let detail = catalog.detail(created.id).await.unwrap().unwrap();
        assert!(!detail.cached, "detail entry must have been invalidated");
        assert_eq!(detail.data["category"], "bar");
    }

    #[tokio::test]
    async fn delete_invalidates_and_reports_missing() {
        let (catalog, _, _) = svc();
        let created = catalog
            .create(Uuid::new_v4(), input("a", "cafe", 12.901, 77.6))
            .await
            .unwrap();

        let q = query(12.9, 77.6, 5.0, "");
        let _ = catalog.nearby(&q).await.unwrap();

        assert!(catalog.delete(created.id).await.unwrap());
        assert!(!catalog.delete(created.id).await.unwrap());

        let out = catalog.nearby(&q).await.unwrap();
        assert!(!out.cached);
        assert_eq!(out.data.as_array().unwrap().len(), 0);
        assert!(catalog.detail(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detail_is_cache_aside() {
        let (catalog, _, _) = svc();
        let created = catalog
            .create(Uuid::new_v4(), input("a", "cafe", 12.901, 77.6))
            .await
            .unwrap();

        let first = catalog.detail(created.id).await.unwrap().unwrap();
        assert!(!first.cached);
        let second = catalog.detail(created.id).await.unwrap().unwrap();
        assert!(second.cached);
        assert_eq!(first.data.to_string(), second.data.to_string());
    }

    #[tokio::test]
    async fn update_missing_service_is_none() {
        let (catalog, _, _) = svc();
        let out = catalog.update(Uuid::new_v4(), input("a", "cafe", 1.0, 2.0)).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let (catalog, _, _) = svc();
        let err = catalog.create(Uuid::new_v4(), ServiceInput::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
