#![allow(dead_code)]
//! Shared harness: a full router wired to in-memory repositories, plus
//! request helpers. Tokens are obtained through the real register/login
//! endpoints so requests exercise the same path production traffic does.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::auth::ServerState;
use server::routes;
use service::{
    accounts::{
        repository::mock::MockAccountRepository,
        service::{AccountConfig, AccountService},
    },
    catalog::repository::mock::MockCatalogRepository,
    catalog::CatalogService,
    throttle::RateLimits,
    ApiCache, Throttle,
};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

pub struct TestApp {
    pub router: Router,
    pub catalog_repo: Arc<MockCatalogRepository>,
    pub accounts_repo: Arc<MockAccountRepository>,
    pub cache: Arc<ApiCache>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_inner(None)
}

/// Same harness with a tight per-role request quota.
pub fn spawn_app_with_limits(limits: RateLimits) -> TestApp {
    spawn_app_inner(Some(Arc::new(Throttle::new(limits))))
}

fn spawn_app_inner(throttle: Option<Arc<Throttle>>) -> TestApp {
    let cache = Arc::new(ApiCache::new(Duration::from_secs(300), 10_000));
    let accounts_repo = Arc::new(MockAccountRepository::default());
    let catalog_repo = Arc::new(MockCatalogRepository::default());

    let accounts = Arc::new(AccountService::new(
        accounts_repo.clone(),
        AccountConfig { jwt_secret: Some("test-secret".into()), token_expiry_hours: 12 },
    ));
    let catalog = Arc::new(CatalogService::new(catalog_repo.clone(), Arc::clone(&cache)));

    let state = ServerState {
        accounts,
        catalog,
        cache: Arc::clone(&cache),
        throttle,
        jwt_secret: "test-secret".into(),
    };
    TestApp {
        router: routes::build_router(CorsLayer::new(), state),
        catalog_repo,
        accounts_repo,
        cache,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// Drop a cached principal, standing in for TTL expiry in tests that
    /// exercise deactivation.
    pub async fn clear_auth_cache(&self, token: &str) {
        self.cache.delete(&service::cache::auth_key(token)).await;
    }

    /// Register an account with the given role and log it in; returns the
    /// bearer token.
    pub async fn token_for(&self, email: &str, role: &str) -> String {
        let (status, _) = self
            .request(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "email": email,
                    "username": email.split('@').next().unwrap(),
                    "password": "p",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": email, "password": "p"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Create a service record through the API; returns its id.
    pub async fn create_service(&self, token: &str, name: &str, category: &str, lat: f64, lng: f64) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/services/create",
                Some(token),
                Some(json!({
                    "name": name,
                    "category": category,
                    "latitude": lat,
                    "longitude": lng,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
