use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ServiceError;

/// A service record as the business layer sees it. Coordinates serialize as
/// `lat`/`lng` on the way out; write payloads use the long field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub rating: f64,
    pub metadata: Option<Value>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One nearby-search hit: the record plus its distance from the query
/// point. Results are always ordered by non-decreasing distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyHit {
    #[serde(flatten)]
    pub service: ServiceRecord,
    pub distance_km: f64,
}

/// Parsed nearby-search inputs. `category` empty means no filter. The
/// radius is taken literally: zero or negative values are not clamped and
/// simply produce point-only or empty result sets.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub category: String,
}

/// Raw create/update payload; all business fields optional so validation
/// can report every missing/invalid field at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub metadata: Option<Value>,
}

/// A payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidService {
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub metadata: Option<Value>,
}

impl ServiceInput {
    pub fn validate(self) -> Result<ValidService, ServiceError> {
        let mut problems: Vec<(&'static str, &'static str)> = Vec::new();

        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            problems.push(("name", "this field is required"));
        }
        let category = self.category.unwrap_or_default();
        if category.trim().is_empty() {
            problems.push(("category", "this field is required"));
        }
        match self.latitude {
            None => problems.push(("latitude", "this field is required")),
            Some(lat) if !(-90.0..=90.0).contains(&lat) => {
                problems.push(("latitude", "must be between -90 and 90"))
            }
            _ => {}
        }
        match self.longitude {
            None => problems.push(("longitude", "this field is required")),
            Some(lng) if !(-180.0..=180.0).contains(&lng) => {
                problems.push(("longitude", "must be between -180 and 180"))
            }
            _ => {}
        }

        if !problems.is_empty() {
            return Err(ServiceError::fields(problems));
        }

        Ok(ValidService {
            name,
            category,
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            rating: self.rating.unwrap_or(0.0),
            metadata: self.metadata,
        })
    }
}
