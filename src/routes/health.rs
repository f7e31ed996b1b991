use actix_web::{get, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub server_time: DateTime<Utc>,
}

impl HealthReport {
    fn up() -> Self {
        Self {
            status: "UP".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_time: Utc::now(),
        }
    }
}

/// Public; answers without touching storage or the token check.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthReport::up())
}
