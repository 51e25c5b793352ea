use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::models::health::HealthResponse;

#[get("/health")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> HttpResponse {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ok".to_string(),
            database: "ok".to_string(),
            time: Utc::now(),
        }),
        Err(e) => {
            tracing::error!("Database ping failed: {}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded".to_string(),
                database: "unreachable".to_string(),
                time: Utc::now(),
            })
        }
    }
}
