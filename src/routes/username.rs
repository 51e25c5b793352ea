use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::username_service::UsernameService;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameCheckRequest {
    pub username: String,
    pub exclude_user_id: Option<Uuid>,
}

/// POST /api/username/check - Format puis disponibilité
#[post("/username/check")]
pub async fn check_username(
    db: web::Data<DatabaseConnection>,
    body: web::Json<UsernameCheckRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let check = UsernameService::validate(&db, &body.username, body.exclude_user_id).await;
    HttpResponse::Ok().json(check)
}
