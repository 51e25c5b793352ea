use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DraftInput, DraftView};
use crate::services::draft_service::DraftService;
use crate::services::user_service::UserService;

/// POST /api/drafts - Premier enregistrement d'un assistant
#[post("")]
pub async fn save_draft(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<DraftInput>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    let draft = DraftService::save_draft(&db, user.id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "productId": draft.id,
        "draft": DraftView::from(draft)
    })))
}

/// GET /api/drafts/{id} - Reprise d'un brouillon
#[get("/{id}")]
pub async fn load_draft(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let draft = DraftService::load_draft(&db, auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "draft": draft
    })))
}

/// PUT /api/drafts/{id}
#[put("/{id}")]
pub async fn update_draft(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<DraftInput>,
) -> Result<HttpResponse, AppError> {
    let draft = DraftService::update_draft(&db, auth_user.user_id, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "draft": DraftView::from(draft)
    })))
}

/// POST /api/drafts/{id}/finalize - Publication
#[post("/{id}/finalize")]
pub async fn finalize_draft(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<DraftInput>,
) -> Result<HttpResponse, AppError> {
    let product = DraftService::finalize_draft(&db, auth_user.user_id, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "product": product
    })))
}

pub fn drafts_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/drafts")
            .service(save_draft)
            .service(load_draft)
            .service(update_draft)
            .service(finalize_draft),
    );
}
