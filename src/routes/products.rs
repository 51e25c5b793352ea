use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::product_service::{NewProduct, ProductService};
use crate::services::user_service::UserService;

/// GET /api/products - Produits du créateur, brouillons compris
#[get("")]
pub async fn list_products(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let products = ProductService::list_products(&db, auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": products
    })))
}

/// POST /api/products - Création directe d'un produit publié
#[post("")]
pub async fn create_product(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    let product = ProductService::create_product(&db, user.id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "product": product
    })))
}

/// DELETE /api/products/{id}
#[delete("/{id}")]
pub async fn delete_product(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    ProductService::delete_product(&db, auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn products_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(list_products)
            .service(create_product)
            .service(delete_product),
    );
}
