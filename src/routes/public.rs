use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::services::user_service::UserService;

/// GET /api/public/{username} - Page publique d'un créateur
#[get("/public/{username}")]
pub async fn public_page(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let page = UserService::public_page(&db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use sea_orm::Set;

    use crate::models::products::ProductType;
    use crate::test_support::{Fakes, insert_product, insert_user, test_app, test_db};

    #[actix_web::test]
    async fn only_published_products_are_listed() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        insert_product(&db, jane.id, ProductType::Ebook, |p| {
            p.title = Set("Live".to_string());
        })
            .await;
        insert_product(&db, jane.id, ProductType::Ebook, |p| {
            p.title = Set("Draft".to_string());
            p.is_draft = Set(true);
            p.is_active = Set(false);
        })
            .await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::get().uri("/api/public/Jane").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["user"]["username"], "jane");
        let products = body["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["title"], "Live");
    }

    #[actix_web::test]
    async fn unknown_creator_is_not_found() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let app = test_app!(db, fakes);

        let req = test::TestRequest::get().uri("/api/public/nobody").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
