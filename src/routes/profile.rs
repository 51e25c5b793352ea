use std::collections::HashMap;

use actix_web::{get, put, web, HttpResponse};
use sea_orm::{ActiveEnum, DatabaseConnection, Iterable};
use validator::ValidateUrl;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::social_links::SocialPlatform;
use crate::services::user_service::{ProfileUpdate, UserService};

/// GET /api/profile - Profil de l'utilisateur connecté (créé au besoin)
#[get("")]
pub async fn get_profile(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    let links = UserService::social_links(&db, user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user,
        "socialLinks": links
    })))
}

/// PUT /api/profile - Nom, username, bio, avatar
#[put("")]
pub async fn update_profile(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    let updated = UserService::update_profile(&db, user, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": updated
    })))
}

/// PUT /api/profile/social-links - Remplace tous les liens
/// Corps: {"instagram": "https://...", "github": "", ...}
#[put("/social-links")]
pub async fn update_social_links(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    // Les clés inconnues sont ignorées
    let mut urls = HashMap::new();
    for platform in SocialPlatform::iter() {
        let Some(url) = body.get(&platform.to_value()).map(|u| u.trim()) else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        if !url.validate_url() {
            return Err(AppError::Validation(format!(
                "Invalid URL for {}",
                platform.to_value()
            )));
        }
        urls.insert(platform, url.to_string());
    }

    let user = UserService::ensure_user(&db, &auth_user).await?;
    let links = UserService::replace_social_links(&db, user.id, &urls).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "socialLinks": links
    })))
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(get_profile)
            .service(update_profile)
            .service(update_social_links),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::json;

    use crate::test_support::{Fakes, bearer_for, insert_user, test_app, test_db};

    #[actix_web::test]
    async fn profile_requires_a_session() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let app = test_app!(db, fakes);

        let req = test::TestRequest::get().uri("/api/profile").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn update_keeps_avatar_when_absent() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::put()
            .uri("/api/profile")
            .insert_header(("Authorization", bearer_for(&jane)))
            .set_json(json!({ "fullName": "Jane Doe", "avatar": "https://cdn.test/a.png" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["avatar"], "https://cdn.test/a.png");

        let req = test::TestRequest::put()
            .uri("/api/profile")
            .insert_header(("Authorization", bearer_for(&jane)))
            .set_json(json!({ "fullName": "Jane Doe", "username": "Jane_Doe" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["user"]["avatar"], "https://cdn.test/a.png");
        assert_eq!(body["user"]["username"], "jane_doe");
        assert!(body["user"].get("googleAccessToken").is_none());
    }

    #[actix_web::test]
    async fn social_links_follow_platform_order() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::put()
            .uri("/api/profile/social-links")
            .insert_header(("Authorization", bearer_for(&jane)))
            .set_json(json!({
                "github": " https://github.com/jane ",
                "instagram": "https://instagram.com/jane",
                "twitter": "",
                "myspace": "https://myspace.com/jane"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let links = body["socialLinks"].as_array().unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0]["platform"], "instagram");
        assert_eq!(links[0]["position"], 1);
        assert_eq!(links[1]["platform"], "github");
        assert_eq!(links[1]["url"], "https://github.com/jane");
    }

    #[actix_web::test]
    async fn invalid_social_url_is_rejected() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::put()
            .uri("/api/profile/social-links")
            .insert_header(("Authorization", bearer_for(&jane)))
            .set_json(json!({ "youtube": "not a url" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid URL for youtube");
    }
}
