use actix_web::{delete, http::header, post, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::storage::{self, ObjectStorage, path_belongs_to};
use crate::utils::files::{
    FileMeta, MAX_IMAGE_BYTES, MAX_PRODUCT_FILE_BYTES, validate_image_file, validate_product_file,
};

/// Image -> bucket images, fichier livré -> bucket products
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    File,
}

impl UploadKind {
    fn bucket(self, config: &Config) -> &str {
        match self {
            UploadKind::Image => &config.images_bucket,
            UploadKind::File => &config.products_bucket,
        }
    }

    fn max_bytes(self) -> usize {
        match self {
            UploadKind::Image => MAX_IMAGE_BYTES,
            UploadKind::File => MAX_PRODUCT_FILE_BYTES,
        }
    }

    fn check(self, file: FileMeta<'_>) -> Option<&'static str> {
        match self {
            UploadKind::Image => validate_image_file(file),
            UploadKind::File => validate_product_file(file),
        }
    }
}

/// Lit le corps en s'arrêtant juste après la limite du type de fichier:
/// un fichier trop gros est rejeté par les règles de validation habituelles
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<(Vec<u8>, bool), AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!("Upload interrupted: {}", e);
            AppError::validation("Failed to read uploaded file")
        })?;
        if bytes.len() + chunk.len() > limit {
            return Ok((bytes, true));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok((bytes, false))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub file_name: String,
    pub folder: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub path: String,
}

/// POST /api/uploads/{image|file}?fileName=&folder= - Corps brut, type MIME
/// dans Content-Type
#[post("/{kind}")]
pub async fn upload(
    auth_user: AuthUser,
    req: HttpRequest,
    config: web::Data<Config>,
    storage: web::Data<dyn ObjectStorage>,
    kind: web::Path<UploadKind>,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let kind = kind.into_inner();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let (body, overflow) = read_body(payload, kind.max_bytes()).await?;
    if body.is_empty() && !overflow {
        return Err(AppError::validation("No file provided"));
    }
    let size = if overflow { kind.max_bytes() + 1 } else { body.len() };
    if let Some(message) = kind.check(FileMeta { content_type: &content_type, size }) {
        return Err(AppError::validation(message));
    }

    let result = storage::upload_file(
        storage.get_ref(),
        kind.bucket(&config),
        query.folder.as_deref(),
        auth_user.user_id,
        &query.file_name,
        &content_type,
        body,
    )
        .await?;

    tracing::info!(user_id = %auth_user.user_id, path = %result.path, "File uploaded");
    Ok(HttpResponse::Ok().json(result))
}

/// DELETE /api/uploads/{image|file}?path=
#[delete("/{kind}")]
pub async fn remove(
    auth_user: AuthUser,
    config: web::Data<Config>,
    storage: web::Data<dyn ObjectStorage>,
    kind: web::Path<UploadKind>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, AppError> {
    // Un créateur ne supprime que ses propres objets
    if !path_belongs_to(&query.path, auth_user.user_id) {
        return Err(AppError::not_found("File not found"));
    }

    storage::delete_file(storage.get_ref(), kind.into_inner().bucket(&config), &query.path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn uploads_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/uploads")
            .service(upload)
            .service(remove),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};

    use crate::utils::files::{MAX_IMAGE_BYTES, MAX_PRODUCT_FILE_BYTES};
    use crate::test_support::{Fakes, bearer_for, insert_user, test_app, test_db};

    #[actix_web::test]
    async fn image_is_stored_under_user_folder() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::post()
            .uri("/api/uploads/image?fileName=cover.PNG&folder=covers")
            .insert_header(("Authorization", bearer_for(&jane)))
            .insert_header(("Content-Type", "image/png"))
            .set_payload(vec![1u8; 64])
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let path = body["path"].as_str().unwrap();
        assert!(path.starts_with(&format!("{}/covers/", jane.id)));
        assert!(path.ends_with(".png"));
        assert!(body["url"].as_str().unwrap().contains("/public/images/"));
        assert_eq!(fakes.storage.uploaded_paths().len(), 1);
    }

    #[actix_web::test]
    async fn wrong_type_is_rejected_before_upload() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::post()
            .uri("/api/uploads/file?fileName=run.exe")
            .insert_header(("Authorization", bearer_for(&jane)))
            .insert_header(("Content-Type", "application/x-msdownload"))
            .set_payload(vec![1u8; 64])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(fakes.storage.uploaded_paths().is_empty());
    }

    #[actix_web::test]
    async fn oversize_files_get_the_size_message() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let cases = [
            ("image", "image/png", MAX_IMAGE_BYTES + 1, "Image file size must be less than 5MB"),
            ("file", "application/pdf", MAX_PRODUCT_FILE_BYTES + 1, "File size must be less than 50MB"),
        ];
        for (kind, content_type, size, message) in cases {
            let req = test::TestRequest::post()
                .uri(&format!("/api/uploads/{}?fileName=big.bin", kind))
                .insert_header(("Authorization", bearer_for(&jane)))
                .insert_header(("Content-Type", content_type))
                .set_payload(vec![0u8; size])
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], message);
        }
        assert!(fakes.storage.uploaded_paths().is_empty());
    }

    #[actix_web::test]
    async fn missing_file_name_is_a_json_error() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::post()
            .uri("/api/uploads/image")
            .insert_header(("Authorization", bearer_for(&jane)))
            .insert_header(("Content-Type", "image/png"))
            .set_payload(vec![1u8; 16])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("fileName"));
    }

    #[actix_web::test]
    async fn foreign_path_cannot_be_deleted() {
        let db = test_db().await;
        let fakes = Fakes::default();
        let jane = insert_user(&db, "jane").await;
        let mark = insert_user(&db, "mark").await;
        let app = test_app!(db, fakes);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/uploads/file?path={}/ebook.pdf", jane.id))
            .insert_header(("Authorization", bearer_for(&mark)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/uploads/file?path={}/ebook.pdf", jane.id))
            .insert_header(("Authorization", bearer_for(&jane)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fakes.storage.deleted_paths(), vec![format!("{}/ebook.pdf", jane.id)]);
    }
}
