use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::services::lead_service::{ClientInfo, LeadService, LeadSubmission};
use crate::services::mail::MailClient;
use crate::services::storage::ObjectStorage;

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// IP (premier saut de x-forwarded-for) et user-agent du visiteur
fn client_info(req: &HttpRequest) -> ClientInfo {
    let defaults = ClientInfo::default();
    ClientInfo {
        ip_address: header_value(req, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header_value(req, "x-real-ip"))
            .unwrap_or(defaults.ip_address),
        user_agent: header_value(req, "user-agent").unwrap_or(defaults.user_agent),
    }
}

/// POST /api/leads/submit - Formulaire d'un lead magnet (public)
#[post("/leads/submit")]
pub async fn submit_lead(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn MailClient>,
    config: web::Data<Config>,
    body: web::Json<LeadSubmission>,
) -> Result<HttpResponse, AppError> {
    let response = LeadService::submit_lead(
        &db,
        mailer.get_ref(),
        &config,
        body.into_inner(),
        client_info(&req),
    )
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/download/{product_id}?email=&token= - Lien envoyé par email
#[get("/download/{product_id}")]
pub async fn download(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn ObjectStorage>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse, AppError> {
    let signed_url = LeadService::redeem_download(
        &db,
        storage.get_ref(),
        &config,
        &path.into_inner(),
        query.email.as_deref(),
        query.token.as_deref(),
        Utc::now(),
    )
        .await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, signed_url))
        .finish())
}

pub fn leads_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_lead).service(download);
}
