use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::calendar::CalendarClient;
use crate::services::mail::MailClient;
use crate::services::user_service::UserService;
use crate::services::webinar_service::{CreateEventRequest, PurchaseConfirmation, WebinarService};

/// Comparaison en temps constant pour une longueur donnée
fn secrets_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Sans CRON_SECRET configuré, l'appel est libre
fn cron_authorized(config: &Config, authorization: Option<&str>) -> bool {
    match config.cron_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|given| secrets_match(given, secret)),
        None => true,
    }
}

/// POST /api/webinar/create-event - Événement Google Calendar + lien Meet
#[post("/create-event")]
pub async fn create_event(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    calendar: web::Data<dyn CalendarClient>,
    body: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, AppError> {
    let host = UserService::ensure_user(&db, &auth_user).await?;
    let event = WebinarService::create_event(&db, calendar.get_ref(), host, body.into_inner(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "event": event
    })))
}

/// POST /api/webinar/purchase-confirmation - Email, ajout au calendrier, commande
#[post("/purchase-confirmation")]
pub async fn purchase_confirmation(
    db: web::Data<DatabaseConnection>,
    calendar: web::Data<dyn CalendarClient>,
    mailer: web::Data<dyn MailClient>,
    body: web::Json<PurchaseConfirmation>,
) -> Result<HttpResponse, AppError> {
    let outcome = WebinarService::purchase_confirmation(
        &db,
        calendar.get_ref(),
        mailer.get_ref(),
        body.into_inner(),
        Utc::now(),
    )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Purchase confirmation processed",
        "details": outcome
    })))
}

/// POST /api/webinar/send-reminders - Appelé par le cron
#[post("/send-reminders")]
pub async fn send_reminders(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<dyn MailClient>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let authorization = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());
    if !cron_authorized(&config, authorization) {
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }

    let summary = WebinarService::send_reminders(&db, mailer.get_ref(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Processed {} webinars", summary.webinars_checked),
        "details": summary
    })))
}

pub fn webinar_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webinar")
            .service(create_event)
            .service(purchase_confirmation)
            .service(send_reminders),
    );
}
